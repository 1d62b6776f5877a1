// Charger model metadata
use serde::Serialize;

pub const DEFAULT_CHARGER_NAME: &str = "iCharger";
pub const DEFAULT_CHARGER_TAG: &str = "";
pub const DEFAULT_MAX_AMPS: f64 = 15.0;
pub const DEFAULT_MAX_CELLS: u32 = 0;

/// Device type identifiers as reported in the status `device_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargerType {
    ICharger4010Duo = 64,
    ICharger308Duo = 66,
}

impl ChargerType {
    pub fn from_device_id(device_id: i64) -> Option<Self> {
        match device_id {
            64 => Some(Self::ICharger4010Duo),
            66 => Some(Self::ICharger308Duo),
            _ => None,
        }
    }
}

/// Static description of a charger model. Unset attributes fall back to
/// whatever default the caller asks for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargerMetadata {
    pub name: Option<&'static str>,
    pub max_amps: Option<f64>,
    pub tag: Option<&'static str>,
    pub cells: Option<u32>,
}

const ICHARGER_4010_DUO: ChargerMetadata = ChargerMetadata {
    name: Some("iCharger 4010"),
    max_amps: Some(40.0),
    tag: Some("DUO"),
    cells: None,
};

const ICHARGER_308_DUO: ChargerMetadata = ChargerMetadata {
    name: Some("iCharger 308"),
    max_amps: Some(30.0),
    tag: Some("DUO"),
    cells: None,
};

impl ChargerType {
    pub fn metadata(self) -> &'static ChargerMetadata {
        match self {
            Self::ICharger4010Duo => &ICHARGER_4010_DUO,
            Self::ICharger308Duo => &ICHARGER_308_DUO,
        }
    }
}

/// Look up one attribute of a charger model.
///
/// Unknown or missing device ids, and attributes the model leaves unset,
/// yield `default`.
pub fn lookup_metadata<T>(
    device_id: Option<i64>,
    attribute: impl FnOnce(&ChargerMetadata) -> Option<T>,
    default: T,
) -> T {
    device_id
        .and_then(ChargerType::from_device_id)
        .and_then(|charger| attribute(charger.metadata()))
        .unwrap_or(default)
}
