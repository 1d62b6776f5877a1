// Charger preset domain model
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Memory slot index of a preset that has not been saved yet
pub const UNSAVED_INDEX: i64 = -1;

/// Battery chemistry as the charger numbers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ChemistryType {
    LiPo,
    LiIon,
    LiFe,
    LiHv,
    NiMh,
    NiCd,
    NiZn,
    Pb,
    Other(i64),
}

impl From<i64> for ChemistryType {
    fn from(value: i64) -> Self {
        match value {
            0 => Self::LiPo,
            1 => Self::LiIon,
            2 => Self::LiFe,
            3 => Self::LiHv,
            4 => Self::NiMh,
            5 => Self::NiCd,
            6 => Self::NiZn,
            7 => Self::Pb,
            other => Self::Other(other),
        }
    }
}

impl From<ChemistryType> for i64 {
    fn from(value: ChemistryType) -> Self {
        match value {
            ChemistryType::LiPo => 0,
            ChemistryType::LiIon => 1,
            ChemistryType::LiFe => 2,
            ChemistryType::LiHv => 3,
            ChemistryType::NiMh => 4,
            ChemistryType::NiCd => 5,
            ChemistryType::NiZn => 6,
            ChemistryType::Pb => 7,
            ChemistryType::Other(other) => other,
        }
    }
}

impl ChemistryType {
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::LiPo => Some("LiPo"),
            Self::LiIon => Some("LiIon"),
            Self::LiFe => Some("LiFe"),
            Self::LiHv => Some("LiHV"),
            Self::NiMh => Some("NiMH"),
            Self::NiCd => Some("NiCd"),
            Self::NiZn => Some("NiZn"),
            Self::Pb => Some("Pb"),
            Self::Other(_) => None,
        }
    }
}

/// A named charge profile stored in one of the charger's memory slots.
///
/// Only the fields this service reasons about are typed; the rest of the
/// chemistry-specific settings ride along in `settings` so that a save
/// sends back exactly what was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub index: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub chemistry: ChemistryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_str: Option<String>,
    #[serde(default)]
    pub charge_current: f64,
    #[serde(default)]
    pub discharge_current: f64,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Preset {
    pub fn new(name: impl Into<String>, chemistry: ChemistryType) -> Self {
        Self {
            index: UNSAVED_INDEX,
            name: name.into(),
            chemistry,
            type_str: None,
            charge_current: 0.0,
            discharge_current: 0.0,
            settings: Map::new(),
        }
    }

    pub fn is_unsaved(&self) -> bool {
        self.index < 0
    }

    /// Editing is only offered for LiPo profiles for now
    pub fn is_editable(&self) -> bool {
        self.chemistry == ChemistryType::LiPo
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        let label = self
            .type_str
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.chemistry.label())
            .unwrap_or("Unknown");
        tags.push(label.to_string());
        if self.charge_current != 0.0 {
            tags.push(format!("+ {}A", self.charge_current));
        }
        if self.discharge_current != 0.0 {
            tags.push(format!("- {}A", self.discharge_current));
        }
        tags
    }
}
