// Charger events published to local consumers
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChargerEvent {
    /// A charger appeared and its channel pollers were rebuilt
    Connected { channel_count: usize },
    /// The charger went away, either through a failed poll or a status
    /// that no longer reports it
    Disconnected { reason: String },
    /// A status poll failed
    StatusError { reason: String },
    /// A preset command was rejected or could not be sent
    CommandFailure { reason: String },
    /// A fresh snapshot is available for this channel
    ChannelActivity { index: usize },
}

impl fmt::Display for ChargerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { channel_count } => {
                write!(f, "charger connected ({channel_count} channels)")
            }
            Self::Disconnected { reason } => write!(f, "charger disconnected: {reason}"),
            Self::StatusError { reason } => write!(f, "status unavailable: {reason}"),
            Self::CommandFailure { reason } => write!(f, "command failed: {reason}"),
            Self::ChannelActivity { index } => write!(f, "channel {index} updated"),
        }
    }
}
