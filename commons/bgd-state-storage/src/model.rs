use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The deployment slot currently receiving traffic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActiveVersion {
    #[default]
    Blue,
    Green,
}

impl ActiveVersion {
    pub const ALL: [ActiveVersion; 2] =
        [ActiveVersion::Blue, ActiveVersion::Green];

    /// The opposite slot.
    pub fn other(self) -> Self {
        match self {
            ActiveVersion::Blue => ActiveVersion::Green,
            ActiveVersion::Green => ActiveVersion::Blue,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveVersion::Blue => "blue",
            ActiveVersion::Green => "green",
        }
    }
}

impl fmt::Display for ActiveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown version '{0}', expected 'blue' or 'green'")]
pub struct ParseVersionError(pub String);

impl FromStr for ActiveVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(ActiveVersion::Blue),
            "green" => Ok(ActiveVersion::Green),
            _ => Err(ParseVersionError(s.trim().to_string())),
        }
    }
}
