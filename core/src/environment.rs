use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A deployment target bound to its own trigger script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    #[serde(rename = "DEV")]
    Dev,
    #[serde(rename = "QA")]
    Qa,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Dev, Environment::Qa];

    pub fn display_name(&self) -> &'static str {
        match self {
            Environment::Dev => "DEV",
            Environment::Qa => "QA",
        }
    }

    /// Lower-case form used in URL paths and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Qa => "qa",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "qa" => Ok(Environment::Qa),
            other => Err(format!(
                "unknown environment '{other}' (expected one of: dev, qa)"
            )),
        }
    }
}
