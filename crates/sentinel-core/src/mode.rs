use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Assistant mode selected by the caller for a turn.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Sql,
    Email,
    Wiki,
    #[default]
    Chat,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Sql, Mode::Email, Mode::Wiki, Mode::Chat];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Sql => "sql",
            Mode::Email => "email",
            Mode::Wiki => "wiki",
            Mode::Chat => "chat",
        }
    }

    /// Whether this mode interpolates reference material into its instructions.
    pub fn uses_reference_material(self) -> bool {
        matches!(self, Mode::Sql)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" => Ok(Mode::Sql),
            "email" => Ok(Mode::Email),
            "wiki" => Ok(Mode::Wiki),
            "chat" => Ok(Mode::Chat),
            other => Err(format!(
                "Unknown mode: {}. Available modes: sql, email, wiki, chat",
                other
            )),
        }
    }
}
