//! Report rendering modes of the CLI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON report on stdout
    #[default]
    Json,
    /// One line per command
    Summary,
    /// Nothing on stdout; read the exit code
    Exitcode,
}

impl OutputFormat {
    /// True when stdout carries a parseable document.
    pub fn is_machine_readable(self) -> bool {
        self == OutputFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_names() {
        assert_eq!(OutputFormat::from_str("summary", true), Ok(OutputFormat::Summary));
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
        assert!(!OutputFormat::Exitcode.is_machine_readable());
    }
}
