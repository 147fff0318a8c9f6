use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    pub use_colors: bool,
    /// Indentation for one level of loop nesting.
    pub indent: IndentStyle,
    pub include_unknowns: bool,
    pub include_statistics: bool,
    pub format: OutputFormat,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            indent: IndentStyle::Spaces(1),
            include_unknowns: true,
            include_statistics: false,
            format: OutputFormat::Text,
        }
    }
}

impl DumpConfig {
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }

    pub fn json() -> Self {
        Self {
            use_colors: false,
            format: OutputFormat::Json,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl IndentStyle {
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_plain_dump_layout() {
        let config = DumpConfig::default();
        assert_eq!(config.indent.unit(), " ");
        assert_eq!(config.format, OutputFormat::Text);
        assert!(!DumpConfig::plain().use_colors);
        assert_eq!(IndentStyle::Tabs.unit(), "\t");
    }
}
