use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration. Any value set on the command line takes
/// precedence over the file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: Option<u64>,
    /// Request logging level: "none", "path", "headers" or "body".
    pub logging_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4000\njwt_secret = \"sekrit\"").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.jwt_secret.as_deref(), Some("sekrit"));
        assert_eq!(config.token_ttl_secs, None);
        assert_eq!(config.logging_level, None);
    }

    #[test]
    fn rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = not a number").unwrap();
        assert!(FileConfig::load(file.path()).is_err());
    }
}
