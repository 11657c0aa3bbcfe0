//! Configuration file parsing (JSON format).

use std::path::{Path, PathBuf};

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// A parsed configuration together with the exact text it came from.
pub struct LoadedConfig {
    pub config: Config,
    pub raw: String,
}

/// Load configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<LoadedConfig, ConfigError> {
    let path = path.as_ref();

    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let config = load_config_str(&raw)?;
    Ok(LoadedConfig { config, raw })
}

/// Load configuration from a JSON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

/// Path of the backup written next to `path`.
pub fn backup_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Write `raw` verbatim to `<path>.bak`.
pub fn write_backup(path: impl AsRef<Path>, raw: &str) -> Result<PathBuf, ConfigError> {
    let backup = backup_path(path);
    std::fs::write(&backup, raw).map_err(|e| ConfigError::BackupFailed {
        path: backup.display().to_string(),
        source: e,
    })?;
    Ok(backup)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r##"{
        "contacts": {
            "34600000001": "Bob",
            "#dev": "#groupA",
            "34600000002": "bob"
        },
        "irc": {
            "server": "irc.example.net",
            "port": 6667,
            "nick": "palaver",
            "owner_nick": "operator"
        },
        "messenger": {
            "gateway": "127.0.0.1:7800",
            "accounts": [
                { "identifier": "34611111111", "credential": "secret-1" },
                { "identifier": "34622222222", "credential": "secret-2" }
            ]
        },
        "log_file": "messages.log"
    }"##;

    #[test]
    fn test_parse_sample() {
        let config = load_config_str(SAMPLE).unwrap();
        assert_eq!(config.irc.server, "irc.example.net");
        assert_eq!(config.irc.port, 6667);
        assert_eq!(config.messenger.accounts.len(), 2);
        assert_eq!(config.messenger.domain_suffix, "@s.whatsapp.net");
        assert_eq!(config.connect_timeout_secs, 30);
    }

    #[test]
    fn test_contacts_keep_file_order() {
        let config = load_config_str(SAMPLE).unwrap();
        let ids: Vec<&str> = config.contacts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["34600000001", "#dev", "34600000002"]);
    }

    #[test]
    fn test_missing_section_fails() {
        let result = load_config_str(r#"{ "contacts": {} }"#);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_contacts_must_be_strings() {
        let broken = SAMPLE.replace(r#""Bob""#, "42");
        assert!(load_config_str(&broken).is_err());
    }

    #[test]
    fn test_backup_is_verbatim() {
        let dir = std::env::temp_dir().join(format!("palaver-backup-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("palaver.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let loaded = load_config(&path).unwrap();
        let backup = write_backup(&path, &loaded.raw).unwrap();

        assert_eq!(backup, dir.join("palaver.json.bak"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), SAMPLE);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config("/nonexistent/palaver.json").err().unwrap();
        assert!(err.to_string().contains("/nonexistent/palaver.json"));
    }
}
