//! Credential bundle for the bot account.
//!
//! A single JSON file holds everything the bot needs to authenticate:
//! `{pin, client_id, session_id, pin_token, private_key}`. It is loaded
//! once at startup and never mutated; secret members stay wrapped in
//! [`SecretString`] so they cannot leak through `Debug` output or logs.

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ConfigError;

/// Opaque credential bundle, deserialized from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pin: SecretString,
    pub client_id: String,
    pub session_id: String,
    pub pin_token: SecretString,
    pub private_key: SecretString,
}

impl Config {
    /// Load and validate the credential bundle from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // client_id and session_id flow into transfer URIs and request
        // tokens, so malformed values fail here instead of at send time.
        Uuid::parse_str(&self.client_id).map_err(|e| ConfigError::InvalidValue {
            key: "client_id",
            message: e.to_string(),
        })?;
        Uuid::parse_str(&self.session_id).map_err(|e| ConfigError::InvalidValue {
            key: "session_id",
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"{
        "pin": "123456",
        "client_id": "fbd26bc6-3d04-4964-a7fe-a540432b16e2",
        "session_id": "6e97b131-e024-4498-a151-e78fe4b3f8aa",
        "pin_token": "dG9rZW4tdG9rZW4tdG9rZW4tdG9rZW4=",
        "private_key": "kA3PiGliEdTeYh3cosOeyqNq4mqb1fJvLcmPMeUkGFk"
    }"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_valid_bundle() {
        let file = write_temp(SAMPLE);
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.client_id, "fbd26bc6-3d04-4964-a7fe-a540432b16e2");
        assert_eq!(config.pin.expose_secret(), "123456");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let file = write_temp("{not json");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn non_uuid_client_id_is_rejected() {
        let file = write_temp(&SAMPLE.replace("fbd26bc6-3d04-4964-a7fe-a540432b16e2", "bot-7000"));
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "client_id",
                ..
            }
        ));
    }

    #[test]
    fn secrets_do_not_leak_through_debug() {
        let file = write_temp(SAMPLE);
        let config = Config::load(file.path()).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("123456"));
        assert!(!debug.contains("kA3PiGliEdTeYh3cosOeyqNq4mqb1fJvLcmPMeUkGFk"));
    }
}
