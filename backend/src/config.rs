use std::path::PathBuf;

use crate::auth::credentials::Credentials;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL_PATH: &str = "model/model.tflite";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub data_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Reads the process environment, after merging a `.env` file if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let credentials = Credentials::new(required("AUTH_USERNAME")?, required("AUTH_PASSWORD")?);

        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(value) => value.trim().parse::<usize>().map_err(|_| ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                value,
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            credentials,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            data_dir: lookup("DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            max_upload_bytes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config =
            Config::from_lookup(lookup_from(&[("AUTH_USERNAME", "chef"), ("AUTH_PASSWORD", "s3cret")]))
                .unwrap();

        assert_eq!(config.credentials, Credentials::new("chef", "s3cret"));
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.model_path, PathBuf::from("model/model.tflite"));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn missing_password_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("AUTH_USERNAME", "chef")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_PASSWORD")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("AUTH_USERNAME", "chef"),
            ("AUTH_PASSWORD", "s3cret"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8081"),
            ("DATA_DIR", "/var/lib/eatzi"),
            ("MAX_UPLOAD_BYTES", "2048"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8081");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/eatzi"));
        assert_eq!(config.max_upload_bytes, 2048);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("AUTH_USERNAME", "chef"),
            ("AUTH_PASSWORD", "s3cret"),
            ("PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }
}
