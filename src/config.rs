use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub model_checksum: Option<String>, // Optional pin; sidecar file is used otherwise
    pub relabel_feature_importance: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from("model/model.json"),
            model_checksum: None,
            relabel_feature_importance: true,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .map(|port| {
                    port.trim()
                        .parse::<u16>()
                        .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))
                })
                .transpose()?
                .unwrap_or(defaults.port),
            model_path: var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            model_checksum: var("MODEL_CHECKSUM")
                .map(|digest| {
                    let digest = digest.trim().to_ascii_lowercase();
                    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                        anyhow::bail!("MODEL_CHECKSUM must be a 64-character hex SHA-256 digest");
                    }
                    Ok(digest)
                })
                .transpose()?,
            relabel_feature_importance: var("RELABEL_FEATURE_IMPORTANCE")
                .map(|value| parse_bool("RELABEL_FEATURE_IMPORTANCE", &value))
                .transpose()?
                .unwrap_or(defaults.relabel_feature_importance),
            rate_limit_per_second: var("RATE_LIMIT_PER_SECOND")
                .map(|value| match value.trim().parse::<u64>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => anyhow::bail!("RATE_LIMIT_PER_SECOND must be a positive integer"),
                })
                .transpose()?
                .unwrap_or(defaults.rate_limit_per_second),
            rate_limit_burst: var("RATE_LIMIT_BURST")
                .map(|value| match value.trim().parse::<u32>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => anyhow::bail!("RATE_LIMIT_BURST must be a positive integer"),
                })
                .transpose()?
                .unwrap_or(defaults.rate_limit_burst),
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
        };

        tracing::debug!("Model path: {}", config.model_path.display());
        if config.model_checksum.is_some() {
            tracing::info!("Artifact checksum pinned via MODEL_CHECKSUM");
        }
        tracing::debug!("Server: {}:{}", config.host, config.port);
        tracing::debug!("Environment: {}", config.environment);

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be a boolean (true/false)", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_path, PathBuf::from("model/model.json"));
        assert!(config.relabel_feature_importance);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_overrides() {
        let digest = "a".repeat(64);
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9100"),
            ("MODEL_PATH", "/srv/churn/model.json"),
            ("MODEL_CHECKSUM", digest.as_str()),
            ("RELABEL_FEATURE_IMPORTANCE", "false"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.model_path, PathBuf::from("/srv/churn/model.json"));
        assert_eq!(config.model_checksum, Some(digest));
        assert!(!config.relabel_feature_importance);
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("MODEL_CHECKSUM", "abc")])).is_err());
        assert!(Config::from_lookup(lookup(&[("RELABEL_FEATURE_IMPORTANCE", "maybe")])).is_err());
        assert!(Config::from_lookup(lookup(&[("RATE_LIMIT_BURST", "0")])).is_err());
    }
}
