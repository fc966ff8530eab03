use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";
pub const ENV_PREFIX: &str = "CASHBID_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by merging built-in defaults, a TOML file, and
    /// `CASHBID_`-prefixed environment variables (nested keys split on `__`).
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment contain invalid values.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
        }

        let config: AppConfig = Self::figment(path)
            .extract()
            .with_context(|| format!("Invalid configuration ({})", path.display()))?;

        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commodity::Commodity;
    use crate::config::RetentionPolicy;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ConfigLoader::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.pipeline.commodities, Commodity::ALL.to_vec());
        assert_eq!(config.source.location.as_deref(), Some("Rolla"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[source]
timeout_secs = 5
location = "Dunseith"

[pipeline]
commodities = ["corn", "canola"]
retention = "collapse_unchanged"
ceiling_multiplier = 4

[pipeline.bounds.corn]
min = 1.5
max = 12
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from(file.path()).unwrap();

        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.source.location.as_deref(), Some("Dunseith"));
        assert_eq!(
            config.pipeline.commodities,
            vec![Commodity::Corn, Commodity::Canola]
        );
        assert_eq!(config.pipeline.retention, RetentionPolicy::CollapseUnchanged);
        assert_eq!(config.pipeline.ceiling_multiplier, dec!(4));

        let corn = config.pipeline.band_for(Commodity::Corn);
        assert_eq!(corn.min, dec!(1.5));
        assert_eq!(corn.max, dec!(12));
        // untouched entries keep their defaults
        assert_eq!(config.pipeline.band_for(Commodity::Canola).max, dec!(100));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nretention = \"sometimes\"").unwrap();

        assert!(ConfigLoader::load_from(file.path()).is_err());
    }
}
