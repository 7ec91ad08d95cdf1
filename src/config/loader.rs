//! Configuration Loader
//!
//! Layered configuration loading: an optional file (format inferred from its
//! extension) overridden by `RESPONSE_PIPELINE__*` environment variables.

use std::path::Path;
use tracing::debug;

use super::PipelineConfig;
use crate::error::Result;

/// Environment variable prefix, e.g. `RESPONSE_PIPELINE__BATCH_SIZE=25`
pub const ENV_PREFIX: &str = "RESPONSE_PIPELINE";

impl PipelineConfig {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load configuration using a custom environment prefix.
    ///
    /// Nested fields use `__` as separator: `PREFIX__BACKOFF__MAX_DELAY_MS`.
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading pipeline configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let loaded: PipelineConfig = settings.try_deserialize()?;
        let config = loaded.clamped();

        debug!(
            batch_size = config.batch_size,
            batch_timeout_ms = config.batch_timeout_ms,
            max_concurrent_batches = config.max_concurrent_batches,
            max_retries = config.max_retries,
            "Pipeline configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = PipelineConfig::load_with_prefix(None, "RP_LOADER_TEST_EMPTY").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_from_toml_file_clamps_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
batch_size = 5000
max_concurrent_batches = 2
max_retries = 5

[backoff]
base_delay_ms = 250
"#
        )
        .unwrap();

        let config =
            PipelineConfig::load_with_prefix(Some(file.path()), "RP_LOADER_TEST_FILE").unwrap();

        assert_eq!(config.batch_size, 1_000);
        assert_eq!(config.max_concurrent_batches, 2);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff.base_delay_ms, 250);
        assert_eq!(config.backoff.max_delay_ms, 30_000);
    }

    #[test]
    fn test_missing_file_is_a_configuration_error() {
        let result = PipelineConfig::load_with_prefix(
            Some(Path::new("/nonexistent/response-pipeline.toml")),
            "RP_LOADER_TEST_MISSING",
        );
        assert!(matches!(
            result,
            Err(crate::error::PipelineError::Configuration { .. })
        ));
    }
}
