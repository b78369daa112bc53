//! Pipeline configuration (§6).
//!
//! Every knob here has a default matching the spec's configuration table.
//! Configuration is a plain `serde`-derived struct tree, not a managed
//! config-service client: callers load it from TOML with
//! [`PipelineConfig::from_toml_str`] or build it in code with `..Default::default()`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaCacheConfig {
    /// Freshness window for both cache tiers.
    #[serde(with = "humantime_secs")]
    pub ttl: Duration,
    /// If false, every call performs a catalog fetch.
    pub enabled: bool,
    /// File-tier root directory.
    pub directory: std::path::PathBuf,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            enabled: true,
            directory: std::path::PathBuf::from("./.nlq-cache"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorConfig {
    pub row_cap_default: u32,
    pub row_cap_max: u32,
    pub statement_max_bytes: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            row_cap_default: 1_000,
            row_cap_max: 10_000,
            statement_max_bytes: 20 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    #[serde(with = "humantime_secs")]
    pub statement_timeout: Duration,
    pub max_columns: usize,
    pub retry_transient: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            statement_timeout: Duration::from_secs(30),
            max_columns: 200,
            retry_transient: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    pub retry_malformed: bool,
    pub max_question_length: usize,
    pub max_narrative_length: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            retry_malformed: true,
            max_question_length: 2_000,
            max_narrative_length: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualizerConfig {
    pub enabled: bool,
    pub dpi: u32,
    pub max_points: usize,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dpi: 150,
            max_points: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExporterConfig {
    pub enabled: bool,
    pub max_column_width: usize,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_column_width: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub schema_cache: SchemaCacheConfig,
    pub validator: ValidatorConfig,
    pub executor: ExecutorConfig,
    pub llm: LlmConfig,
    pub visualizer: VisualizerConfig,
    pub exporter: ExporterConfig,
    pub exports_dir: std::path::PathBuf,
    pub viz_dir: std::path::PathBuf,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// `serde(with = ...)` helper: (de)serializes a [`Duration`] as whole seconds,
/// matching how the teacher's linter config keeps its TOML surface flat and
/// human-editable.
mod humantime_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(de)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = PipelineConfig::default();
        assert_eq!(config.schema_cache.ttl, Duration::from_secs(3600));
        assert_eq!(config.validator.row_cap_default, 1_000);
        assert_eq!(config.validator.row_cap_max, 10_000);
        assert_eq!(config.validator.statement_max_bytes, 20 * 1024);
        assert_eq!(config.executor.statement_timeout, Duration::from_secs(30));
        assert_eq!(config.executor.max_columns, 200);
        assert_eq!(config.visualizer.dpi, 150);
    }

    #[test]
    fn partial_toml_fills_remaining_fields_with_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [validator]
            rowCapDefault = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.validator.row_cap_default, 50);
        assert_eq!(config.validator.row_cap_max, 10_000);
        assert_eq!(config.executor.max_columns, 200);
    }
}
