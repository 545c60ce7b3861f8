use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ai_gateway::types::AIGatewayConfig,
    interview::{SessionOptions, form::CompletionPolicy, session::DEFAULT_MAX_RETRIES_PER_FIELD},
};

const SCHEMA_FILE_NAME: &str = "formfill.schema.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ai_gateway: AIGatewayConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_forms_dir() -> PathBuf {
    PathBuf::from("./forms")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_max_retries_per_field() -> u32 {
    DEFAULT_MAX_RETRIES_PER_FIELD
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    #[serde(default = "default_forms_dir")]
    pub forms_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_retries_per_field")]
    pub max_retries_per_field: u32,
    #[serde(default)]
    pub completion_policy: CompletionPolicy,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            forms_dir: default_forms_dir(),
            output_dir: default_output_dir(),
            max_retries_per_field: default_max_retries_per_field(),
            completion_policy: CompletionPolicy::default(),
        }
    }
}

impl InterviewConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            completion_policy: self.completion_policy,
            max_retries_per_field: self.max_retries_per_field,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

impl Config {
    /// Loads a JSON5 config, validates it against its schema, and anchors
    /// relative directories at the config file's location.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize config")?;

        for dir in [
            &mut config.interview.forms_dir,
            &mut config.interview.output_dir,
            &mut config.logging.dir,
        ] {
            if !dir.is_absolute() {
                *dir = config_base.join(&*dir);
            }
        }

        Ok(config)
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join(SCHEMA_FILE_NAME);
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or {SCHEMA_FILE_NAME} next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
