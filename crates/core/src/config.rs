//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the session and
//! dashboard services. Request handling never reads environment variables; binaries call the
//! `*_from_env_value` helpers below with whatever `std::env::var` returned and build a
//! [`CoreConfig`] from the results.

use crate::constants::{DEFAULT_FIXTURES_YAML, DEFAULT_HIGH_RISK_AGE};
use crate::wizard::FlowVariant;
use crate::{TriageError, TriageResult};
use std::path::PathBuf;

/// Oldest age accepted as a high-risk threshold.
const MAX_HIGH_RISK_AGE: u32 = 130;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    flow_variant: FlowVariant,
    high_risk_age: u32,
    fixtures_yaml: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] if `high_risk_age` is zero or implausibly large, or
    /// if the fixture document is blank.
    pub fn new(
        flow_variant: FlowVariant,
        high_risk_age: u32,
        fixtures_yaml: String,
    ) -> TriageResult<Self> {
        if high_risk_age == 0 || high_risk_age > MAX_HIGH_RISK_AGE {
            return Err(TriageError::InvalidInput(format!(
                "high risk age must be within 1..={MAX_HIGH_RISK_AGE}, got {high_risk_age}"
            )));
        }
        if fixtures_yaml.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "fixture document cannot be empty".into(),
            ));
        }

        Ok(Self {
            flow_variant,
            high_risk_age,
            fixtures_yaml,
        })
    }

    pub fn flow_variant(&self) -> FlowVariant {
        self.flow_variant
    }

    pub fn high_risk_age(&self) -> u32 {
        self.high_risk_age
    }

    pub fn fixtures_yaml(&self) -> &str {
        &self.fixtures_yaml
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            flow_variant: FlowVariant::default(),
            high_risk_age: DEFAULT_HIGH_RISK_AGE,
            fixtures_yaml: DEFAULT_FIXTURES_YAML.to_string(),
        }
    }
}

/// Parse the wizard flow variant from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default variant.
pub fn flow_variant_from_env_value(value: Option<String>) -> TriageResult<FlowVariant> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<FlowVariant>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the high-risk age threshold from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_HIGH_RISK_AGE`].
pub fn high_risk_age_from_env_value(value: Option<String>) -> TriageResult<u32> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_HIGH_RISK_AGE),
        Some(v) => v.parse::<u32>().map_err(|_| {
            TriageError::InvalidInput(format!("high risk age must be a whole number, got {v:?}"))
        }),
    }
}

/// Resolve the fixture document text.
///
/// With no override the demo fixtures compiled into the crate are used. An override must point
/// at a readable file; its contents are returned verbatim and validated later when the
/// [`FixtureBook`](crate::fixtures::FixtureBook) is parsed.
pub fn load_fixtures_source(override_path: Option<PathBuf>) -> TriageResult<String> {
    match override_path {
        None => Ok(DEFAULT_FIXTURES_YAML.to_string()),
        Some(path) => {
            tracing::info!("loading dashboard fixtures from {}", path.display());
            std::fs::read_to_string(&path).map_err(TriageError::FixtureRead)
        }
    }
}
