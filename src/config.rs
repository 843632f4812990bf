//! Engine configuration.
//!
//! Configuration is static: loaded once at process start, validated, then
//! shared read-only by every batch. All sections are optional; a missing
//! section falls back to its defaults, while a present `[weights]` or
//! `[priorities]` table replaces the default table wholesale.
//!
//! ```toml
//! [weights]
//! aws-tags = 0.9
//! github-codeowners = 0.85
//!
//! [priorities]
//! aws-tags = 1
//! github-codeowners = 2
//!
//! [scoring]
//! agreement_bonus = 0.1
//! decay_rate = 0.05
//!
//! [resolver]
//! conflict_threshold = 0.3
//! retain_audit = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::confidence::ScoringConfig;
use crate::error::ConfigError;
use crate::resolver::ResolverConfig;
use crate::trust::{SourcePriorityTable, SourceWeightTable};

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Source reliability weights.
    pub weights: SourceWeightTable,

    /// Source conflict priorities.
    pub priorities: SourcePriorityTable,

    /// Scoring parameters.
    pub scoring: ScoringConfig,

    /// Resolver parameters.
    pub resolver: ResolverConfig,
}

impl ReconcileConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Validation` for out-of-range values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            weights = config.weights.len(),
            priorities = config.priorities.len(),
            "loaded reconciliation config"
        );
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found, wrapped in
    /// `ConfigError::Validation`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.priorities.validate()?;
        self.scoring.validate()?;
        self.resolver.validate()?;
        Ok(())
    }
}
