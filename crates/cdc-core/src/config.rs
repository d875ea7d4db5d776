//! Editor configuration
//!
//! Loaded from TOML; every section and key is optional.
//!
//! ```toml
//! [recompute]
//! policy = "values-affected"
//! prefer_cache = false
//!
//! [colors]
//! neutral = "white"
//! palette = ["#111111", "#222222"]
//!
//! [drafts]
//! default_goal = 500
//! tracked = ["legend", "formula"]
//! ```

use crate::collaborators::RecomputeOptions;
use crate::draft::{DraftField, FieldMask};
use crate::error::ConfigError;
use cdc_model::{Color, FieldChanges};
use cdc_palette::{Palette, DEFAULT_PRIMARY};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When phase 2 runs after a successful persist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecomputePolicy {
    /// After every successful persist
    #[default]
    Always,
    /// Only when formula, max records or goal changed
    ValuesAffected,
}

impl RecomputePolicy {
    /// Whether this change set gets a phase 2
    #[inline]
    #[must_use]
    pub fn should_recompute(self, changes: &FieldChanges) -> bool {
        match self {
            Self::Always => true,
            Self::ValuesAffected => changes.affects_values(),
        }
    }
}

/// `[recompute]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomputeSettings {
    pub policy: RecomputePolicy,
    /// Reuse previously fetched source data
    pub reuse_source: bool,
    /// Skip re-parsing source data
    pub skip_parsing: bool,
    /// Accept a cached computation
    pub prefer_cache: bool,
}

impl RecomputeSettings {
    /// Options handed to the recompute trigger
    #[inline]
    #[must_use]
    pub fn options(&self) -> RecomputeOptions {
        RecomputeOptions {
            reuse_source: self.reuse_source,
            skip_parsing: self.skip_parsing,
            prefer_cache: self.prefer_cache,
        }
    }
}

impl Default for RecomputeSettings {
    fn default() -> Self {
        Self {
            policy: RecomputePolicy::Always,
            reuse_source: true,
            skip_parsing: true,
            prefer_cache: true,
        }
    }
}

/// `[colors]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Rendered for categories past the end of the fill colors
    pub neutral: Color,
    /// Shown in place of a fully transparent swatch
    pub primary: Color,
    /// Fill color set when fill is toggled
    pub transparent: Color,
    /// Replaces the built-in chart palette
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            neutral: Color::new("white"),
            primary: Color::new(DEFAULT_PRIMARY),
            transparent: Color::transparent(),
            palette: None,
        }
    }
}

/// `[drafts]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftSettings {
    /// Seeded into the goal draft by "set a goal"
    pub default_goal: f64,
    /// Fields reconciled against the canonical record
    pub tracked: Vec<DraftField>,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            default_goal: 1000.0,
            tracked: DraftField::ALL.to_vec(),
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub recompute: RecomputeSettings,
    pub colors: ColorSettings,
    pub drafts: DraftSettings,
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML (an empty palette list is
    /// malformed), `ConfigError::Invalid` on a non-finite default goal.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// As [`EditorConfig::from_toml_str`], plus `ConfigError::Io`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML
    ///
    /// # Errors
    /// `ConfigError::Invalid` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.drafts.default_goal.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "default_goal must be finite, got {}",
                self.drafts.default_goal
            )));
        }
        Ok(())
    }

    /// With recompute policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: RecomputePolicy) -> Self {
        self.recompute.policy = policy;
        self
    }

    /// With palette override
    #[inline]
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.colors.palette = Some(palette);
        self
    }

    /// With tracked draft fields
    #[inline]
    #[must_use]
    pub fn with_tracked(mut self, fields: impl IntoIterator<Item = DraftField>) -> Self {
        self.drafts.tracked = fields.into_iter().collect();
        self
    }

    /// Palette used for backfilling categories
    #[must_use]
    pub fn palette(&self) -> Palette {
        self.colors.palette.clone().unwrap_or_default()
    }

    /// Reconciliation mask from the tracked field list
    #[must_use]
    pub fn field_mask(&self) -> FieldMask {
        self.drafts.tracked.iter().map(|f| f.flag()).collect()
    }
}
