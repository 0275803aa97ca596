//! User preferences, read from a TOML file next to the executable's working
//! directory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PrefsError;

/// Name of the preferences file looked up in the working directory.
pub(crate) const PREFS_FILE: &str = "cube_prefs.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct Preferences {
    /// Minimum drag distance in pixels for a gesture to count as a twist.
    pub(crate) drag_threshold: f32,
    /// Edge length of one cubie in world units.
    pub(crate) cubie_size: f32,
    /// Space between neighboring cubies in world units.
    pub(crate) cubie_gap: f32,
    pub(crate) camera_distance: f32,
    pub(crate) fovy_degrees: f32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            drag_threshold: 50.0,
            cubie_size: 1.0,
            cubie_gap: 0.05,
            // Same distance as a camera placed at (5, 5, 5).
            camera_distance: 75.0_f32.sqrt(),
            fovy_degrees: 50.0,
        }
    }
}

impl Preferences {
    /// Parses and validates preferences from TOML text. Missing fields take
    /// their default values.
    pub(crate) fn from_toml_str(s: &str) -> Result<Self, PrefsError> {
        let prefs: Self = toml::from_str(s)?;
        prefs.validate()?;
        Ok(prefs)
    }

    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads preferences from `path`, falling back to defaults if the file
    /// is missing or invalid.
    pub(crate) fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no preferences file at {}; using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(prefs) => {
                log::info!("loaded preferences from {}", path.display());
                prefs
            }
            Err(e) => {
                log::warn!("error loading {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), PrefsError> {
        let invalid = |field, reason: &str| {
            Err(PrefsError::Invalid {
                field,
                reason: reason.to_owned(),
            })
        };

        if !self.drag_threshold.is_finite() || self.drag_threshold < 0.0 {
            return invalid("drag_threshold", "must be a non-negative number");
        }
        if !self.cubie_size.is_finite() || self.cubie_size <= 0.0 {
            return invalid("cubie_size", "must be positive");
        }
        if !self.cubie_gap.is_finite() || self.cubie_gap < 0.0 {
            return invalid("cubie_gap", "must be a non-negative number");
        }
        if !self.camera_distance.is_finite() || self.camera_distance <= 0.0 {
            return invalid("camera_distance", "must be positive");
        }
        if !(self.fovy_degrees > 0.0 && self.fovy_degrees < 180.0) {
            return invalid("fovy_degrees", "must be between 0 and 180");
        }
        Ok(())
    }
}
