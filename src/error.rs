//! Error types.

/// Malformed geometric input to the gesture resolver.
///
/// Distinct from the ordinary "no rotation" outcomes (tap, inert drag
/// direction); never fatal.
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub(crate) enum AmbiguousGesture {
    #[error("face normal ({x}, {y}, {z}) is not aligned with any axis")]
    NotAxisAligned { x: f32, y: f32, z: f32 },
    #[error("drag vector has zero length")]
    ZeroDrag,
    #[error("drag vector ({x}, {y}) is not finite")]
    NonFiniteDrag { x: f32, y: f32 },
}

/// Error loading user preferences.
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug)]
pub(crate) enum PrefsError {
    #[error("unable to read preferences file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse preferences: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
