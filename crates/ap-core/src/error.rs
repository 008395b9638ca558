use thiserror::Error;

/// Errors shared by every stage of the player.
///
/// Each variant is fatal for the operation that raised it. A user-requested
/// stop is not an error and never appears here.
///
/// # Example
/// ```
/// use ap_core::error::PlayerError;
/// let err = PlayerError::InvalidDimensions { width: 0, height: 24 };
/// assert_eq!(err.to_string(), "Dimensions invalides : 0×24");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// Source file is missing or unreadable.
    #[error("Source illisible : {path}")]
    InputUnavailable {
        /// Path that could not be opened.
        path: String,
    },

    /// Malformed bitmap or broken decoder stream.
    #[error("Décodage impossible : {0}")]
    DecodeCorrupt(String),

    /// Terminal geometry or drawing surface could not be used.
    #[error("Terminal indisponible : {0}")]
    TerminalUnavailable(String),

    /// Zero-sized grid or bitmap handed to the sizer.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// A sizing invariant was violated (e.g. a block covering no pixels).
    #[error("Incohérence interne : {0}")]
    InternalConsistency(String),

    /// Invalid configuration value or combination.
    #[error("Configuration invalide : {0}")]
    Config(String),
}
