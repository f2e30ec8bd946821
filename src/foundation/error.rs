/// Result alias used across the assembly pipeline.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Error taxonomy of the video assembly engine.
///
/// Only [`AssemblyError::Render`] is recovered from (by the fallback render); every other
/// variant reaches the caller unchanged.
#[derive(thiserror::Error, Debug)]
pub enum AssemblyError {
    /// The encoder is missing or not executable.
    #[error("capability error: {0}")]
    Capability(String),

    /// No usable input assets remained after validation.
    #[error("asset error: {0}")]
    Asset(String),

    /// The encoder failed or produced an unusable file.
    #[error("render error: {0}")]
    Render(String),

    /// Both the primary render and the placeholder render failed.
    #[error("fallback exhausted: primary render failed ({primary}); fallback render failed ({fallback})")]
    FallbackExhausted {
        /// Message of the primary render failure.
        primary: String,
        /// Message of the fallback render failure.
        fallback: String,
    },

    /// Invalid request or configuration value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller cancelled the in-flight encoder process.
    #[error("render cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssemblyError {
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn fallback_exhausted(primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self::FallbackExhausted {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }

    /// Return `true` for failures the engine answers with a fallback render.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Render(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
