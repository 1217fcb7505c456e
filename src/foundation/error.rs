/// Convenience result type used across shotreel.
pub type ShotreelResult<T> = Result<T, ShotreelError>;

/// Top-level error taxonomy used by renderer APIs.
#[derive(thiserror::Error, Debug)]
pub enum ShotreelError {
    /// Invalid user-provided manifest, plan, or option data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The encoder executable could not be launched.
    #[error("encoder not found: {0}")]
    EncoderNotFound(String),

    /// The encoder ran but exited unsuccessfully.
    #[error("encoder exited with status {status}\ncommand: {command}\nstderr tail:\n{stderr_tail}")]
    EncoderFailed {
        /// Exit status as reported by the OS.
        status: String,
        /// Leading portion of the command line.
        command: String,
        /// Last part of the captured diagnostic output.
        stderr_tail: String,
    },

    /// The encoder exceeded its time budget and was killed.
    #[error("encoder timed out after {timeout_s}s and was killed\ncommand: {command}")]
    EncoderTimeout {
        /// Budget that was exceeded, in whole seconds.
        timeout_s: u64,
        /// Leading portion of the command line.
        command: String,
    },

    /// Placeholder still generation failed.
    #[error("placeholder error: {0}")]
    Placeholder(String),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShotreelError {
    /// Build a [`ShotreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ShotreelError::EncoderNotFound`] value.
    pub fn encoder_not_found(msg: impl Into<String>) -> Self {
        Self::EncoderNotFound(msg.into())
    }

    /// Build a [`ShotreelError::Placeholder`] value.
    pub fn placeholder(msg: impl Into<String>) -> Self {
        Self::Placeholder(msg.into())
    }

    /// Build a [`ShotreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for the encoder family (not found, failed, timed out).
    pub fn is_encoder_error(&self) -> bool {
        matches!(
            self,
            Self::EncoderNotFound(_) | Self::EncoderFailed { .. } | Self::EncoderTimeout { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
