/// Convenience result type used across oralmark.
pub type OralmarkResult<T> = Result<T, OralmarkError>;

/// Top-level error taxonomy used by the annotation core.
#[derive(thiserror::Error, Debug)]
pub enum OralmarkError {
    /// Invalid record, document, or submission data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Base image bytes could not be decoded. Blocks annotation on that
    /// view; previously saved records are unaffected.
    #[error("decode error: {0}")]
    Decode(String),

    /// The rasterizer could not produce a surface or frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Upload collaborator failed in a way worth retrying (network,
    /// timeout, throttling). The in-memory store is left intact.
    #[error("upload error (retryable): {0}")]
    UploadTransient(String),

    /// Upload collaborator rejected the asset outright.
    #[error("upload error: {0}")]
    UploadPermanent(String),

    /// A second export was requested for a (submission, view) pair that
    /// already has one outstanding. Rejected immediately, never queued.
    #[error("export already in flight: {0}")]
    ExportInFlight(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OralmarkError {
    /// Build an [`OralmarkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`OralmarkError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build an [`OralmarkError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build an [`OralmarkError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build an [`OralmarkError::UploadTransient`] value.
    pub fn upload_transient(msg: impl Into<String>) -> Self {
        Self::UploadTransient(msg.into())
    }

    /// Build an [`OralmarkError::UploadPermanent`] value.
    pub fn upload_permanent(msg: impl Into<String>) -> Self {
        Self::UploadPermanent(msg.into())
    }

    /// Build an [`OralmarkError::ExportInFlight`] value.
    pub fn export_in_flight(msg: impl Into<String>) -> Self {
        Self::ExportInFlight(msg.into())
    }

    /// Whether the caller should offer a retry for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UploadTransient(_))
    }
}
