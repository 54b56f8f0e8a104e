/// Convenience result type used across figcomp.
pub type FigResult<T> = Result<T, FigError>;

/// Top-level error taxonomy used by engine APIs.
///
/// The background remover and the composition engine are total over their own state and never
/// return these; they surface from I/O edges (fetching, decoding, export, persistence).
#[derive(thiserror::Error, Debug)]
pub enum FigError {
    /// Invalid user-provided data (bad URL, malformed data URL, bad dimensions).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while fetching image bytes from disk, network or the image proxy.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Errors while decoding or encoding raster images.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors while rasterizing an export.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while reading or writing saved collections.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FigError {
    /// Build a [`FigError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FigError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`FigError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`FigError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FigError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`FigError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
