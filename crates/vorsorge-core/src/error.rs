use thiserror::Error;

#[derive(Debug, Error)]
pub enum VorsorgeError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl VorsorgeError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        VorsorgeError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for VorsorgeError {
    fn from(e: serde_json::Error) -> Self {
        VorsorgeError::SerializationError(e.to_string())
    }
}
