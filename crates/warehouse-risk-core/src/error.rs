use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskEngineError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RiskEngineError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RiskEngineError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RiskEngineError {
    fn from(e: serde_json::Error) -> Self {
        // serde reports absent required keys as "missing field `x`"
        let msg = e.to_string();
        if msg.starts_with("missing field") {
            RiskEngineError::MissingParameter(msg)
        } else {
            RiskEngineError::SerializationError(msg)
        }
    }
}
