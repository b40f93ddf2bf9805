use thiserror::Error;

pub type TrackResult<T> = Result<T, TrackError>;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Invalid caller: {0}")]
    InvalidCaller(String),

    #[error("Blank field: {field} must not be blank")]
    BlankField { field: &'static str },

    #[error("Malformed option '{option}': {reason}")]
    MalformedOption { option: String, reason: String },

    #[error("Definition error: {0}")]
    Definition(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TrackError {
    pub fn blank(field: &'static str) -> Self {
        Self::BlankField { field }
    }

    pub fn malformed(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            TrackError::blank("action").to_string(),
            "Blank field: action must not be blank"
        );
        assert_eq!(
            TrackError::malformed("attr:", "missing attribute name").to_string(),
            "Malformed option 'attr:': missing attribute name"
        );
    }
}
