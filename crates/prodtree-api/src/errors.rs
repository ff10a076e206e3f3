use serde::{Deserialize, Serialize};
use specta::Type;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("invalid_argument", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    /// The request is well formed but collides with state, e.g. an edit
    /// already in flight for the same field.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == "not_found"
    }
}

impl From<prodtree_core::DayParseError> for ApiError {
    fn from(value: prodtree_core::DayParseError) -> Self {
        Self::invalid_argument(value.to_string())
    }
}

impl From<prodtree_core::EnumConversionError> for ApiError {
    fn from(value: prodtree_core::EnumConversionError) -> Self {
        Self::invalid_argument(value.to_string())
    }
}

impl From<prodtree_core::FieldValueError> for ApiError {
    fn from(value: prodtree_core::FieldValueError) -> Self {
        Self::invalid_argument(value.to_string())
    }
}

impl From<prodtree_core::UnknownFieldError> for ApiError {
    fn from(value: prodtree_core::UnknownFieldError) -> Self {
        Self::invalid_argument(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_invalid_argument() {
        let err: ApiError = prodtree_core::parse_day("31.12.2024").unwrap_err().into();
        assert_eq!(err.code, "invalid_argument");
        assert!(err.message.contains("31.12.2024"));

        let err: ApiError = prodtree_core::ItemField::try_from("colour").unwrap_err().into();
        assert_eq!(err.code, "invalid_argument");
    }

    #[test]
    fn test_display_includes_code() {
        assert_eq!(ApiError::conflict("busy").to_string(), "conflict: busy");
        assert!(ApiError::not_found("x").is_not_found());
    }
}
