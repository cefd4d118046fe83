use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    PathNotFound,

    MappingNotFound,
    MappingEmpty,
    MappingInvalid,
    MappingDuplicateKey,

    NamingExhausted,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::PathNotFound => "path.not_found",

            ErrorCode::MappingNotFound => "mapping.not_found",
            ErrorCode::MappingEmpty => "mapping.empty",
            ErrorCode::MappingInvalid => "mapping.invalid",
            ErrorCode::MappingDuplicateKey => "mapping.duplicate_key",

            ErrorCode::NamingExhausted => "naming.exhausted",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(context) = self.details.get("context").and_then(Value::as_str) {
            write!(f, " ({})", context)?;
        }
        if let Some(error) = self.details.get("error").and_then(Value::as_str) {
            write!(f, ": {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathNotFoundDetails {
    pub field: String,
    pub path: String,
}

/// Where a mapping file failed to parse, with the lines around the failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingInvalidDetails {
    pub path: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excerpt: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDuplicateKeyDetails {
    pub old_name: String,
    pub existing: String,
    pub rejected: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingExhaustedDetails {
    pub length: usize,
    pub attempts: usize,
    pub used: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                id,
            }),
        )
    }

    pub fn path_not_found(field: impl Into<String>, path: impl Into<String>) -> Self {
        let field = field.into();
        let path = path.into();
        Self::new(
            ErrorCode::PathNotFound,
            format!("Path does not exist: {}", path),
            to_details(PathNotFoundDetails { field, path }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn mapping_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::MappingNotFound,
            format!("Mapping file not found: {}", path),
            serde_json::json!({ "path": path }),
        )
        .with_hint("Run 'asset-rename rename <ASSETS_PATH>' first to generate a mapping file")
    }

    pub fn mapping_empty(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MappingEmpty,
            "Mapping file is empty or contains no usable entries",
            serde_json::json!({ "path": path.into() }),
        )
    }

    pub fn mapping_invalid(details: MappingInvalidDetails) -> Self {
        Self::new(
            ErrorCode::MappingInvalid,
            "Mapping file could not be parsed",
            to_details(details),
        )
    }

    pub fn mapping_duplicate_key(
        old_name: impl Into<String>,
        existing: impl Into<String>,
        rejected: impl Into<String>,
    ) -> Self {
        let old_name = old_name.into();
        Self::new(
            ErrorCode::MappingDuplicateKey,
            format!("'{}' is already mapped", old_name),
            to_details(MappingDuplicateKeyDetails {
                old_name,
                existing: existing.into(),
                rejected: rejected.into(),
            }),
        )
    }

    pub fn naming_exhausted(length: usize, attempts: usize, used: usize) -> Self {
        Self::new(
            ErrorCode::NamingExhausted,
            format!(
                "Could not generate a unique {}-character name after {} attempts",
                length, attempts
            ),
            to_details(NamingExhaustedDetails {
                length,
                attempts,
                used,
            }),
        )
        .with_hint("Increase random_name_length in the config file")
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dotted() {
        assert_eq!(ErrorCode::MappingEmpty.as_str(), "mapping.empty");
        assert_eq!(ErrorCode::NamingExhausted.as_str(), "naming.exhausted");
    }

    #[test]
    fn display_includes_context_and_cause() {
        let err = Error::internal_io("permission denied", Some("write a.json".to_string()));
        assert_eq!(err.to_string(), "IO error (write a.json): permission denied");
    }

    #[test]
    fn mapping_not_found_carries_hint() {
        let err = Error::mapping_not_found("image_mapping.json");
        assert_eq!(err.code, ErrorCode::MappingNotFound);
        assert_eq!(err.hints.len(), 1);
        assert_eq!(err.details["path"], "image_mapping.json");
    }
}
