/// Refusal reported by a row type when a field is read or written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// The row type has no field with this key.
    #[error("field '{key}' does not exist on this row")]
    UnknownKey { key: String },

    /// The field exists but the value could not be coerced into it.
    #[error("field '{key}' rejected '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl FieldError {
    pub fn unknown(key: impl Into<String>) -> Self {
        Self::UnknownKey { key: key.into() }
    }

    pub fn invalid(key: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the grid engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A column key does not resolve on the row type. Programming error.
    #[error("column '{key}' does not resolve: {detail}")]
    Configuration { key: String, detail: String },

    /// The insertion draft is incomplete or was refused by the row type.
    #[error("{}", validation_message(.missing, .reason.as_deref()))]
    Validation {
        missing: Vec<String>,
        reason: Option<String>,
    },

    /// The row type refused an edited value; the row is unchanged.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("column '{key}' is read-only")]
    ReadOnlyColumn { key: String },

    #[error("row {index} is out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("cannot parse filter: {0}")]
    FilterSyntax(String),

    /// The save handler failed. In-memory edits are kept.
    #[error("save failed: {0}")]
    Save(String),

    #[error("a save is already in progress")]
    SaveInFlight,

    #[error("{0} is disabled for this table")]
    FeatureDisabled(&'static str),
}

fn validation_message(missing: &[String], reason: Option<&str>) -> String {
    match (missing.is_empty(), reason) {
        (false, _) => format!("please fill all fields (missing: {})", missing.join(", ")),
        (true, Some(reason)) => reason.to_string(),
        (true, None) => "draft row is invalid".to_string(),
    }
}

impl GridError {
    /// Convert a row-level refusal raised while editing `key`.
    pub(crate) fn from_field(key: &str, err: FieldError) -> Self {
        match err {
            FieldError::UnknownKey { key } => GridError::Configuration {
                key,
                detail: "row type has no such field".into(),
            },
            FieldError::Invalid { reason, .. } => GridError::InvalidValue {
                key: key.to_string(),
                reason,
            },
        }
    }

    /// Whether the error is caused by user input and can be shown inline.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GridError::Configuration { .. })
    }
}
