use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid variable key '{0}' (expected DATASET.VARIABLE)")]
    InvalidVariableKey(String),

    #[error("unknown data type '{0}'")]
    InvalidDataType(String),

    #[error("invalid codelist marker '{0}' (expected Yes, No or a codelist code)")]
    InvalidMarker(String),

    #[error("unknown comparator '{0}'")]
    InvalidComparator(String),

    #[error("condition on {variable} has no values")]
    EmptyCondition { variable: String },

    #[error("condition has no variable name")]
    MissingConditionVariable,

    #[error("misaligned subset specification for {key}: {detail}")]
    Misaligned { key: String, detail: String },

    #[error("variable {0} is not part of the subset specification")]
    UnknownVariable(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
