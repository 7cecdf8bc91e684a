use thiserror::Error;

/// Errors raised by the filter configuration core
#[derive(Error, Debug)]
pub enum FilterError {
    /// Another session holds the filter state facility marker
    #[error("Filter state file currently in use; try again later")]
    StoreBusy,

    /// The snapshot write stored fewer bytes than a full snapshot
    #[error("Unable to write filter state information ({written} of {expected} bytes written)")]
    ShortWrite { written: usize, expected: usize },

    /// A previously applied IP filter could not be reloaded
    #[error("Unable to reload IP filter '{name}': {reason}")]
    FilterReResolutionFailed { name: String, reason: String },

    /// IP filter name is empty or contains a NUL byte
    #[error("Invalid IP filter name: {0:?}")]
    InvalidFilterName(String),

    /// IP filter name does not fit the fixed-size name buffer
    #[error("IP filter name is {len} bytes, limit is {limit}")]
    NameTooLong { len: usize, limit: usize },

    /// IP filter rule payload does not fit the fixed-size rule buffer
    #[error("IP filter rule set is {size} bytes, limit is {limit}")]
    RulesTooLarge { size: usize, limit: usize },

    /// Error from I/O operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FilterError {
    /// Short category name, used when logging
    pub fn kind(&self) -> &'static str {
        match self {
            FilterError::StoreBusy => "StoreBusy",
            FilterError::ShortWrite { .. } => "ShortWrite",
            FilterError::FilterReResolutionFailed { .. } => "FilterReResolutionFailed",
            FilterError::InvalidFilterName(_) => "InvalidFilterName",
            FilterError::NameTooLong { .. } => "NameTooLong",
            FilterError::RulesTooLarge { .. } => "RulesTooLarge",
            FilterError::IoError(_) => "Io",
        }
    }
}

/// Result type for the filter configuration core
pub type FilterResult<T> = Result<T, FilterError>;
