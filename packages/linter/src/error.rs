use thiserror::Error;

pub type LintResult<T> = Result<T, LintError>;

#[derive(Error, Debug)]
pub enum LintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid property table: {0}")]
    PropertyTable(#[from] serde_json::Error),

    #[error("Property lookup failed for '{class}': {message}")]
    Lookup { class: String, message: String },
}

impl LintError {
    pub fn lookup(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            class: class.into(),
            message: message.into(),
        }
    }
}
