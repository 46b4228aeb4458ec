use thiserror::Error;

/// Failures raised by the capability and resource registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate name: {0}")]
    DuplicateName(String),

    #[error("access denied: {0}")]
    Access(String),

    #[error("read failed for {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures raised when formatting a registered prompt template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("unknown template: {0}")]
    NotFound(String),

    #[error("missing variable: {placeholder}")]
    MissingVariable { placeholder: String },
}
