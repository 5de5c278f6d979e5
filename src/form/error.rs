use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form '{form}' has no field '{field}'")]
    UnknownField { form: String, field: String },

    #[error("field '{0}' is not a list of entries")]
    NotAnArray(String),

    #[error("row {index} of '{field}' does not exist")]
    RowOutOfRange { field: String, index: usize },

    /// Payload requested before a picked file was uploaded and registered
    #[error("file for '{0}' has not been uploaded")]
    UnresolvedFile(String),

    #[error("your roles do not allow using the '{0}' form")]
    Forbidden(String),

    #[error("your roles do not allow you to {action} {resource}")]
    AccessDenied { action: &'static str, resource: String },

    #[error("invalid input {source_name}: {detail}")]
    Input { source_name: String, detail: String },
}
