use thiserror::Error;

use crate::data::model::SemanticType;

/// Failure of the upload step. The message is shown to the user as is.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type '.{0}'. Please upload a CSV or Excel file.")]
    UnsupportedFileType(String),

    #[error("The uploaded file is empty.")]
    EmptyFile,

    #[error("Malformed dataset: {0}")]
    MalformedResponse(String),

    #[error("Error processing file: {0}")]
    Processing(String),
}

/// A filter write that would break the filter/schema invariant.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("no dataset is loaded")]
    NoDataset,

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{column}' is {actual}, expected {expected}")]
    WrongType {
        column: String,
        expected: SemanticType,
        actual: SemanticType,
    },

    #[error("bound for column '{0}' is not a number")]
    InvalidBound(String),
}
