use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomologaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unreadable workbook '{source_id}': {message}")]
    Workbook { source_id: String, message: String },

    #[error("unreadable delimited file '{source_id}': {message}")]
    Delimited { source_id: String, message: String },

    #[error("column '{column}' not found in header of source '{source_id}'")]
    Resolution { source_id: String, column: String },

    #[error("no profile registered for source '{0}' and no manual mapping supplied")]
    UnknownSource(String),
}

pub type Result<T> = std::result::Result<T, HomologaError>;
