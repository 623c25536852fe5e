use thiserror::Error;

/// Errors raised by a document store backend
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend rejected or failed an operation
    #[error("Database error: {0}")]
    Database(String),

    /// The backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// A document could not be converted to or from its stored form
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Errors raised by a blob store backend
#[derive(Debug, Clone, Error)]
pub enum BlobError {
    /// No blob exists under the given key
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// The key is not a plain file name or escapes the storage root
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    /// The upload exceeded the per-kind size limit
    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    /// Reading the incoming body failed
    #[error("Failed to read upload body: {0}")]
    Body(String),

    /// Filesystem or backend I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BlobError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            BlobError::NotFound(err.to_string())
        } else {
            BlobError::Io(err.to_string())
        }
    }
}

/// Errors surfaced by HTTP handlers.
///
/// Each variant maps to exactly one HTTP status; see the `IntoResponse`
/// implementation in [`crate::server::handlers`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Path identifier is not a valid ObjectId (400)
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Request body is not acceptable for this route (400)
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Multipart request carried no file under the expected field (400)
    #[error("No file uploaded in field '{0}'")]
    MissingFile(&'static str),

    /// Uploaded file has a disallowed extension (400)
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Client-supplied media path does not resolve inside a known mount (400)
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    /// No document or file matched (404)
    #[error("{0}")]
    NotFound(String),

    /// Upload exceeded its cap (413)
    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    /// JSON request body exceeded the configured limit (413)
    #[error("Request body too large: {0}")]
    BodyTooLarge(String),

    /// Document store failure (500)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Blob storage failure (500, or mapped to a client error where applicable)
    #[error(transparent)]
    Blob(BlobError),
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound(key) => ApiError::NotFound(format!("File not found: {}", key)),
            BlobError::InvalidKey(key) => ApiError::InvalidPath(key),
            BlobError::TooLarge { limit } => ApiError::PayloadTooLarge { limit },
            BlobError::Body(message) => ApiError::InvalidBody(message),
            other => ApiError::Blob(other),
        }
    }
}
