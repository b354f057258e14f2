use thiserror::Error;

/// Metadata attribute a lookup failed to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataKind {
    MimeType,
    LastModified,
    FileSize,
    Visibility,
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MetadataKind::MimeType => "mime_type",
            MetadataKind::LastModified => "last_modified",
            MetadataKind::FileSize => "file_size",
            MetadataKind::Visibility => "visibility",
        };

        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum FSError {
    #[error("object not found at: {location}")]
    NotFound { location: String },

    #[error("failed to read object at: {location}, {reason}")]
    ReadFailure { location: String, reason: String },

    #[error("failed to write object at: {location}, {reason}")]
    WriteFailure { location: String, reason: String },

    #[error("failed to delete object at: {location}, {reason}")]
    DeleteFailure { location: String, reason: String },

    #[error("failed to list objects at: {location}, {reason}")]
    ListFailure { location: String, reason: String },

    #[error("failed to copy from: {source_path} to: {destination}")]
    CopyFailure {
        source_path: String,
        destination: String,
        #[source]
        cause: Box<FSError>,
    },

    #[error("failed to move from: {source_path} to: {destination}")]
    MoveFailure {
        source_path: String,
        destination: String,
        #[source]
        cause: Box<FSError>,
    },

    #[error("failed to retrieve {kind} for: {location}, {reason}")]
    MetadataUnavailable {
        location: String,
        kind: MetadataKind,
        reason: String,
    },

    #[error("unsupported operation at: {location}, {reason}")]
    UnsupportedOperation { location: String, reason: String },

    #[error("path traversal above the root: {location}")]
    PathTraversal { location: String },
}

impl FSError {
    pub fn not_found(location: &str) -> Self {
        FSError::NotFound {
            location: location.to_string(),
        }
    }

    pub fn metadata(location: &str, kind: MetadataKind, reason: impl ToString) -> Self {
        FSError::MetadataUnavailable {
            location: location.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FSError::NotFound { .. })
    }

    /// Short label used as the `error_group` field in logs.
    pub fn group(&self) -> &'static str {
        match self {
            FSError::NotFound { .. } => "not_found",
            FSError::ReadFailure { .. } => "read_object",
            FSError::WriteFailure { .. } => "write_object",
            FSError::DeleteFailure { .. } => "delete_object",
            FSError::ListFailure { .. } => "list_objects",
            FSError::CopyFailure { .. } => "copy",
            FSError::MoveFailure { .. } => "move",
            FSError::MetadataUnavailable { .. } => "metadata",
            FSError::UnsupportedOperation { .. } => "unsupported",
            FSError::PathTraversal { .. } => "path_traversal",
        }
    }
}
