//! Error types for the photo ingest service.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Messaging platform errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("File lookup failed for {file_id}: {reason}")]
    FileLookup { file_id: String, reason: String },

    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Upstream classification errors.
///
/// These never leave a classifier: each client folds them into the
/// `error` field of its result.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Failed to fetch image: {0}")]
    ImageFetch(String),

    #[error("Request to {service} failed: {reason}")]
    RequestFailed { service: String, reason: String },

    #[error("{service} returned HTTP {status}")]
    Status { service: String, status: u16 },

    #[error("{service} reported failure: {reason}")]
    Upstream { service: String, reason: String },

    #[error("Could not properly parse {service} response: {reason}")]
    InvalidResponse { service: String, reason: String },
}

/// Errors that abort a webhook delivery.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Malformed inbound payload: {0}")]
    MalformedPayload(String),

    #[error("Photo URL resolution failed: {0}")]
    UrlResolution(#[source] ChannelError),

    #[error("Failed to persist photo record: {0}")]
    Persistence(#[source] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_wraps_source_message() {
        let err = PipelineError::Persistence(DatabaseError::Query("disk full".into()));
        assert_eq!(
            err.to_string(),
            "Failed to persist photo record: Query failed: disk full"
        );
    }

    #[test]
    fn config_error_names_the_variable() {
        let err = ConfigError::MissingEnvVar("SAFETY_API_KEY".into());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: SAFETY_API_KEY"
        );
    }
}
