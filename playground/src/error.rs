//! Error types for manifest construction, resolution and emission.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that occur while building, resolving or emitting a [`Manifest`].
///
/// [`Manifest`]: crate::Manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Two services were registered under the same name.
    #[error("service '{0}' is already registered")]
    DuplicateName(String),
    /// A reference names a service that is not part of the manifest.
    #[error("reference to unknown service '{0}'")]
    UnknownServiceReference(String),
    /// A reference names a port the target service never declares.
    #[error("service '{service}' does not declare a port named '{port}'")]
    UnknownPortReference {
        /// Target service.
        service: String,
        /// Missing logical port name.
        port: String,
    },
    /// An artifact or recipe parameter is outside its domain.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// One or more required configuration values are unset.
    #[error("missing required configuration values: {}", .0.join(", "))]
    MissingConfiguration(Vec<String>),
    /// An emitter found nothing to act on.
    #[error("no eligible target for {0}")]
    NoEligibleTarget(&'static str),
    /// A templated string could not be parsed.
    #[error("invalid expression in '{input}': {reason}")]
    InvalidExpression {
        /// The offending string.
        input: String,
        /// Parse failure detail.
        reason: String,
    },
    /// The allocator ran past the last valid port number.
    #[error("no free port at or above {0}")]
    PortsExhausted(u16),
    /// The manifest was written or emitted before the resolution pass ran.
    #[error("manifest contains unresolved expressions")]
    Unresolved,
    /// Filesystem failure while writing an output file.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Serializing an output file failed.
    #[error("failed to serialize {0}: {1}")]
    Serialize(&'static str, #[source] serde_json::Error),
}

/// Convenience alias for results in this crate.
pub type Result<T, E = ManifestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::duplicate(ManifestError::DuplicateName("el".into()), "service 'el' is already registered")]
    #[case::unknown_service(
        ManifestError::UnknownServiceReference("ghost".into()),
        "reference to unknown service 'ghost'"
    )]
    #[case::unknown_port(
        ManifestError::UnknownPortReference { service: "el".into(), port: "grpc".into() },
        "service 'el' does not declare a port named 'grpc'"
    )]
    #[case::missing(
        ManifestError::MissingConfiguration(vec!["A".into(), "B".into()]),
        "missing required configuration values: A, B"
    )]
    fn test_manifest_error_display(#[case] error: ManifestError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
