use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Envelope construction or encoding of a value whose type has no registry entry.
    #[error("type {type_name} is not registered")]
    UnregisteredType { type_name: String },

    /// Wire identifier that no descriptor answers to.
    #[error("unknown type identifier \"{}\"", .0)]
    UnknownIdentifier(String),

    /// Wire record that is not a two-field envelope.
    #[error("malformed envelope: {}", .0)]
    MalformedEnvelope(String),

    /// Value shape disagrees with the kind resolved from the identifier.
    #[error("type mismatch for \"{identifier}\": {reason}")]
    TypeMismatch { identifier: String, reason: String },

    #[error("json syntax: {}", .0)]
    Syntax(#[from] serde_json::Error),

    #[error("ron: {}", .0)]
    Ron(String),
}

impl Error {
    pub(crate) fn mismatch(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::TypeMismatch {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedEnvelope(reason.into())
    }
}
