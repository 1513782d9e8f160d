use std::{error::Error, fmt::Display};

/// Failures the key-table service itself reports, stable across the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceError {
    /// 没有密钥表, 需要先生成密钥
    Uninitialized,

    /// Malformed or out-of-range private-table query.
    InvalidQuery(String),

    /// The query bound was reached; the key epoch has been purged and must
    /// be regenerated before further private queries.
    Exhausted,

    /// Keypair generation could not satisfy the requested parameters.
    Generation(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Uninitialized => f.write_str("no key epoch is initialized"),
            ServiceError::InvalidQuery(s) => f.write_fmt(format_args!("invalid query: {s}")),
            ServiceError::Exhausted => {
                f.write_str("max number of queries reached, the key epoch is purged")
            }
            ServiceError::Generation(s) => {
                f.write_fmt(format_args!("key generation failed: {s}"))
            }
        }
    }
}

impl Error for ServiceError {}

/// A service failure or a failure of the exchange itself.
#[derive(Debug)]
pub enum LinkError {
    Service(ServiceError),
    Transport(std::io::Error),
}

impl LinkError {
    /// The service-level failure, if this is one.
    pub fn service(&self) -> Option<&ServiceError> {
        match self {
            LinkError::Service(e) => Some(e),
            LinkError::Transport(_) => None,
        }
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::Service(e) => Display::fmt(e, f),
            LinkError::Transport(e) => f.write_fmt(format_args!("transport failed: {e}")),
        }
    }
}

impl Error for LinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LinkError::Service(e) => Some(e),
            LinkError::Transport(e) => Some(e),
        }
    }
}

impl From<ServiceError> for LinkError {
    fn from(value: ServiceError) -> Self {
        LinkError::Service(value)
    }
}

impl From<std::io::Error> for LinkError {
    fn from(value: std::io::Error) -> Self {
        LinkError::Transport(value)
    }
}
