use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service could not be reached, or the connection dropped.
    Network,
    /// The credential was missing or rejected.
    Unauthorized,
    /// The model provider is rate limited, or the quota is exhausted.
    RateLimitExceeded,
    /// The content is moderated.
    Moderated,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Moderated => write!(f, "Content moderated"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
