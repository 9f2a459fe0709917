use http::StatusCode;
use thiserror::Error;

/// Boxed error type accepted by [`ChainError::other`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The single failure value a chain produces.
///
/// The chain itself never inspects it: the first failure returned by a
/// handler travels up the call stack unchanged unless an upstream handler
/// replaces it, and only the error renderer gives it a meaning.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("request canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("handler panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Other(#[from] BoxError),
}

/// Non-standard "client closed request" status used for canceled requests.
pub const STATUS_CLIENT_CLOSED_REQUEST: u16 = 499;

impl ChainError {
    /// Failure carrying an explicit HTTP status.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error (or message) as an opaque failure.
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }

    /// The status a renderer should answer with for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Canceled => StatusCode::from_u16(STATUS_CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Self::Status { status, .. } => *status,
            Self::Panic(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Look inside a [`ChainError::Other`] for a concrete error type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Other(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
