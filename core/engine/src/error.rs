//! Error type shared by the capture control layer and its adapters.

use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error classes surfaced by the capture control layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network unreachable, timeout, or a non-2xx response without an `{error}` body.
    Transport,
    /// Non-2xx response carrying `{error}`; the message is the server text verbatim.
    Application,
    /// A success response that is missing or mistyping the expected fields.
    MalformedResponse,
    /// Local input rejected before reaching the network.
    InvalidInput,
    Config,
}

#[derive(Debug, Clone)]
pub struct CaptureError {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

impl CaptureError {
    pub fn new<T>(kind: ErrorKind, message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport<T: Into<Cow<'static, str>>>(message: T) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn application<T: Into<Cow<'static, str>>>(message: T) -> Self {
        Self::new(ErrorKind::Application, message)
    }

    pub fn malformed<T: Into<Cow<'static, str>>>(message: T) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn invalid_input<T: Into<Cow<'static, str>>>(message: T) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn config<T: Into<Cow<'static, str>>>(message: T) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Malformed responses are reported the same way as transport failures.
    pub fn is_transport_class(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport | ErrorKind::MalformedResponse)
    }
}

impl Display for CaptureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CaptureError {}

pub type CaptureResult<T> = Result<T, CaptureError>;
