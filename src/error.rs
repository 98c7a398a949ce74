//! Error taxonomy for request construction and execution.
//!
//! Every failure produced while building a request, validating it, or
//! executing it is an [`Error`] carrying one [`Code`] from a small, closed
//! set. Callers inspect failures through [`Error::code`] and
//! [`Error::status`] (or the free functions [`code`] and [`status_code`]
//! when all they hold is a `dyn Error`) rather than matching on messages.
//!
//! Response decoding is the one exception: [`DecodeError`] passes the
//! underlying format error through unchanged, since a decode failure says
//! something about the caller's target type, not about the transport.

use http::StatusCode;
use std::fmt;

/// The closed set of failure classes.
///
/// The numeric values are stable and can be exposed over FFI or logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Code {
    /// A failure that fits no other class: transport errors, cancelled
    /// requests, malformed addresses or headers.
    #[default]
    Unknown = 0,
    /// The request body could not be resolved into bytes.
    InvalidBody = 1,
    /// The server answered with a status outside `200..=299`.
    BadResponseStatus = 2,
    /// A JSON or XML body could not be serialized.
    EncodingError = 3,
    /// A form body could not be url-encoded.
    InvalidForm = 4,
    /// Neither a host nor a full URL was configured.
    MissingUrl = 5,
}

impl Code {
    /// Returns the stable numeric value of this code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    fn as_str(self) -> &'static str {
        match self {
            Code::Unknown => "unknown",
            Code::InvalidBody => "invalid_body",
            Code::BadResponseStatus => "bad_response_status",
            Code::EncodingError => "encoding_error",
            Code::InvalidForm => "invalid_form",
            Code::MissingUrl => "missing_url",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified request failure.
///
/// Built once at the point of failure and handed back to the caller
/// untouched. `status` is only present for [`Code::BadResponseStatus`].
///
/// # Examples
///
/// ```
/// use requester::{Code, Error};
///
/// let err = Error::new(Code::MissingUrl, "no host/url defined");
/// assert_eq!(err.code(), Code::MissingUrl);
/// assert!(err.status().is_none());
/// assert_eq!(
///     err.to_string(),
///     "request error: code = missing_url message = no host/url defined"
/// );
/// ```
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("request error: code = {code} message = {message}")]
pub struct Error {
    code: Code,
    status: Option<StatusCode>,
    message: String,
}

impl Error {
    /// Creates an error with no transport status attached.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            status: None,
            message: message.into(),
        }
    }

    /// Creates a [`Code::BadResponseStatus`] error for a non-2xx response.
    pub fn bad_status(status: StatusCode) -> Self {
        Self {
            code: Code::BadResponseStatus,
            status: Some(status),
            message: format!("bad status code ({})", status.as_u16()),
        }
    }

    pub(crate) fn unknown(message: impl Into<String>) -> Self {
        Self::new(Code::Unknown, message)
    }

    /// The failure class.
    pub fn code(&self) -> Code {
        self.code
    }

    /// The HTTP status that caused the failure, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Extracts the taxonomy code from any error.
///
/// Returns [`Code::Unknown`] when `err` is `None` or is not an [`Error`].
///
/// # Examples
///
/// ```
/// use requester::{code, Code, Error};
///
/// let err = Error::new(Code::InvalidForm, "bad form");
/// assert_eq!(code(Some(&err)), Code::InvalidForm);
///
/// let io = std::io::Error::other("boom");
/// assert_eq!(code(Some(&io)), Code::Unknown);
/// assert_eq!(code(None), Code::Unknown);
/// ```
pub fn code(err: Option<&(dyn std::error::Error + 'static)>) -> Code {
    err.and_then(|e| e.downcast_ref::<Error>())
        .map(Error::code)
        .unwrap_or_default()
}

/// Extracts the carried HTTP status from any error, if there is one.
pub fn status_code(err: Option<&(dyn std::error::Error + 'static)>) -> Option<StatusCode> {
    err.and_then(|e| e.downcast_ref::<Error>())
        .and_then(Error::status)
}

/// A failure while decoding a response body.
///
/// The underlying format or read error is carried as-is.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The body was not valid JSON for the target type.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The body was not valid XML for the target type.
    #[error(transparent)]
    Xml(#[from] quick_xml::de::DeError),

    /// Reading the body from the connection failed.
    #[error(transparent)]
    Read(#[from] reqwest::Error),

    /// The body has already been read by an earlier call.
    #[error("response body already consumed")]
    Consumed,
}

/// A specialized `Result` type for building and sending requests.
pub type Result<T> = std::result::Result<T, Error>;
