//! Request body representations.

use crate::{Code, Error, Result};
use bytes::Bytes;
use std::fmt;
use std::io::Read;
use std::sync::{Arc, Mutex};

/// The payload of a request under construction.
///
/// This is a closed set: a body is either absent, raw bytes, text, or a
/// reader that is drained when the request is finalized. Structured
/// payloads go through [`RequestOption::json`](crate::RequestOption::json),
/// [`RequestOption::xml`](crate::RequestOption::xml) or
/// [`RequestOption::form`](crate::RequestOption::form), which encode into
/// [`Body::Bytes`].
///
/// # Examples
///
/// ```
/// use requester::Body;
///
/// let text: Body = "hello".into();
/// let raw: Body = vec![1u8, 2, 3].into();
/// let stream = Body::reader(std::io::Cursor::new(b"streamed".to_vec()));
/// assert!(Body::default().is_empty());
/// # let _ = (text, raw, stream);
/// ```
#[derive(Clone, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes.
    Bytes(Bytes),
    /// UTF-8 text.
    Text(String),
    /// A readable stream, drained once at finalize time.
    ///
    /// Clones share the same reader, so a reader body replayed from a
    /// client default is only non-empty on its first use.
    Reader(Arc<Mutex<dyn Read + Send>>),
}

impl Body {
    /// Wraps a reader as a body.
    ///
    /// The reader is drained with blocking reads when the request is
    /// built, on whatever thread calls [`Request::new`](crate::Request::new)
    /// or [`Client::send`](crate::Client::send). Use it for in-memory or
    /// otherwise fast sources; read slow sources into [`Body::Bytes`] first,
    /// e.g. from `tokio::task::spawn_blocking`.
    pub fn reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Body::Reader(Arc::new(Mutex::new(reader)))
    }

    /// Returns `true` for [`Body::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Resolves the body into the bytes handed to the transport.
    ///
    /// `None` means the request carries no body at all.
    pub(crate) fn resolve(self) -> Result<Option<Bytes>> {
        match self {
            Body::Empty => Ok(None),
            Body::Bytes(bytes) => Ok(Some(bytes)),
            Body::Text(text) => Ok(Some(Bytes::from(text))),
            Body::Reader(reader) => {
                let mut reader = reader
                    .lock()
                    .map_err(|_| Error::new(Code::InvalidBody, "body reader lock poisoned"))?;
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).map_err(|e| {
                    Error::new(Code::InvalidBody, format!("failed to read body: {}", e))
                })?;
                Ok(Some(Bytes::from(buf)))
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Body::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_owned())
    }
}
