//! Diagnostic sinks for raw request and response dumps.
//!
//! A [`Sink`] is injected per request through
//! [`RequestOption::request_logger`](crate::RequestOption::request_logger)
//! and [`RequestOption::response_logger`](crate::RequestOption::response_logger).
//! Dumps are written in HTTP/1.1 wire layout so they can be read or diffed
//! like a packet capture.

use http::{HeaderMap, Method, StatusCode, Version};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use url::{Position, Url};

/// A shared, cloneable writer that receives raw wire dumps.
///
/// # Examples
///
/// ```
/// use requester::{RequestOption, Sink};
///
/// let sink = Sink::new(std::io::stderr());
/// let option = RequestOption::request_logger(sink);
/// # let _ = option;
/// ```
#[derive(Clone)]
pub struct Sink {
    writer: Arc<Mutex<dyn Write + Send>>,
}

impl Sink {
    /// Wraps a writer as a sink.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub(crate) fn write_dump(&self, dump: &[u8]) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("sink lock poisoned"))?;
        writer.write_all(dump)?;
        writer.flush()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

/// Renders an outgoing request the way it goes over the wire.
pub(crate) fn dump_request(
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut out = Vec::new();
    let target = &url[Position::BeforePath..Position::AfterQuery];
    let host = &url[Position::BeforeHost..Position::AfterPort];

    out.extend_from_slice(format!("{} {} HTTP/1.1\r\n", method, target).as_bytes());
    out.extend_from_slice(format!("Host: {}\r\n", host).as_bytes());
    write_headers(&mut out, headers);
    out.extend_from_slice(b"\r\n");
    if let Some(body) = body {
        out.extend_from_slice(body);
    }
    out
}

/// Renders a received response in wire layout.
pub(crate) fn dump_response(
    version: Version,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("{:?} {}\r\n", version, status).as_bytes());
    write_headers(&mut out, headers);
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

fn write_headers(out: &mut Vec<u8>, headers: &HeaderMap) {
    for (name, value) in headers {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn request_dump_uses_origin_form_target() {
        let url = Url::parse("http://localhost:8080/items?page=2").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let dump = dump_request(&Method::POST, &url, &headers, Some(b"{\"a\":1}"));

        assert_eq!(
            String::from_utf8(dump).unwrap(),
            "POST /items?page=2 HTTP/1.1\r\n\
             Host: localhost:8080\r\n\
             content-type: application/json\r\n\
             \r\n\
             {\"a\":1}"
        );
    }

    #[test]
    fn response_dump_has_status_line() {
        let dump = dump_response(Version::HTTP_11, StatusCode::NOT_FOUND, &HeaderMap::new(), b"gone");
        assert_eq!(
            String::from_utf8(dump).unwrap(),
            "HTTP/1.1 404 Not Found\r\n\r\ngone"
        );
    }

    #[test]
    fn sink_clones_share_writer() {
        let captured = Captured::default();
        let sink = Sink::new(captured.clone());
        let other = sink.clone();

        sink.write_dump(b"one ").unwrap();
        other.write_dump(b"two").unwrap();

        assert_eq!(&*captured.0.lock().unwrap(), b"one two");
    }
}
