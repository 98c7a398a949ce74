//! Request options and the request builder.
//!
//! A request is assembled from an ordered list of [`RequestOption`]s. Each
//! option mutates a [`RequestDraft`]; once every option has been applied the
//! draft is finalized into an immutable [`Request`].
//!
//! Options are applied strictly left to right. Scalar fields (method, host,
//! path, url, body) take the last value written. Query parameters always
//! accumulate. Headers depend on the option: [`RequestOption::header`]
//! replaces the values stored under each key it names, while
//! [`RequestOption::add_header`] appends.

use crate::{sink::Sink, Body, Code, Error, Result};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::{form_urlencoded, Url};

const APPLICATION_JSON: &str = "application/json";
const APPLICATION_XML: &str = "application/xml";
const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

/// The mutable state of a request before it is finalized.
///
/// Custom options built with [`RequestOption::new`] receive a `&mut
/// RequestDraft` and may read or write any field.
#[derive(Debug, Default)]
pub struct RequestDraft {
    /// The HTTP method. `GET` when left unset.
    pub method: Option<Method>,

    /// Scheme and authority, optionally with a path prefix.
    pub host: String,

    /// Appended to `host` as-is; no slashes are added or removed.
    ///
    /// The joined address still goes through URL parsing, which lowercases
    /// the host and resolves `.` and `..` segments.
    pub path: String,

    /// A full URL. When non-empty it wins over `host` and `path`.
    pub url: String,

    /// Request headers.
    pub header: HeaderMap,

    /// Query parameters, encoded in key order at finalize time.
    pub query: BTreeMap<String, Vec<String>>,

    /// The request payload.
    pub body: Body,

    /// Cancellation handle. A fresh, never-cancelled token when unset.
    pub cancel: Option<CancellationToken>,

    /// Point in time after which the transport gives up.
    pub deadline: Option<Instant>,

    /// Receives a dump of the outgoing request.
    pub request_logger: Option<Sink>,

    /// Receives a dump of the received response.
    pub response_logger: Option<Sink>,
}

impl RequestDraft {
    /// Appends a value to a query parameter.
    pub fn append_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.entry(key.into()).or_default().push(value.into());
    }

    fn finalize(self) -> Result<Request> {
        let method = self.method.unwrap_or(Method::GET);

        if self.host.is_empty() && self.url.is_empty() {
            return Err(Error::new(Code::MissingUrl, "no host/url defined"));
        }

        let body = self.body.resolve()?;

        let address = if self.url.is_empty() {
            format!("{}{}", self.host, self.path)
        } else {
            self.url
        };

        let cancel = self.cancel.unwrap_or_default();

        let mut url = Url::parse(&address).map_err(|e| Error::unknown(e.to_string()))?;
        append_query(&mut url, &self.query);

        let mut inner = reqwest::Request::new(method, url);
        inner.headers_mut().extend(self.header);
        *inner.body_mut() = body.map(reqwest::Body::from);
        if let Some(deadline) = self.deadline {
            *inner.timeout_mut() = Some(deadline.saturating_duration_since(Instant::now()));
        }

        Ok(Request {
            inner,
            cancel,
            request_logger: self.request_logger,
            response_logger: self.response_logger,
        })
    }
}

fn append_query(url: &mut Url, query: &BTreeMap<String, Vec<String>>) {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in query {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    let encoded = serializer.finish();
    if encoded.is_empty() {
        return;
    }

    let combined = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{}&{}", existing, encoded),
        _ => encoded,
    };
    url.set_query(Some(&combined));
}

type ApplyFn = dyn Fn(&mut RequestDraft) -> Result<()> + Send + Sync;

/// A named, deferred mutation of a [`RequestDraft`].
///
/// Options are cheap to clone and can be applied any number of times, which
/// is what lets a [`Client`](crate::Client) replay its default options on
/// every call.
///
/// # Examples
///
/// ```
/// use requester::{Request, RequestOption};
/// use http::Method;
///
/// # fn example() -> requester::Result<()> {
/// let request = Request::new([
///     RequestOption::method(Method::POST),
///     RequestOption::host("https://api.example.com"),
///     RequestOption::path("/search"),
///     RequestOption::query([("q", "rust")]),
///     RequestOption::json(&serde_json::json!({ "limit": 10 })),
/// ])?;
///
/// assert_eq!(request.url().as_str(), "https://api.example.com/search?q=rust");
/// assert_eq!(request.headers()["content-type"], "application/json");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Clone)]
pub struct RequestOption {
    apply: Arc<ApplyFn>,
}

impl RequestOption {
    /// Creates an option from a closure over the draft.
    ///
    /// Returning an error aborts the whole build with that error.
    pub fn new<F>(apply: F) -> Self
    where
        F: Fn(&mut RequestDraft) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            apply: Arc::new(apply),
        }
    }

    pub(crate) fn apply(&self, draft: &mut RequestDraft) -> Result<()> {
        (self.apply)(draft)
    }

    /// Sets the HTTP method.
    pub fn method(method: Method) -> Self {
        Self::new(move |draft| {
            draft.method = Some(method.clone());
            Ok(())
        })
    }

    /// Sets the host, e.g. `https://api.example.com`.
    pub fn host(host: impl Into<String>) -> Self {
        let host = host.into();
        Self::new(move |draft| {
            draft.host = host.clone();
            Ok(())
        })
    }

    /// Sets the path appended to the host.
    pub fn path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(move |draft| {
            draft.path = path.clone();
            Ok(())
        })
    }

    /// Sets a full URL, taking precedence over host and path.
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(move |draft| {
            draft.url = url.clone();
            Ok(())
        })
    }

    /// Sets headers, replacing any values already stored under each key.
    ///
    /// Invalid header names or values fail when the option is applied.
    pub fn header<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let parsed: Result<Vec<_>> = pairs
            .into_iter()
            .map(|(name, value)| parse_header(name.as_ref(), value.as_ref()))
            .collect();
        Self::new(move |draft| {
            for (name, value) in parsed.clone()? {
                draft.header.insert(name, value);
            }
            Ok(())
        })
    }

    /// Appends a header value, keeping any values already set for the key.
    pub fn add_header(name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let parsed = parse_header(name.as_ref(), value.as_ref());
        Self::new(move |draft| {
            let (name, value) = parsed.clone()?;
            draft.header.append(name, value);
            Ok(())
        })
    }

    /// Adds query parameters. Repeated calls accumulate values.
    pub fn query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::new(move |draft| {
            for (key, value) in &pairs {
                draft.append_query(key.clone(), value.clone());
            }
            Ok(())
        })
    }

    /// Sets the raw body.
    pub fn body(body: impl Into<Body>) -> Self {
        let body = body.into();
        Self::new(move |draft| {
            draft.body = body.clone();
            Ok(())
        })
    }

    /// Sets a url-encoded form body and its `Content-Type`.
    ///
    /// `value` must serialize as a sequence of pairs, a map, or a struct
    /// whose values are scalars or sequences of scalars. Multi-valued
    /// entries such as `BTreeMap<String, Vec<String>>` repeat the key once
    /// per value. Anything else fails with [`Code::InvalidForm`].
    pub fn form<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let encoded = encode_form(value)
            .map(Body::from)
            .map_err(|e| Error::new(Code::InvalidForm, format!("invalid form: {}", e)));
        Self::encoded_body(encoded, APPLICATION_FORM)
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    ///
    /// A serialization failure surfaces as [`Code::EncodingError`] when the
    /// option is applied.
    pub fn json<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let encoded = serde_json::to_vec(value)
            .map(Body::from)
            .map_err(|e| Error::new(Code::EncodingError, e.to_string()));
        Self::encoded_body(encoded, APPLICATION_JSON)
    }

    /// Sets an XML body and `Content-Type: application/xml`.
    pub fn xml<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let encoded = quick_xml::se::to_string(value)
            .map(Body::from)
            .map_err(|e| Error::new(Code::EncodingError, e.to_string()));
        Self::encoded_body(encoded, APPLICATION_XML)
    }

    // The content type is written when the option runs, so a later header
    // option can still override it.
    fn encoded_body(encoded: Result<Body>, content_type: &'static str) -> Self {
        Self::new(move |draft| {
            let body = encoded.clone()?;
            draft
                .header
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            draft.body = body;
            Ok(())
        })
    }

    /// Attaches a cancellation token.
    pub fn context(token: CancellationToken) -> Self {
        Self::new(move |draft| {
            draft.cancel = Some(token.clone());
            Ok(())
        })
    }

    /// Sets a deadline relative to when the option is applied.
    ///
    /// A timeout too large to add to the current instant sets no deadline.
    pub fn timeout(timeout: Duration) -> Self {
        Self::new(move |draft| {
            draft.deadline = Instant::now().checked_add(timeout);
            Ok(())
        })
    }

    /// Sets an absolute deadline.
    pub fn deadline(deadline: Instant) -> Self {
        Self::new(move |draft| {
            draft.deadline = Some(deadline);
            Ok(())
        })
    }

    /// Dumps the outgoing request to `sink`.
    pub fn request_logger(sink: Sink) -> Self {
        Self::new(move |draft| {
            draft.request_logger = Some(sink.clone());
            Ok(())
        })
    }

    /// Dumps the received response to `sink`.
    pub fn response_logger(sink: Sink) -> Self {
        Self::new(move |draft| {
            draft.response_logger = Some(sink.clone());
            Ok(())
        })
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOption").finish_non_exhaustive()
    }
}

// serde_urlencoded keeps field order but only takes scalar values, so
// multi-valued input is flattened through a JSON value instead.
fn encode_form<T>(value: &T) -> std::result::Result<String, String>
where
    T: Serialize + ?Sized,
{
    let flat_error = match serde_urlencoded::to_string(value) {
        Ok(encoded) => return Ok(encoded),
        Err(e) => e.to_string(),
    };

    let value = serde_json::to_value(value).map_err(|e| e.to_string())?;
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let entries: Vec<(String, &serde_json::Value)> = match &value {
        serde_json::Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        serde_json::Value::Array(pairs) => pairs
            .iter()
            .map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([key, value]) => form_scalar(key)
                    .flatten()
                    .map(|key| (key, value))
                    .ok_or_else(|| flat_error.clone()),
                _ => Err(flat_error.clone()),
            })
            .collect::<std::result::Result<_, _>>()?,
        _ => return Err(flat_error),
    };

    for (key, value) in entries {
        match value {
            serde_json::Value::Array(values) => {
                for value in values {
                    if let Some(value) = form_scalar(value).ok_or_else(|| flat_error.clone())? {
                        serializer.append_pair(&key, &value);
                    }
                }
            }
            value => {
                if let Some(value) = form_scalar(value).ok_or_else(|| flat_error.clone())? {
                    serializer.append_pair(&key, &value);
                }
            }
        }
    }
    Ok(serializer.finish())
}

// `Some(None)` is a null, which is skipped; `None` is not a scalar.
fn form_scalar(value: &serde_json::Value) -> Option<Option<String>> {
    match value {
        serde_json::Value::Null => Some(None),
        serde_json::Value::Bool(b) => Some(Some(b.to_string())),
        serde_json::Value::Number(n) => Some(Some(n.to_string())),
        serde_json::Value::String(s) => Some(Some(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::unknown(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::unknown(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

/// A finalized, transport-ready request.
///
/// Nothing mutates a `Request` once it is built; validators only get a
/// shared reference.
#[derive(Debug)]
pub struct Request {
    inner: reqwest::Request,
    cancel: CancellationToken,
    request_logger: Option<Sink>,
    response_logger: Option<Sink>,
}

impl Request {
    /// Applies `options` in order and finalizes the result.
    ///
    /// # Errors
    ///
    /// Returns the first option error unchanged, [`Code::MissingUrl`] when
    /// neither host nor url was set, [`Code::InvalidBody`] when a reader body
    /// cannot be drained, and [`Code::Unknown`] when the address does not
    /// parse.
    pub fn new<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let mut draft = RequestDraft::default();
        for option in options {
            option.apply(&mut draft)?;
        }
        draft.finalize()
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// The resolved URL, query string included.
    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// The body bytes, if there is a body.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.inner.body().and_then(reqwest::Body::as_bytes)
    }

    /// Time left before the transport gives up, fixed at build time.
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout().copied()
    }

    /// Returns `true` once the attached token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn into_parts(self) -> RequestParts {
        RequestParts {
            inner: self.inner,
            cancel: self.cancel,
            response_logger: self.response_logger,
        }
    }

    pub(crate) fn request_logger(&self) -> Option<&Sink> {
        self.request_logger.as_ref()
    }
}

pub(crate) struct RequestParts {
    pub(crate) inner: reqwest::Request,
    pub(crate) cancel: CancellationToken,
    pub(crate) response_logger: Option<Sink>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{self, Serializer};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(ser::Error::custom("refusing to serialize"))
        }
    }

    struct BrokenReader;

    impl std::io::Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn missing_host_and_url_fails() {
        let err = Request::new([RequestOption::path("/items")]).unwrap_err();
        assert_eq!(err.code(), Code::MissingUrl);

        let err = Request::new(Vec::<RequestOption>::new()).unwrap_err();
        assert_eq!(err.code(), Code::MissingUrl);
    }

    #[test]
    fn defaults_to_get() {
        let request = Request::new([RequestOption::host("http://example.com")]).unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert!(request.body_bytes().is_none());
        assert!(request.timeout().is_none());
        assert!(!request.is_cancelled());
    }

    #[test]
    fn host_and_path_are_concatenated_verbatim() {
        let request = Request::new([
            RequestOption::host("http://example.com/v1"),
            RequestOption::path("/items"),
        ])
        .unwrap();
        assert_eq!(request.url().as_str(), "http://example.com/v1/items");

        let request = Request::new([
            RequestOption::host("http://example.com/"),
            RequestOption::path("/items"),
        ])
        .unwrap();
        assert_eq!(request.url().as_str(), "http://example.com//items");
    }

    #[test]
    fn url_wins_over_host_in_any_order() {
        let before = Request::new([
            RequestOption::url("http://other.test/x"),
            RequestOption::host("http://example.com"),
            RequestOption::path("/items"),
        ])
        .unwrap();
        let after = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::path("/items"),
            RequestOption::url("http://other.test/x"),
        ])
        .unwrap();

        assert_eq!(before.url().as_str(), "http://other.test/x");
        assert_eq!(after.url().as_str(), "http://other.test/x");
    }

    #[test]
    fn later_scalar_options_win() {
        let request = Request::new([
            RequestOption::method(Method::POST),
            RequestOption::host("http://a.test"),
            RequestOption::body("first"),
            RequestOption::method(Method::PUT),
            RequestOption::host("http://b.test"),
            RequestOption::body("second"),
        ])
        .unwrap();

        assert_eq!(request.method(), &Method::PUT);
        assert_eq!(request.url().host_str(), Some("b.test"));
        assert_eq!(request.body_bytes(), Some(&b"second"[..]));
    }

    #[test]
    fn query_parameters_accumulate() {
        let request = Request::new([
            RequestOption::url("http://example.com/search?z=0"),
            RequestOption::query([("a", "1")]),
            RequestOption::query([("b", "x y"), ("a", "2")]),
        ])
        .unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://example.com/search?z=0&a=1&a=2&b=x+y"
        );
    }

    #[test]
    fn query_without_existing_query_string() {
        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::path("/search"),
            RequestOption::query([("q", "rust")]),
        ])
        .unwrap();

        assert_eq!(request.url().query(), Some("q=rust"));
    }

    #[test]
    fn header_overwrites_and_add_header_appends() {
        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::header([("x-tag", "one")]),
            RequestOption::header([("x-tag", "two")]),
            RequestOption::add_header("x-multi", "a"),
            RequestOption::add_header("x-multi", "b"),
        ])
        .unwrap();

        let tags: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, ["two"]);
        let multi: Vec<_> = request.headers().get_all("x-multi").iter().collect();
        assert_eq!(multi, ["a", "b"]);
    }

    #[test]
    fn invalid_header_fails_on_apply() {
        let err = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::header([("bad header", "value")]),
        ])
        .unwrap_err();
        assert_eq!(err.code(), Code::Unknown);
        assert!(err.message().starts_with("Invalid header name"));
    }

    #[test]
    fn json_sets_content_type_and_later_header_wins() {
        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::json(&serde_json::json!({ "id": 7 })),
        ])
        .unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(request.body_bytes(), Some(&br#"{"id":7}"#[..]));

        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::json(&serde_json::json!({ "id": 7 })),
            RequestOption::header([("Content-Type", "application/vnd.api+json")]),
        ])
        .unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], "application/vnd.api+json");
    }

    #[test]
    fn xml_sets_content_type() {
        #[derive(Serialize)]
        struct Note {
            title: String,
        }

        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::xml(&Note {
                title: "hi".to_string(),
            }),
        ])
        .unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], APPLICATION_XML);
        assert_eq!(request.body_bytes(), Some(&b"<Note><title>hi</title></Note>"[..]));
    }

    #[test]
    fn encoding_failures_are_encoding_errors() {
        let err = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::json(&Unserializable),
        ])
        .unwrap_err();
        assert_eq!(err.code(), Code::EncodingError);

        let err = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::xml(&Unserializable),
        ])
        .unwrap_err();
        assert_eq!(err.code(), Code::EncodingError);
    }

    #[test]
    fn form_encodes_pairs() {
        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::form(&vec![("name", "a b"), ("tag", "x"), ("tag", "y")]),
        ])
        .unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], APPLICATION_FORM);
        assert_eq!(request.body_bytes(), Some(&b"name=a+b&tag=x&tag=y"[..]));
    }

    #[test]
    fn form_rejects_non_mapping_values() {
        let err = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::form(&42),
        ])
        .unwrap_err();
        assert_eq!(err.code(), Code::InvalidForm);
    }

    #[test]
    fn form_repeats_keys_for_multi_valued_maps() {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        fields.insert("tag".to_string(), vec!["x".to_string(), "y".to_string()]);

        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::form(&fields),
        ])
        .unwrap();
        assert_eq!(request.body_bytes(), Some(&b"tag=x&tag=y"[..]));

        fields.insert("a b".to_string(), vec!["1".to_string()]);
        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::form(&fields),
        ])
        .unwrap();
        assert_eq!(request.body_bytes(), Some(&b"a+b=1&tag=x&tag=y"[..]));
    }

    #[test]
    fn form_accepts_structs_with_sequence_fields() {
        #[derive(Serialize)]
        struct Search {
            page: u32,
            q: String,
            tag: Vec<&'static str>,
            cursor: Option<String>,
        }

        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::form(&Search {
                page: 2,
                q: "rust".to_string(),
                tag: vec!["web", "http"],
                cursor: None,
            }),
        ])
        .unwrap();
        assert_eq!(
            request.body_bytes(),
            Some(&b"page=2&q=rust&tag=web&tag=http"[..])
        );
    }

    #[test]
    fn form_rejects_nested_values() {
        let err = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::form(&serde_json::json!({ "outer": { "inner": 1 } })),
        ])
        .unwrap_err();
        assert_eq!(err.code(), Code::InvalidForm);
    }

    #[test]
    fn address_is_normalized_by_url_parsing() {
        let request = Request::new([
            RequestOption::host("http://Example.com"),
            RequestOption::path("/a/./b/../c"),
        ])
        .unwrap();
        assert_eq!(request.url().as_str(), "http://example.com/a/c");
    }

    #[test]
    fn unrepresentable_timeout_leaves_no_deadline() {
        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::timeout(Duration::MAX),
        ])
        .unwrap();
        assert!(request.timeout().is_none());
    }

    #[test]
    fn unreadable_body_is_invalid_body() {
        let err = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::body(Body::reader(BrokenReader)),
        ])
        .unwrap_err();
        assert_eq!(err.code(), Code::InvalidBody);
    }

    #[test]
    fn malformed_address_is_unknown() {
        let err = Request::new([RequestOption::host("not a url")]).unwrap_err();
        assert_eq!(err.code(), Code::Unknown);
        assert!(err.status().is_none());
    }

    #[test]
    fn failing_option_stops_composition() {
        let applied = Arc::new(AtomicUsize::new(0));
        let counter = applied.clone();

        let err = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::new(|_| Err(Error::new(Code::InvalidBody, "nope"))),
            RequestOption::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ])
        .unwrap_err();

        assert_eq!(err, Error::new(Code::InvalidBody, "nope"));
        assert_eq!(applied.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn timeout_and_context_are_carried() {
        let token = CancellationToken::new();
        let request = Request::new([
            RequestOption::host("http://example.com"),
            RequestOption::timeout(Duration::from_secs(30)),
            RequestOption::context(token.clone()),
        ])
        .unwrap();

        let timeout = request.timeout().unwrap();
        assert!(timeout <= Duration::from_secs(30));
        assert!(timeout > Duration::from_secs(25));

        token.cancel();
        assert!(request.is_cancelled());
    }
}
