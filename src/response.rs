//! Response wrapper with one-shot body decoding.
//!
//! A [`Response`] owns the body of a successful exchange. The body can be
//! read exactly once, through [`Response::json`], [`Response::xml`],
//! [`Response::bytes`] or [`Response::text`]; any later read returns
//! [`DecodeError::Consumed`].

use crate::DecodeError;
use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;

/// A successful HTTP response.
///
/// # Examples
///
/// ```no_run
/// use requester::{Client, RequestOption};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder().build();
/// let mut response = client
///     .send([
///         RequestOption::host("https://api.example.com"),
///         RequestOption::path("/users/123"),
///     ])
///     .await?;
///
/// println!("Status: {}", response.status());
/// let user: User = response.json().await?;
/// println!("User {}: {}", user.id, user.name);
///
/// // The body is gone now.
/// assert!(response.json::<User>().await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Option<ResponseBody>,
}

#[derive(Debug)]
enum ResponseBody {
    Pending(reqwest::Response),
    Buffered(Bytes),
}

impl Response {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            version: response.version(),
            headers: response.headers().clone(),
            body: Some(ResponseBody::Pending(response)),
        }
    }

    pub(crate) fn buffered(
        status: StatusCode,
        version: Version,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            status,
            version,
            headers,
            body: Some(ResponseBody::Buffered(body)),
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The HTTP version the server answered with.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns `true` while the body has not been read.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Reads the whole body.
    pub async fn bytes(&mut self) -> Result<Bytes, DecodeError> {
        match self.body.take().ok_or(DecodeError::Consumed)? {
            ResponseBody::Pending(response) => Ok(response.bytes().await?),
            ResponseBody::Buffered(bytes) => Ok(bytes),
        }
    }

    /// Reads the whole body as text, replacing invalid UTF-8 sequences.
    pub async fn text(&mut self) -> Result<String, DecodeError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Decodes the body as JSON.
    pub async fn json<T>(&mut self) -> Result<T, DecodeError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Decodes the body as XML.
    pub async fn xml<T>(&mut self) -> Result<T, DecodeError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.bytes().await?;
        Ok(quick_xml::de::from_reader(&bytes[..])?)
    }
}
