//! HTTP client that composes default and per-call request options.
//!
//! The [`Client`] type is the main entry point for sending requests.
//! Use [`ClientBuilder`] or [`Client::new`] with [`ClientOption`]s to
//! configure one.

use crate::{
    request::{Request, RequestParts},
    sink::{dump_request, dump_response, Sink},
    Error, RequestOption, Response, Result,
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// A read-only check run against every finalized request before it is sent.
///
/// Returning an error aborts the call before any network traffic, and the
/// error is handed to the caller unchanged.
pub type RequestValidator = Arc<dyn Fn(&Request) -> Result<()> + Send + Sync>;

/// An HTTP client that replays default options on every call.
///
/// Clients are cheap to clone and safe to share between tasks. Their
/// configuration is fixed once built; every call builds its own private
/// request draft.
///
/// # Examples
///
/// ```no_run
/// use requester::{Client, Code, Error, RequestOption};
/// use http::Method;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder()
///     .default_options([
///         RequestOption::host("https://api.example.com"),
///         RequestOption::header([("User-Agent", "my-app/1.0")]),
///     ])
///     .request_validator(|request| match request.url().scheme() {
///         "https" => Ok(()),
///         _ => Err(Error::new(Code::Unknown, "refusing plain http")),
///     })
///     .build();
///
/// let mut response = client
///     .send([
///         RequestOption::method(Method::POST),
///         RequestOption::path("/users"),
///         RequestOption::json(&CreateUser { name: "Alice".to_string() }),
///     ])
///     .await?;
///
/// let user: User = response.json().await?;
/// println!("Created user {} ({})", user.name, user.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    default_options: Vec<RequestOption>,
    validators: Vec<RequestValidator>,
}

impl Client {
    /// Creates a client from an ordered list of options.
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ClientOption>,
    {
        options
            .into_iter()
            .fold(ClientBuilder::new(), ClientBuilder::option)
            .build()
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Builds and sends one request.
    ///
    /// The client's default options are applied first, then `options`, in
    /// order. The finalized request goes through every validator before the
    /// transport sees it. There is exactly one attempt per call.
    ///
    /// # Errors
    ///
    /// * Build and validator errors are returned unchanged.
    /// * Transport failures (refused connection, timeout, cancellation) are
    ///   [`Code::Unknown`](crate::Code::Unknown) with no status.
    /// * Responses outside `200..=299` are
    ///   [`Code::BadResponseStatus`](crate::Code::BadResponseStatus) carrying
    ///   the status.
    pub async fn send<I>(&self, options: I) -> Result<Response>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let options = self.inner.default_options.iter().cloned().chain(options);
        let request = Request::new(options)?;

        for validator in &self.inner.validators {
            if let Err(e) = validator(&request) {
                tracing::debug!(
                    error = %e,
                    method = %request.method(),
                    url = %request.url(),
                    "Request rejected by validator"
                );
                return Err(e);
            }
        }

        if let Some(sink) = request.request_logger() {
            let dump = dump_request(
                request.method(),
                request.url(),
                request.headers(),
                request.body_bytes(),
            );
            write_dump(sink, &dump, "request");
        }

        let method = request.method().clone();
        let url = request.url().clone();
        let RequestParts {
            inner,
            cancel,
            response_logger,
        } = request.into_parts();

        tracing::debug!(method = %method, url = %url, "Executing HTTP request");

        let start_time = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::unknown("request cancelled")),
            result = self.inner.http_client.execute(inner) => {
                result.map_err(|e| Error::unknown(e.to_string()))
            }
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, method = %method, url = %url, "Request failed");
                return Err(e);
            }
        };

        let status = response.status();
        tracing::info!(
            status = status.as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "Received HTTP response"
        );

        let response = match response_logger {
            Some(sink) => buffer_and_dump(response, &sink, &cancel).await?,
            None => Response::new(response),
        };

        if !status.is_success() {
            if status.is_client_error() {
                tracing::error!(status = status.as_u16(), url = %url, "Client error (4xx)");
            } else if status.is_server_error() {
                tracing::warn!(status = status.as_u16(), url = %url, "Server error (5xx)");
            }
            return Err(Error::bad_status(status));
        }

        Ok(response)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("default_options", &self.inner.default_options.len())
            .field("validators", &self.inner.validators.len())
            .finish()
    }
}

// Dumping needs the whole body, so it is read here and the buffered bytes
// back the returned response. The read stays cancellable.
async fn buffer_and_dump(
    response: reqwest::Response,
    sink: &Sink,
    cancel: &CancellationToken,
) -> Result<Response> {
    let status = response.status();
    let version = response.version();
    let headers = response.headers().clone();
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::unknown("request cancelled")),
        result = response.bytes() => result.map_err(|e| Error::unknown(e.to_string())),
    };
    let body = outcome?;

    let dump = dump_response(version, status, &headers, &body);
    write_dump(sink, &dump, "response");

    Ok(Response::buffered(status, version, headers, body))
}

// A broken sink never fails the call.
fn write_dump(sink: &Sink, dump: &[u8], kind: &'static str) {
    if let Err(e) = sink.write_dump(dump) {
        tracing::warn!(error = %e, kind = kind, "Failed to write wire dump");
    }
}

/// A client configuration step. Applying one cannot fail.
#[derive(Clone)]
pub enum ClientOption {
    /// Replaces the transport.
    HttpClient(reqwest::Client),
    /// Appends options replayed before every call's own options.
    DefaultOptions(Vec<RequestOption>),
    /// Appends a validator.
    RequestValidator(RequestValidator),
}

impl ClientOption {
    /// Uses `client` as the transport instead of a default one.
    pub fn http_client(client: reqwest::Client) -> Self {
        ClientOption::HttpClient(client)
    }

    /// Appends default request options.
    pub fn default_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        ClientOption::DefaultOptions(options.into_iter().collect())
    }

    /// Appends a request validator.
    pub fn request_validator<F>(validator: F) -> Self
    where
        F: Fn(&Request) -> Result<()> + Send + Sync + 'static,
    {
        ClientOption::RequestValidator(Arc::new(validator))
    }
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientOption::HttpClient(client) => f.debug_tuple("HttpClient").field(client).finish(),
            ClientOption::DefaultOptions(options) => {
                f.debug_tuple("DefaultOptions").field(options).finish()
            }
            ClientOption::RequestValidator(_) => f.write_str("RequestValidator(..)"),
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```
/// use requester::{ClientBuilder, RequestOption};
/// use std::time::Duration;
///
/// let client = ClientBuilder::new()
///     .http_client(reqwest::Client::new())
///     .default_options([
///         RequestOption::host("https://api.example.com"),
///         RequestOption::timeout(Duration::from_secs(30)),
///     ])
///     .build();
/// # let _ = client;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    http_client: Option<reqwest::Client>,
    default_options: Vec<RequestOption>,
    validators: Vec<RequestValidator>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with no defaults and no validators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a [`ClientOption`].
    pub fn option(mut self, option: ClientOption) -> Self {
        match option {
            ClientOption::HttpClient(client) => self.http_client = Some(client),
            ClientOption::DefaultOptions(options) => self.default_options.extend(options),
            ClientOption::RequestValidator(validator) => self.validators.push(validator),
        }
        self
    }

    /// Sets the transport. A default `reqwest::Client` is used otherwise.
    pub fn http_client(self, client: reqwest::Client) -> Self {
        self.option(ClientOption::http_client(client))
    }

    /// Appends options replayed before every call's own options.
    pub fn default_options<I>(self, options: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.option(ClientOption::default_options(options))
    }

    /// Appends a validator. Validators run in registration order.
    pub fn request_validator<F>(self, validator: F) -> Self
    where
        F: Fn(&Request) -> Result<()> + Send + Sync + 'static,
    {
        self.option(ClientOption::request_validator(validator))
    }

    /// Builds the configured `Client`.
    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                http_client: self.http_client.unwrap_or_default(),
                default_options: self.default_options,
                validators: self.validators,
            }),
        }
    }
}
