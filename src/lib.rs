//! # Requester - composable HTTP requests with a small error taxonomy
//!
//! Requester builds HTTP requests out of independent, named options and
//! sends them with a single attempt through a shared `reqwest` client.
//! Every failure, from a missing URL to a 404, comes back as one
//! [`Error`] type carrying a [`Code`] from a closed set.
//!
//! ## Quick Start
//!
//! ```no_run
//! use requester::{Client, RequestOption};
//! use serde::{Deserialize, Serialize};
//! use http::Method;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Every call starts from these options.
//!     let client = Client::builder()
//!         .default_options([RequestOption::host("https://api.example.com")])
//!         .build();
//!
//!     // GET /users/123
//!     let mut response = client.send([RequestOption::path("/users/123")]).await?;
//!     let user: User = response.json().await?;
//!     println!("User: {}", user.name);
//!
//!     // POST /users with a JSON body
//!     let new_user = CreateUser {
//!         name: "Alice".to_string(),
//!         email: "alice@example.com".to_string(),
//!     };
//!     let mut created = client
//!         .send([
//!             RequestOption::method(Method::POST),
//!             RequestOption::path("/users"),
//!             RequestOption::json(&new_user),
//!         ])
//!         .await?;
//!     let created: User = created.json().await?;
//!     println!("Created user with ID: {}", created.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Option ordering
//!
//! Options apply left to right, client defaults first. Scalar settings
//! (method, host, path, url, body) are last-writer-wins; query parameters
//! accumulate; [`RequestOption::header`] replaces per key while
//! [`RequestOption::add_header`] appends. Body options such as
//! [`RequestOption::json`] set `Content-Type` when they run, so a later
//! header option can still override it.
//!
//! ## Error Handling
//!
//! ```no_run
//! use requester::{Client, Code, RequestOption};
//!
//! # async fn example() {
//! # let client = Client::builder().build();
//! match client.send([RequestOption::url("https://api.example.com/x")]).await {
//!     Ok(response) => println!("Success: {}", response.status()),
//!     Err(e) if e.code() == Code::BadResponseStatus => {
//!         eprintln!("Server said {:?}", e.status());
//!     }
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! # }
//! ```
//!
//! Retries are deliberately left to the caller: the code and status carried
//! by [`Error`] are enough to drive an external policy.

mod body;
mod client;
mod error;
mod request;
mod response;
mod sink;

pub use body::Body;
pub use client::{Client, ClientBuilder, ClientOption, RequestValidator};
pub use error::{code, status_code, Code, DecodeError, Error, Result};
pub use request::{Request, RequestDraft, RequestOption};
pub use response::Response;
pub use sink::Sink;
