//! Basic example demonstrating option composition against a public API.
//!
//! This example shows how to:
//! - Create a client with default options and a validator
//! - Make GET requests with query parameters
//! - Make POST requests with a JSON body
//! - Dump the raw exchange to stderr
//! - Inspect error codes
//!
//! Run with: `cargo run --example basic_request`

use http::Method;
use requester::{Client, Code, Error, RequestOption, Sink};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("requester=debug,basic_request=info")
        .init();

    let client = Client::builder()
        .default_options([
            RequestOption::host("https://jsonplaceholder.typicode.com"),
            RequestOption::header([("User-Agent", "requester-demo/0.1")]),
            RequestOption::timeout(Duration::from_secs(30)),
        ])
        .request_validator(|request| match request.url().scheme() {
            "https" => Ok(()),
            scheme => Err(Error::new(
                Code::Unknown,
                format!("refusing {} request", scheme),
            )),
        })
        .build();

    println!("=== GET Request Example ===");
    let mut response = client.send([RequestOption::path("/posts/1")]).await?;
    let post: Post = response.json().await?;
    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!("Status code: {}", response.status());
    println!();

    println!("=== GET With Query Example ===");
    let mut response = client
        .send([
            RequestOption::path("/posts"),
            RequestOption::query([("userId", "1")]),
        ])
        .await?;
    let posts: Vec<Post> = response.json().await?;
    println!("User 1 has {} posts", posts.len());
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };
    let mut response = client
        .send([
            RequestOption::method(Method::POST),
            RequestOption::path("/posts"),
            RequestOption::json(&new_post),
            RequestOption::request_logger(Sink::new(std::io::stderr())),
        ])
        .await?;
    let created: Post = response.json().await?;
    println!("Created post ID: {}", created.id);
    println!("Content-Type: {:?}", response.header("content-type"));
    println!();

    println!("=== Error Example ===");
    match client.send([RequestOption::path("/does-not-exist")]).await {
        Ok(response) => println!("Unexpected success: {}", response.status()),
        Err(e) if e.code() == Code::BadResponseStatus => {
            println!("Bad status: {:?}", e.status());
        }
        Err(e) => println!("Other error: {}", e),
    }

    Ok(())
}
