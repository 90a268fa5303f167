use bytes::Bytes;
use ferry::deserializer::{Json, Text};
use ferry::{Client, Immediate, Method, Routing};
use futures::StreamExt;
use serde::Deserialize;
use std::error::Error;

/// The slice of httpbin.org this demo talks to
enum HttpBin {
    Get { page: u32 },
    Post { name: String },
    Delay { seconds: u32 },
}

impl Routing for HttpBin {
    fn base_path(&self) -> &str {
        "https://httpbin.org/"
    }

    fn method(&self) -> Method {
        match self {
            HttpBin::Get { .. } | HttpBin::Delay { .. } => Method::GET,
            HttpBin::Post { .. } => Method::POST,
        }
    }

    fn path(&self) -> String {
        match self {
            HttpBin::Get { .. } => "/get".to_string(),
            HttpBin::Post { .. } => "/post".to_string(),
            HttpBin::Delay { seconds } => format!("/delay/{}", seconds),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        match self {
            HttpBin::Post { .. } => {
                vec![("Content-Type".to_string(), "application/json".to_string())]
            }
            _ => Vec::new(),
        }
    }

    fn parameters(&self) -> Vec<(String, String)> {
        match self {
            HttpBin::Get { page } => vec![("page".to_string(), page.to_string())],
            _ => Vec::new(),
        }
    }

    fn body(&self) -> Option<Bytes> {
        match self {
            HttpBin::Post { name } => Some(serde_json::json!({ "name": name }).to_string().into()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Echo {
    url: String,
    #[serde(default)]
    json: Option<serde_json::Value>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let client = Client::builder().user_agent("ferry-demo/0.1")?.build()?;

    println!("=== Async ===");
    let echo = client.route(&HttpBin::Get { page: 2 }, Json::<Echo>::new())?.await?;
    println!("Requested: {}", echo.url);

    println!("\n=== Stream ===");
    let request = HttpBin::Post { name: "ferry".to_string() }.to_request()?;
    let mut stream = client.stream(request, Json::<Echo>::new());
    if let Some(echo) = stream.next().await {
        println!("Echoed body: {:?}", echo?.json);
    }

    println!("\n=== Callback ===");
    let (tx, rx) = tokio::sync::oneshot::channel();
    let request = HttpBin::Get { page: 3 }.to_request()?;
    client.enqueue(request, Text, Immediate, move |result| {
        let _ = tx.send(result.map(|body| body.len()));
    });
    println!("Body length: {}", rx.await??);

    println!("\n=== Cancellation ===");
    let pending = client.route(&HttpBin::Delay { seconds: 5 }, Text)?;
    let handle = pending.cancel_handle();
    handle.cancel();
    match pending.await {
        Err(e) if e.is_cancelled() => println!("Request cancelled"),
        other => println!("Unexpected: {:?}", other.map(|body| body.len())),
    }

    Ok(())
}
