use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use ferry::deserializer::Raw;
use ferry::{ChannelExecutor, Client, Method, Request, Response};
use futures::StreamExt;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(about = "Send an HTTP request and choose how the result comes back")]
#[command(version)]
struct Cli {
    /// HTTP method to use
    #[arg(short, long, default_value = "get")]
    method: MethodArg,

    /// URL to request
    #[arg(value_name = "URL")]
    url: String,

    /// Request headers (format: "Name: Value")
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Query parameters (format: "name=value")
    #[arg(short = 'q', long = "query")]
    parameters: Vec<String>,

    /// Request body
    #[arg(short, long)]
    body: Option<String>,

    /// Content type for the request body
    #[arg(long, default_value = "application/json")]
    content_type: String,

    /// Timeout in seconds
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    /// How the result is delivered
    #[arg(short, long, default_value = "async")]
    style: Style,

    /// Fail on responses outside 2xx and 3xx
    #[arg(long)]
    fail: bool,

    /// Show response headers
    #[arg(long)]
    show_headers: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy)]
enum MethodArg {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl From<MethodArg> for Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Get => Method::GET,
            MethodArg::Post => Method::POST,
            MethodArg::Put => Method::PUT,
            MethodArg::Patch => Method::PATCH,
            MethodArg::Delete => Method::DELETE,
            MethodArg::Head => Method::HEAD,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Style {
    Blocking,
    Callback,
    Async,
    Stream,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
    Headers,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    let client = Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))?
        .runtime(runtime.handle().clone())
        .validate_status(cli.fail)
        .build()?;

    let request = build_request(&cli)?;
    tracing::debug!(style = ?cli.style, "dispatching");

    let response = match cli.style {
        Style::Blocking => client.blocking(request, Raw),
        Style::Callback => {
            let (executor, executor_loop) = ChannelExecutor::channel();
            let (tx, rx) = std::sync::mpsc::channel();
            client.enqueue(request, Raw, executor, move |result| {
                let _ = tx.send(result);
            });
            // the executor was moved into the dispatch, so the loop ends after one callback
            executor_loop.run();
            rx.recv().context("dispatch ended without a result")?
        }
        Style::Async => runtime.block_on(client.send(request, Raw)),
        Style::Stream => {
            let mut stream = client.stream(request, Raw);
            runtime
                .block_on(stream.next())
                .context("stream ended without a result")?
        }
    }?;

    print_response(&response, &cli)
}

fn build_request(cli: &Cli) -> anyhow::Result<Request> {
    let mut builder = Request::builder()
        .method(cli.method.into())
        .url(cli.url.as_str());

    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("invalid header {:?}, expected \"Name: Value\"", header))?;
        builder = builder.header(name.trim(), value.trim());
    }

    for parameter in &cli.parameters {
        let (name, value) = parameter
            .split_once('=')
            .with_context(|| {
                format!("invalid query parameter {:?}, expected name=value", parameter)
            })?;
        builder = builder.parameter(name, value);
    }

    if let Some(body) = &cli.body {
        builder = builder
            .header("Content-Type", &cli.content_type)
            .body(body.clone());
    }

    Ok(builder.build()?)
}

fn colored_status(response: &Response) -> colored::ColoredString {
    let status = response.status().to_string();
    if response.is_success() {
        status.green()
    } else if response.is_redirect() {
        status.yellow()
    } else {
        status.red()
    }
}

fn print_response(response: &Response, cli: &Cli) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Text => {
            if cli.show_headers {
                println!("Status: {}", colored_status(response));
                println!("Headers:");
                for (name, value) in response.headers() {
                    println!("  {}: {}", name.as_str().cyan(), value.to_str().unwrap_or(""));
                }
                println!();
            }
            println!("{}", String::from_utf8_lossy(response.body()));
        }
        OutputFormat::Json => {
            let headers: serde_json::Map<String, serde_json::Value> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (name.to_string(), value.to_str().unwrap_or("").into())
                })
                .collect();

            let body = match serde_json::from_slice::<serde_json::Value>(response.body()) {
                Ok(json) => json,
                Err(_) => String::from_utf8_lossy(response.body()).into_owned().into(),
            };

            let output = serde_json::json!({
                "status": response.status().as_u16(),
                "url": response.url().as_str(),
                "headers": headers,
                "body": body,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Headers => {
            println!("Status: {}", colored_status(response));
            for (name, value) in response.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or(""));
            }
        }
    }

    Ok(())
}
