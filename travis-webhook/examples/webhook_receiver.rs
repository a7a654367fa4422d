//! Minimal webhook receiver that verifies Travis CI notifications.
//!
//! Listens on `127.0.0.1:8080`, authenticates every request against the
//! published Travis CI key and logs the decoded build outcome.
//!
//! # Running this example
//!
//! ```bash
//! RUST_LOG=travis_webhook=debug cargo run --example webhook_receiver
//! ```
//!
//! Set `TRAVIS_WEBHOOK_CONFIG` to a TOML file to override the key endpoint:
//!
//! ```toml
//! config_url = "https://api.travis-ci.com/config"
//! timeout_secs = 10
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::{env, fs, sync::Arc};

use http::{Request, StatusCode};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use travis_webhook::{Color, Payload, VerifierConfig, WebhookError, WebhookVerifier};

const LISTEN_ADDR: &str = "127.0.0.1:8080";
const MAX_BODY: usize = 1 << 20;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn load_config() -> Result<VerifierConfig, BoxError> {
    match env::var("TRAVIS_WEBHOOK_CONFIG") {
        Ok(path) => Ok(VerifierConfig::from_toml(&fs::read_to_string(path)?)?),
        Err(_) => Ok(VerifierConfig::default()),
    }
}

/// Reads one HTTP/1.1 request. Only `Content-Length` bodies are supported.
async fn read_request(stream: &mut TcpStream) -> Result<Request<Vec<u8>>, BoxError> {
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let mut parts = line.split_whitespace();
    let method = parts.next().ok_or("empty request line")?;
    let target = parts.next().ok_or("missing request target")?;

    let mut builder = Request::builder().method(method).uri(target);
    let mut content_length = 0usize;
    loop {
        line.clear();
        reader.read_line(&mut line).await?;
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse()?;
            }
            builder = builder.header(name, value);
        }
    }

    if content_length > MAX_BODY {
        return Err("request body too large".into());
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;
    Ok(builder.body(body)?)
}

fn color_for(payload: &Payload) -> Color {
    if payload.passed() || payload.fixed() {
        Color::Passed
    } else if payload.pending() {
        Color::InProgress
    } else if payload.canceled() {
        Color::Cancel
    } else {
        Color::Fail
    }
}

fn status_for(error: &WebhookError) -> StatusCode {
    match error {
        WebhookError::WrongMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
        WebhookError::Unauthorized
        | WebhookError::MissingHeader(_)
        | WebhookError::DecodeSignature(_) => StatusCode::UNAUTHORIZED,
        e if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        WebhookError::DecodeConfiguration(_)
        | WebhookError::InvalidPublicKey
        | WebhookError::InvalidConfig(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    }
}

async fn handle(verifier: &WebhookVerifier, mut stream: TcpStream) {
    let status = match read_request(&mut stream).await {
        Ok(request) => match verifier.authenticate_and_decode(&request).await {
            Ok(payload) => {
                let color = color_for(&payload);
                info!(
                    id = ?payload.id,
                    event = ?payload.event_type,
                    branch = ?payload.branch,
                    status = ?payload.status_message,
                    color = color.value(),
                    "build notification accepted"
                );
                StatusCode::OK
            }
            Err(e) => {
                warn!(error = %e, "webhook rejected");
                status_for(&e)
            }
        },
        Err(e) => {
            warn!(error = %e, "malformed request");
            StatusCode::BAD_REQUEST
        }
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    let _ = stream.write_all(response.as_bytes()).await;
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = load_config()?;
    let verifier = Arc::new(WebhookVerifier::from_config(&config)?);
    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    println!("Listening on http://{LISTEN_ADDR} (key from {})", config.config_url);

    loop {
        let (stream, peer) = listener.accept().await?;
        let verifier = Arc::clone(&verifier);
        tokio::spawn(async move {
            tracing::debug!(%peer, "connection accepted");
            handle(&verifier, stream).await;
        });
    }
}
