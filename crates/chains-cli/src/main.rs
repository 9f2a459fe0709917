use std::error::Error;
use std::sync::Arc;

use bytes::Bytes;
use chains_core::middleware::{CatchPanic, SecurityConfig, Trace, check_context};
use chains_core::{Chain, ChainError, Context, JsonErrorRenderer, Next, Request, ResponseWriter};
use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;

type BoxError = Box<dyn Error + Send + Sync>;

/// Demo settings. Every field is optional in the JSON file.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    log_level: String,
    api_key: String,
    expose_internal_errors: bool,
    security: SecurityConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            api_key: "demo-key".to_string(),
            expose_internal_errors: false,
            security: SecurityConfig {
                max_body_size: 64,
                ..SecurityConfig::default()
            },
        }
    }
}

/// First argument, if any, is a JSON config file.
fn load_config() -> Result<DemoConfig, BoxError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(DemoConfig::default()),
    }
}

fn hello(
    cx: &Context,
    w: &mut ResponseWriter,
    req: &Request,
    _next: Next<'_>,
) -> Result<(), ChainError> {
    cx.check()?;
    if req.uri().path() == "/boom" {
        panic!("boom requested");
    }
    let name = req
        .uri()
        .query()
        .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("name=")))
        .unwrap_or("world");

    w.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    w.write_body(format!("hello, {name}").as_bytes());
    Ok(())
}

fn build_chain(config: &DemoConfig) -> Chain {
    let api_key = config.api_key.clone();

    Chain::new(Trace::new())
        .append(CatchPanic::new())
        .append(config.security.body_limit())
        .append(config.security.timeout())
        .append_fn(move |cx, w, req, next| {
            let given = req.headers().get("x-api-key").and_then(|v| v.to_str().ok());
            if given != Some(api_key.as_str()) {
                return Err(ChainError::http(StatusCode::UNAUTHORIZED, "missing or invalid api key"));
            }
            next.call(cx, w, req)
        })
        .append_fn(check_context)
        .append_fn(hello)
        .with_error_renderer(JsonErrorRenderer::new().expose_internal(config.expose_internal_errors))
}

fn demo_requests(api_key: &str) -> Result<Vec<(&'static str, Request)>, BoxError> {
    let get = |uri: &str, key: Option<&str>, body: Bytes| -> Result<Request, http::Error> {
        let mut builder = http::Request::builder().method("GET").uri(uri);
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(body)
    };

    Ok(vec![
        ("greeting", get("/hello?name=chains", Some(api_key), Bytes::new())?),
        ("no api key", get("/hello", None, Bytes::new())?),
        ("oversized body", get("/hello", Some(api_key), Bytes::from(vec![b'x'; 4096]))?),
        ("panicking handler", get("/boom", Some(api_key), Bytes::new())?),
    ])
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // (A) config + logging
    let config = load_config()?;
    let level: tracing::Level = config.log_level.parse()?;
    tracing_subscriber::fmt().with_max_level(level).init();

    // (B) assemble the chain once, then share it
    let chain = Arc::new(build_chain(&config));
    tracing::info!(handlers = chain.len(), "chain assembled");

    // (C) serve the demo requests concurrently; the chain itself is synchronous
    let mut tasks = Vec::new();
    for (label, req) in demo_requests(&config.api_key)? {
        let chain = Arc::clone(&chain);
        tasks.push(tokio::task::spawn_blocking(move || {
            (label, chain.serve_request(req))
        }));
    }

    // (D) report
    for task in tasks {
        let (label, response) = task.await?;
        println!(
            "{label:<18} {} {}",
            response.status().as_u16(),
            String::from_utf8_lossy(response.body())
        );
    }

    Ok(())
}
