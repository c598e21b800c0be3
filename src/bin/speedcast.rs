//! speedcast: 命令行 HTTP 请求工具
//!
//! Usage:
//!   speedcast <METHOD> <URL> [--data JSON] [--header K:V]... [--timeout-ms N] [--retries N]
//!
//! Client defaults are read from `SPEEDCAST_*` environment variables first, then
//! overridden by flags.

use anyhow::{anyhow, bail, Context};
use speedcast::{ApiClient, Method, RequestConfig, ResponseBody};
use std::collections::HashMap;
use std::time::Duration;

struct Invocation {
    method: Method,
    url: String,
    data: Option<serde_json::Value>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
    retries: Option<u32>,
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }
    match args[0].as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "version" | "--version" | "-V" => {
            println!("speedcast {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {}
    }

    if let Err(e) = run(&args).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"speedcast: HTTP request orchestrator

USAGE:
    speedcast <METHOD> <URL> [OPTIONS]

OPTIONS:
    --data <JSON>          Request body (JSON)
    --header <K:V>         Extra request header, repeatable
    --timeout-ms <N>       Per-attempt timeout in milliseconds
    --retries <N>          Additional attempts after the first

ENVIRONMENT:
    SPEEDCAST_BASE_URL     Base URL for relative request URLs
    SPEEDCAST_TIMEOUT_MS   Default timeout
    SPEEDCAST_RETRIES      Default retry count
    RUST_LOG               Log filter, e.g. speedcast=debug"#
    );
}

fn parse_args(args: &[String]) -> anyhow::Result<Invocation> {
    let [method, url, rest @ ..] = args else {
        bail!("expected <METHOD> <URL>");
    };
    let method: Method = method.parse()?;
    let mut invocation = Invocation {
        method,
        url: url.clone(),
        data: None,
        headers: HashMap::new(),
        timeout: None,
        retries: None,
    };

    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("missing value for {flag}"))?;
        match flag.as_str() {
            "--data" => {
                invocation.data =
                    Some(serde_json::from_str(value).context("--data is not valid JSON")?);
            }
            "--header" => {
                let (name, val) = value
                    .split_once(':')
                    .ok_or_else(|| anyhow!("--header expects K:V, got {value:?}"))?;
                invocation
                    .headers
                    .insert(name.trim().to_string(), val.trim().to_string());
            }
            "--timeout-ms" => {
                let ms: u64 = value.parse().context("--timeout-ms expects an integer")?;
                invocation.timeout = Some(Duration::from_millis(ms));
            }
            "--retries" => {
                invocation.retries = Some(value.parse().context("--retries expects an integer")?);
            }
            other => bail!("unknown option: {other}"),
        }
    }
    Ok(invocation)
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    let invocation = parse_args(args)?;
    let client = ApiClient::builder().from_env().build()?;

    let mut config = RequestConfig::new()
        .with_method(invocation.method)
        .with_headers(invocation.headers);
    if let Some(body) = invocation.data {
        config = config.with_body(body);
    }
    if let Some(timeout) = invocation.timeout {
        config = config.with_timeout(timeout);
    }
    if let Some(retries) = invocation.retries {
        config = config.with_retries(retries);
    }

    let response = client.send(&invocation.url, config).await?;
    println!("{} {}", response.status, response.status_text);
    match &response.data {
        ResponseBody::Json(value) => println!("{}", serde_json::to_string_pretty(value)?),
        ResponseBody::Text(text) => println!("{text}"),
        ResponseBody::Binary(bytes) => println!("<{} bytes of binary data>", bytes.len()),
    }
    Ok(())
}
