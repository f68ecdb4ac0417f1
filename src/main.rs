use anyhow::{bail, Context, Result};
use clap::Parser;
use openapi_mock_bin::spec::{describe, ingest_document};
use openapi_mock_bin::{load_openapi_document, MockRequest, MockServer, MockServerConfig};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Answer a single HTTP request from an OpenAPI document
#[derive(Parser, Debug)]
#[command(name = "openapi-mock-bin", version, about)]
struct Cli {
    /// OpenAPI document (JSON or YAML)
    #[arg(long)]
    spec: PathBuf,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request header as 'Name: value'; repeatable
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// Replace details of unexpected errors with a generic message
    #[arg(long)]
    redact_errors: bool,

    /// Strictly parse the document as OpenAPI 3.0 before serving
    #[arg(long)]
    validate: bool,

    /// Absolute request URL, e.g. http://localhost/pizza/menu
    url: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if cli.validate {
        let bytes = fs::read(&cli.spec)
            .with_context(|| format!("reading {}", cli.spec.display()))?;
        let spec = ingest_document(&bytes)?;
        info!(summary = %describe(&spec), "document is valid OpenAPI 3.0");
    }

    let document = load_openapi_document(&cli.spec)?;
    let config = MockServerConfig {
        expose_error_details: !cli.redact_errors,
        ..MockServerConfig::default()
    };
    let server = MockServer::new(document).with_config(config);

    let mut request = MockRequest::new(cli.method.to_uppercase(), &cli.url)?;
    for header in &cli.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header '{}' is not in 'Name: value' form", header);
        };
        request = request.with_header(name.trim(), value.trim())?;
    }
    if let Some(data) = cli.data {
        request = request.with_body(data);
    }

    let response = server.handle_request(&request);
    println!("HTTP {} {}", response.status, response.reason());
    for (name, value) in response.headers.iter() {
        println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    println!();
    println!("{}", response.body);

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("openapi_mock_bin=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
