use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use retriever_core::{Vectorizer, VectorizerConfig};
use retriever_server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Documents to serve (file or directory of .json/.jsonl/.txt/.md)
    #[arg(long, default_value = "./documents")]
    documents: String,
    /// JSON file with vectorizer settings; defaults apply to missing fields
    #[arg(long)]
    vectorizer_config: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn load_vectorizer(path: Option<&str>) -> Result<Vectorizer> {
    let config = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p).with_context(|| format!("reading {p}"))?;
            serde_json::from_str::<VectorizerConfig>(&raw).with_context(|| format!("parsing {p}"))?
        }
        None => VectorizerConfig::default(),
    };
    Ok(Vectorizer::new(config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let vectorizer = load_vectorizer(args.vectorizer_config.as_deref())?;
    let app: Router = build_app(args.documents.clone(), vectorizer)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, documents = %args.documents, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
