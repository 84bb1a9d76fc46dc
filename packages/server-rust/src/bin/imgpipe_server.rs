//! `imgpipe-server`: serves image operations or issues access tokens.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use imgpipe_core::{DispatcherConfig, Identity};
use imgpipe_server::network::{NetworkConfig, NetworkModule};
use imgpipe_server::{build_sink, JwtVerifier, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imgpipe-server", version, about = "Authenticated image operations over HTTP")]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Print a signed access token for the given identity.
    Token(TokenArgs),
}

#[derive(Args, Debug)]
struct SecretArgs {
    /// HS256 signing secret.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Token lifetime in seconds.
    #[arg(long, env = "IMGPIPE_JWT_TTL_SECS", default_value_t = 86_400)]
    jwt_ttl_secs: u64,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "IMGPIPE_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Allowed CORS origins, comma separated.
    #[arg(long, env = "IMGPIPE_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    #[arg(long, env = "IMGPIPE_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    max_upload_bytes: usize,

    #[arg(long, env = "IMGPIPE_OPERATION_TIMEOUT_MS", default_value_t = 30_000)]
    operation_timeout_ms: u64,

    #[arg(long, env = "IMGPIPE_MAX_PIPELINE_DEPTH", default_value_t = 4)]
    max_pipeline_depth: usize,

    #[arg(long, env = "IMGPIPE_MAX_PIPELINE_STEPS", default_value_t = 32)]
    max_pipeline_steps: usize,

    #[arg(long, env = "IMGPIPE_JPEG_QUALITY", default_value_t = 90)]
    jpeg_quality: u8,

    /// JSON-lines access log. Pass an empty value to disable.
    #[arg(long, env = "IMGPIPE_LOG_FILE", default_value = "logs/app.log")]
    log_file: String,

    /// Do not mirror access log entries as tracing events.
    #[arg(long, env = "IMGPIPE_NO_TRACE_SINK")]
    no_trace_sink: bool,

    #[command(flatten)]
    secret: SecretArgs,
}

#[derive(Args, Debug)]
struct TokenArgs {
    #[arg(long)]
    user_id: String,

    #[arg(long)]
    email: String,

    #[command(flatten)]
    secret: SecretArgs,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Token(args) => {
            let verifier =
                JwtVerifier::new(args.secret.jwt_secret.as_bytes(), args.secret.jwt_ttl_secs);
            let token = verifier.issue(&Identity {
                subject_id: args.user_id,
                email: args.email,
            })?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    if args.secret.jwt_secret.is_empty() {
        bail!("JWT_SECRET must not be empty");
    }
    if !(1..=100).contains(&args.jpeg_quality) {
        bail!("jpeg quality must be between 1 and 100, got {}", args.jpeg_quality);
    }

    let server = ServerConfig {
        operation_timeout_ms: args.operation_timeout_ms,
        dispatcher: DispatcherConfig {
            max_pipeline_depth: args.max_pipeline_depth,
            max_pipeline_steps: args.max_pipeline_steps,
            jpeg_quality: args.jpeg_quality,
        },
        jwt_secret: args.secret.jwt_secret,
        jwt_ttl_secs: args.secret.jwt_ttl_secs,
        log_file: (!args.log_file.is_empty()).then(|| PathBuf::from(args.log_file)),
        trace_sink: !args.no_trace_sink,
    };
    let network = NetworkConfig {
        host: args.host,
        port: args.port,
        cors_origins: args.cors_origins,
        max_upload_bytes: args.max_upload_bytes,
        request_timeout: Duration::from_millis(server.operation_timeout_ms)
            + NetworkConfig::default().request_timeout,
    };

    let verifier = Arc::new(JwtVerifier::new(server.jwt_secret.as_bytes(), server.jwt_ttl_secs));
    let sink = build_sink(&server);
    info!(
        timeout_ms = server.operation_timeout_ms,
        log_file = ?server.log_file,
        "starting imgpipe server"
    );

    let mut module = NetworkModule::new(network, server, verifier, sink);
    let port = module.start().await.context("failed to bind listener")?;
    info!(port, "listening");

    module
        .serve(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await
}
