use anyhow::Context;
use capability_token::{EdgeTokenCodec, Secret, UrlSigner};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use maptunnel::api;
use maptunnel::models::config::{EDGE_TOKEN_SECRET_VAR, SESSION_SECRET_VAR, TUNNEL_SECRET_VAR};
use maptunnel::models::{AppConfig, Secrets};
use maptunnel::server;
use maptunnel::services::{clock_at, Clock, SystemClock};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";

#[derive(Parser)]
#[command(name = "maptunnel")]
#[command(about = "Signed-URL gateway for internal map services")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Sign a tunnel URL (uses TUNNEL_SECRET)
    Sign {
        /// Internal path, e.g. /photon/api
        path: String,

        /// Query parameter as name=value, kept in the order given
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Lifetime in seconds (defaults to the configured TTL)
        #[arg(short, long)]
        ttl: Option<u64>,

        /// Signing time in unix seconds (defaults to now)
        #[arg(long)]
        now: Option<i64>,
    },
    /// Check a signed URL and show where it would be forwarded
    Verify {
        /// Signed URL, absolute or starting at the path
        url: String,

        /// Verification time in unix seconds (defaults to now)
        #[arg(long)]
        now: Option<i64>,
    },
    /// Issue a session cookie value or an edge bearer token
    Token {
        /// Which secret to issue under
        #[arg(short, long, value_enum, default_value = "session")]
        kind: TokenKindArg,

        /// Subject (user id) carried by the token
        #[arg(short, long)]
        sub: String,

        /// Lifetime in seconds (defaults to the configured TTL)
        #[arg(short, long)]
        ttl: Option<u64>,
    },
    /// Generate a random secret suitable for any of the *_SECRET variables
    Keygen,
}

#[derive(Clone, Copy, ValueEnum)]
enum TokenKindArg {
    Session,
    Edge,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Maptunnel API",
        description = "Signed-URL gateway for internal map services",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_sign,
        api::handle_edge_token,
        api::handle_status,
    ),
    components(schemas(
        api::SignResponse,
        api::EdgeTokenResponse,
    )),
    tags(
        (name = "Tunnel", description = "Signed URL issuance"),
        (name = "Edge", description = "Edge bearer tokens"),
        (name = "Status", description = "Target reachability")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Sign {
            path,
            params,
            ttl,
            now,
        }) => run_sign_command(&path, params, ttl, now),
        Some(Commands::Verify { url, now }) => run_verify_command(&url, now),
        Some(Commands::Token { kind, sub, ttl }) => run_token_command(kind, &sub, ttl),
        Some(Commands::Keygen) => {
            println!("{}", Secret::generate().to_base64url());
            Ok(())
        }
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

/// Minimal logging for CLI commands
fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maptunnel=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// Load CONFIG_FILE (if set) and apply environment overrides.
fn load_config() -> anyhow::Result<AppConfig> {
    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    let mut config = AppConfig::load(config_file.as_deref())?;
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

fn secret_from_env(var: &str) -> anyhow::Result<Secret> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(Secret::from)
        .with_context(|| format!("{var} must be set"))
}

fn run_sign_command(
    path: &str,
    params: Vec<(String, String)>,
    ttl: Option<u64>,
    now: Option<i64>,
) -> anyhow::Result<()> {
    init_cli_tracing();

    let config = load_config()?;
    let signer = UrlSigner::new(secret_from_env(TUNNEL_SECRET_VAR)?, config.public_origin);
    let clock = clock_at(now);

    let signed = signer.sign(path, params, ttl.unwrap_or(config.default_ttl), clock.now())?;
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}

fn run_verify_command(url: &str, now: Option<i64>) -> anyhow::Result<()> {
    init_cli_tracing();

    let config = load_config()?;
    let signer = UrlSigner::new(secret_from_env(TUNNEL_SECRET_VAR)?, config.public_origin);
    let clock = clock_at(now);

    let path_and_query = if url.starts_with('/') {
        url.to_string()
    } else {
        let parsed = reqwest::Url::parse(url).with_context(|| format!("'{url}' is not a URL"))?;
        match parsed.query() {
            Some(query) => format!("{}?{query}", parsed.path()),
            None => parsed.path().to_string(),
        }
    };

    match signer.verify(&path_and_query, clock.now()) {
        Ok(verified) => {
            println!("valid until {}", format_timestamp(verified.expires_at()));
            println!("forwards as {}", verified.forward_path()?);
            Ok(())
        }
        Err(e) => anyhow::bail!("rejected: {e}"),
    }
}

fn run_token_command(kind: TokenKindArg, sub: &str, ttl: Option<u64>) -> anyhow::Result<()> {
    init_cli_tracing();

    let config = load_config()?;
    let var = match kind {
        TokenKindArg::Session => SESSION_SECRET_VAR,
        TokenKindArg::Edge => EDGE_TOKEN_SECRET_VAR,
    };
    let codec = EdgeTokenCodec::new(secret_from_env(var)?);

    let issued = codec.issue(sub, ttl.unwrap_or(config.default_ttl), SystemClock.now())?;
    println!("{}", issued.token);
    println!("expires at {}", format_timestamp(issued.exp));
    Ok(())
}

fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let is_set = |var: &str| {
        if std::env::var(var).is_ok_and(|v| !v.is_empty()) {
            "(set)"
        } else {
            "(not set)"
        }
    };

    println!("Maptunnel v{VERSION}");
    println!("Signed-URL gateway for internal map services\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR         = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:4000 (default)")
    );
    println!(
        "  CONFIG_FILE       = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!("  TUNNEL_SECRET     = {}", is_set(TUNNEL_SECRET_VAR));
    println!("  SESSION_SECRET    = {}", is_set(SESSION_SECRET_VAR));
    println!("  EDGE_TOKEN_SECRET = {}", is_set(EDGE_TOKEN_SECRET_VAR));

    println!("\nTargets:");
    match load_config() {
        Ok(config) => {
            println!("  Public origin: {}", config.public_origin);
            println!("  Default TTL:   {}s", config.default_ttl);
            for target in &config.targets {
                println!("  {:<8} {:<10} -> {}", target.name, target.prefix, target.base_url);
            }
        }
        Err(e) => println!("  (configuration error: {e})"),
    }

    println!("\nCommands:");
    println!("  maptunnel serve    Start the HTTP server");
    println!("  maptunnel sign     Sign a tunnel URL");
    println!("  maptunnel verify   Check a signed URL");
    println!("  maptunnel token    Issue a session or edge token");
    println!("  maptunnel keygen   Generate a secret");
    println!("\nRun 'maptunnel --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maptunnel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let config = load_config()?;
    let secrets = Secrets::from_env()?;

    tracing::info!(
        public_origin = %config.public_origin,
        default_ttl = config.default_ttl,
        targets = config.targets.len(),
        "Configuration loaded"
    );

    let state = server::create_app_state(config, secrets, Arc::new(SystemClock))?;

    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Maptunnel listening");

    axum::serve(listener, app).await?;

    Ok(())
}
