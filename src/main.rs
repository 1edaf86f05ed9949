use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use subhub::api::{push_nodes, read_node_file};
use subhub::models::AppState;
use subhub::settings::{init_settings, update_settings};
use subhub::web_handlers::interfaces;
use subhub::{render, select_encoder, Settings};

/// Push proxy nodes once, serve them to Clash and v2rayN style clients
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML or YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Listen address (e.g., 127.0.0.1 or 0.0.0.0)
    #[arg(short, long, value_name = "ADDRESS")]
    address: Option<String>,

    /// Listen port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Secret expected in the Authorization header of pushes
    #[arg(long, env = "SUBHUB_API_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// JSON node file to render directly instead of starting the server
    #[arg(short, long, value_name = "NODES_FILE", requires = "output")]
    input: Option<String>,

    /// Output file for direct rendering (must be used with --input)
    #[arg(short, long, value_name = "OUTPUT_FILE", requires = "input")]
    output: Option<String>,

    /// Output format for direct rendering: clash or v2ray
    #[arg(short, long, default_value = "clash")]
    format: String,

    /// JSON node file to push to a running instance
    #[arg(long, value_name = "NODES_FILE", requires = "endpoint", conflicts_with = "input")]
    push: Option<String>,

    /// Base URL of the instance to push to
    #[arg(long, value_name = "URL", requires = "push")]
    endpoint: Option<String>,
}

fn render_to_file(input: &str, output: &str, format: &str) -> anyhow::Result<()> {
    let nodes = read_node_file(input).with_context(|| format!("Failed to load {}", input))?;
    let rendered = render(&nodes, format);
    std::fs::write(output, rendered.content)
        .with_context(|| format!("Failed to write to output file {}", output))?;
    info!(
        "Wrote {} nodes as {} to {}",
        nodes.len(),
        select_encoder(format).to_str(),
        output
    );
    Ok(())
}

async fn push_file(file: &str, endpoint: &str, secret: &str) -> anyhow::Result<()> {
    if secret.is_empty() {
        bail!("No API secret configured; set --secret or SUBHUB_API_SECRET");
    }
    let nodes = read_node_file(file).with_context(|| format!("Failed to load {}", file))?;
    let receipt = push_nodes(endpoint, secret, &nodes).await?;
    info!("Server stored {} nodes ({})", receipt.count, receipt.status);
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize settings with config file path if provided
    init_settings(args.config.as_deref().unwrap_or(""))?;

    // Override settings with command line arguments if provided
    update_settings(|settings| {
        if let Some(address) = args.address.clone() {
            settings.listen_address = address;
        }
        if let Some(port) = args.port {
            settings.listen_port = port;
        }
        if let Some(secret) = args.secret.clone() {
            settings.api_secret = secret;
        }
    });
    let settings = Settings::current();

    // Initialize the logger
    env_logger::init_from_env(Env::default().default_filter_or(settings.log_level.as_str()));

    if let (Some(input), Some(output)) = (&args.input, &args.output) {
        return render_to_file(input, output, &args.format);
    }

    if let (Some(file), Some(endpoint)) = (&args.push, &args.endpoint) {
        return push_file(file, endpoint, &settings.api_secret).await;
    }

    if settings.api_secret.is_empty() {
        warn!("No API secret configured, every push will be rejected");
    }

    let app_state = Arc::new(AppState::new(Arc::clone(&settings)));
    let listen_address = settings.listen_target();

    info!("subhub starting on {}", listen_address);

    // Start web server
    HttpServer::new(move || {
        App::new()
            // Add app state
            .app_data(web::Data::new(Arc::clone(&app_state)))
            // Register web handlers
            .configure(interfaces::config)
    })
    .bind(&listen_address)
    .with_context(|| format!("Failed to bind {}", listen_address))?
    .workers(settings.max_concur_threads)
    .run()
    .await?;

    Ok(())
}
