use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use servlet_httpd::servlets::registry_from_config;
use servlet_httpd::{Config, HttpServer, ServerConfig, ServerContext, ServerLog};

/// A minimal HTTP/1.1 server with servlets and static files.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the YAML configuration file; created with defaults if missing.
    #[arg(short, long, env = "SERVLET_HTTPD_CONFIG", default_value = "./configuration/config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config_existed = args.config.exists();
    let config = Config::load(&args.config)?;
    let debug = config.get_bool_or("debug", false);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if debug { "trace" } else { "info" }),
    )
    .init();
    if !config_existed {
        info!("Wrote default configuration to {}", args.config.display());
    }

    let server_config = match ServerConfig::from_config(&config) {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("Invalid configuration in {}: {e}", args.config.display());
            return Err(e.into());
        }
    };
    fs::create_dir_all(&server_config.web_root)?;

    let log = ServerLog::open(&server_config.logging, server_config.debug)?;
    let registry = registry_from_config(&server_config);
    let server = HttpServer::bind(ServerContext::new(server_config, registry, log)).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
    }

    Ok(())
}
