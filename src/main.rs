use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use tracing::info;

use delay_backend::{handlers, init_logging, AppConfig, DelayModel};

#[derive(Parser)]
#[command(name = "delay-backend")]
#[command(about = "HTTP service predicting flight delays", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::load_or_default(&cli.config)?.with_env_overrides()?;
    let model = DelayModel::load(&config).with_context(|| {
        format!("failed to load model from {}", config.model.path.display())
    })?;
    let model = web::Data::new(model);

    let host = config.server.host.clone();
    let port = config.server.port;
    info!("Server running at http://{}:{}", host, port);

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(model.clone())
            .configure(handlers::configure)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind((host.as_str(), port))
        .with_context(|| format!("failed to bind {}:{}", host, port))?
        .run()
        .await?;
    Ok(())
}
