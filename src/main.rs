//! trellis demo server.
//!
//! Loads an optional TOML config, registers a small nested application and
//! serves it until Ctrl+C.

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use trellis::config::loader::load_config;
use trellis::config::AppConfig;
use trellis::lifecycle::signals::spawn_signal_listener;
use trellis::observability::{logging, metrics};
use trellis::{handlers, App, Handler};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Express-style routing demo server", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_filter);
    tracing::info!("trellis v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let mut app = App::from_config(&config)?;
    register_routes(&mut app)?;

    let application = app.build()?;
    spawn_signal_listener(application.shutdown_handle());
    application.listen().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn request_logger() -> Handler {
    Handler::named("request_logger", |res, req, next| {
        tracing::info!(method = %req.method(), path = %req.path(), "Request received");
        next.run(res, req);
    })
}

fn register_routes(app: &mut App) -> Result<(), trellis::SetupError> {
    app.use_middleware(vec![request_logger()]);

    app.get("/", handlers![|res, req, _next| {
        match req.accepts(&["html", "json"]) {
            Some("json") => {
                res.json(&json!({ "message": "hello from trellis" }));
            }
            _ => {
                res.send("hello from trellis");
            }
        }
    }])?;

    let mut api = app.router("/api")?;
    api.use_middleware(handlers![|res, req, next| {
        res.set("Cache-Control", "no-store");
        next.run(res, req);
    }]);
    api.param("id", |res, req, next, id| {
        if id.chars().all(|c| c.is_ascii_digit()) {
            next.run(res, req);
        } else {
            res.send_error(axum::http::StatusCode::BAD_REQUEST, "id must be numeric");
        }
    });
    api.get("/users/:id", handlers![|res, req, _next| {
        res.json(&json!({ "id": req.param("id"), "base": req.base_url() }));
    }])?
    .post("/users", handlers![|res, req, _next| {
        match req.json::<serde_json::Value>() {
            Ok(user) => {
                res.status(axum::http::StatusCode::CREATED).json(&user);
            }
            Err(error) => {
                res.send_error(error.status(), &error.to_string());
            }
        }
    }])?;

    Ok(())
}
