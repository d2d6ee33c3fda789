//! # adminkit showcase
//!
//! A runnable admin panel over SQLite:
//!
//! - **Login**: the security provider with Argon2 passwords and an init page
//!   for the first account
//! - **Resources**: categories, products with tags and an image upload, and
//!   site configuration entries
//! - **Custom route**: `PUT /admin/config/switch_status/{id}` toggles an entry
//! - **Settings**: loaded from a TOML file with `ADMINKIT_*` overrides
//!
//! ## Running
//!
//! ```bash
//! cargo run --package adminkit-showcase -- --config showcase.toml
//! ```
//!
//! Then open <http://127.0.0.1:8000/admin>.

mod resources;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use adminkit::core::settings_loader;
use adminkit::prelude::*;
use anyhow::Context as _;
use clap::Parser;
use tower_http::services::ServeDir;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "showcase", about = "Serve the adminkit showcase panel")]
struct Args {
    /// Settings file. Defaults apply when it is missing.
    #[arg(short, long, default_value = "showcase.toml")]
    config: PathBuf,

    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Insert sample rows into an empty database.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = if args.config.exists() {
        settings_loader::from_toml_file_with_env(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?
    } else {
        let mut settings = AdminSettings {
            title: "Showcase".to_string(),
            database_url: "showcase.sqlite3".to_string(),
            ..AdminSettings::default()
        };
        settings_loader::apply_env_overrides(&mut settings);
        settings
    };
    setup_logging(&settings);
    tracing::info!(
        database = %settings.database_url,
        admin_path = %settings.admin_path,
        "Showcase configured"
    );

    let backend = Arc::new(SqlBackend::from_settings(&settings)?);
    resources::create_schema(&backend).await?;
    if args.seed {
        resources::seed(&backend).await?;
    }

    let security = SecurityProvider::from_settings(&settings).await?;
    let admin = resources::register(
        AdminApp::builder(settings.clone(), backend.clone()).provider(security),
        &backend,
        &settings,
    )
    .await?
    .build()?;

    let home = settings.url("");
    let app = axum::Router::new()
        .nest_service(
            &settings.static_uploads_prefix,
            ServeDir::new(&settings.uploads_dir),
        )
        .merge(admin.into_router())
        .fallback(move || {
            let home = home.clone();
            async move { axum::response::Redirect::to(&home) }
        });

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!("Serving on http://{}{}", args.bind, settings.admin_path);
    axum::serve(listener, app).await?;
    Ok(())
}
