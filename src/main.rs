use std::fs;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use huddle::acl;
use huddle::auth::{HttpIdp, PrincipalResolver};
use huddle::config::ServerConfig;
use huddle::notify::{InviteRateLimiter, Notifier};
use huddle::roles::GUEST_ROLE;
use huddle::server::{AppState, create_router};
use huddle::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "A collaboration platform backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database and uploaded files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Optional TOML config file; flags override its values
        #[arg(long)]
        config: Option<String>,

        /// Identity provider base URL
        #[arg(long)]
        idp_url: Option<String>,

        /// Notification sink URL
        #[arg(long)]
        notify_url: Option<String>,

        /// Minutes between background token TTL refreshes
        #[arg(long)]
        ttl_refresh_minutes: Option<u64>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and seed the ACL)
    Init {
        /// Data directory for the database and uploaded files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username to create with the "admin" role
        #[arg(long)]
        admin: Option<String>,
    },
}

fn run_init(data_dir: String, admin: Option<String>) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;
    fs::create_dir_all(data_path.join("files"))?;

    let db_path = data_path.join("huddle.db");
    if db_path.exists() {
        bail!("Server already initialized at {}", db_path.display());
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    acl::global::insert_admin(&store)?;
    acl::global::insert_default(&store, GUEST_ROLE)?;

    if let Some(username) = admin {
        store.ensure_profile(&username)?;
        store.set_role(&username, huddle::roles::ADMIN_ROLE)?;
        println!("Created admin profile '{username}'");
    }

    println!("Initialized database at {}", db_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("huddle=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir, admin } => {
                run_init(data_dir, admin)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
            idp_url,
            notify_url,
            ttl_refresh_minutes,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::load(path.as_ref())?,
                None => ServerConfig::default(),
            };
            config.host = host;
            config.port = port;
            config.data_dir = data_dir.into();
            if let Some(url) = idp_url {
                config.idp_url = url;
            }
            if notify_url.is_some() {
                config.notify_url = notify_url;
            }
            if let Some(minutes) = ttl_refresh_minutes {
                config.ttl_refresh_minutes = minutes;
            }

            if !config.db_path().exists() {
                bail!(
                    "Server not initialized. Run 'huddle admin init' first to create the database."
                );
            }

            let store = Arc::new(SqliteStore::new(config.db_path())?);
            store.initialize()?;
            fs::create_dir_all(config.files_dir())?;

            let resolver = Arc::new(PrincipalResolver::new(
                Arc::new(HttpIdp::new(config.idp_url.clone())),
                config.cache_ttl(),
                config.ttl_refresh(),
            ));
            let notifier = Notifier::spawn(
                store.clone(),
                config.notify_url.clone(),
                config.notify_workers,
                config.notify_queue,
            );

            let state = Arc::new(AppState {
                store,
                resolver,
                notifier,
                invites: InviteRateLimiter::new(config.invite_rate_limit),
                files_dir: config.files_dir(),
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
