// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use actix_cors::Cors;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use baselayer_acl::Acl;
use baselayer_db::Db;
use baselayer_fanout::{Broker, FanoutState, PushClient, SubBus};
use baselayer_supervisor::{migration_status, provisioning, wait_for_migration, MigrationManager};
use settings::Settings;
use std::net::Ipv4Addr;
use std::sync::Arc;
use structopt::StructOpt;

mod auth;
mod cli;
mod entities;
mod error;
mod handlers;
mod settings;

#[actix_web::main]
async fn main() -> Result<()> {
    let args = cli::Args::from_args();
    setup_logging(args.verbose)?;

    let settings = Settings::load(&args.config).context("failed to load configuration")?;

    match args.role {
        cli::Role::MigrationManager => run_migration_manager(settings).await,
        cli::Role::Broker => run_broker(settings).await,
        cli::Role::Websocket => run_websocket(settings).await,
        cli::Role::Api { port_offset } => run_api(settings, port_offset).await,
        cli::Role::Status => run_status(settings).await,
    }
}

/// Runs any pending migration, then serves the gate's `{"migrated": bool}`
/// status the other roles poll before they start.
async fn run_migration_manager(settings: Settings) -> Result<()> {
    let db_url = settings.database.url();
    MigrationManager::run_pending_migrations(&db_url)
        .await
        .context("failed to run pending migrations")?;

    let manager = Data::new(MigrationManager::new(db_url));
    let port = settings.ports.migration_manager;

    HttpServer::new(move || App::new().app_data(manager.clone()).service(migration_status))
        .bind((Ipv4Addr::UNSPECIFIED, port))?
        .run()
        .await
        .context("migration manager server error")
}

/// Starts the ZeroMQ PULL/PUB forwarder and blocks for the lifetime of the
/// process; the broker never hands control back.
async fn run_broker(settings: Settings) -> Result<()> {
    let broker = Broker::spawn(&settings.ports.websocket_path_in, &settings.ports.websocket_path_out)
        .context("failed to bind the broker's ZeroMQ sockets")?;
    tokio::task::spawn_blocking(move || broker.join())
        .await
        .context("broker thread panicked")
}

/// Serves the authenticated websocket endpoint browsers connect to,
/// bridging it to the broker's PUB socket.
async fn run_websocket(settings: Settings) -> Result<()> {
    let bus = SubBus::spawn(&settings.ports.websocket_path_out).context("failed to connect the sub-bus to the broker")?;
    let secret: Arc<[u8]> = Arc::from(settings.app.secret_key.as_bytes());
    let state = Data::new(FanoutState { secret, bus });
    let port = settings.ports.websocket;

    HttpServer::new(move || App::new().app_data(state.clone()).route("/ws", web::get().to(baselayer_fanout::ws_index)))
        .bind((Ipv4Addr::UNSPECIFIED, port))?
        .run()
        .await
        .context("websocket server error")
}

/// Waits for the migration gate, then serves the JSON API. `port_offset`
/// lets several instances of this role run side by side behind a proxy.
async fn run_api(settings: Settings, port_offset: u16) -> Result<()> {
    let manager_url = format!("http://127.0.0.1:{}/", settings.ports.migration_manager);
    wait_for_migration(&reqwest::Client::new(), &manager_url).await;

    let db = Data::new(Db::connect_url(&settings.database.url(), settings.database.pool_size, None).context("failed to connect to the database")?);
    let acl = Data::new(Acl::new(Arc::new(entities::registry())));
    let secret: Arc<[u8]> = Arc::from(settings.app.secret_key.as_bytes());
    let secret = Data::new(secret);
    let push = Data::new(PushClient::connect(&settings.ports.websocket_path_in).context("failed to connect the push client to the broker")?);

    let port = settings.ports.app_internal + port_offset;

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(db.clone())
            .app_data(acl.clone())
            .app_data(secret.clone())
            .app_data(push.clone())
            .service(handlers::me)
            .service(handlers::list_users)
            .service(handlers::create_role)
            .service(handlers::delete_role)
            .service(handlers::list_tokens)
            .service(handlers::create_token)
            .service(handlers::revoke_token)
            .service(handlers::socket_auth_token)
    })
    .bind((Ipv4Addr::UNSPECIFIED, port))?
    .run()
    .await
    .context("API server error")
}

/// Serves 503s at the address a proxy would otherwise route API traffic
/// to, until an API process has taken over.
async fn run_status(settings: Settings) -> Result<()> {
    let port = settings.ports.status;
    HttpServer::new(|| App::new().default_service(web::to(provisioning)))
        .bind((Ipv4Addr::UNSPECIFIED, port))?
        .run()
        .await
        .context("status server error")
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}][{}] {}", record.target(), record.level(), message)))
        .level(level)
        .chain(std::io::stdout())
        .apply()
        .context("failed to set up logging")
}
