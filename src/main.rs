mod auction;
mod catalog;
mod clock;
mod config;
mod ledger;
mod persistence;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use persistence::Persistence;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn connect(database: &config::DatabaseArguments) -> Result<persistence::PostgresPersistence> {
    info!(host = %database.host, port = database.port, "setting up database connection");
    let persistence = persistence::PostgresPersistence::connect(database.postgres_config())
        .context("failed to connect to database")?;
    persistence.migrate()?;
    Ok(persistence)
}

fn serve(args: config::ServeArguments) -> Result<()> {
    info!("running with arguments:\n{}", args);

    let persistence = connect(&args.database)?;
    let catalog = catalog::PostgresItemCatalog::new_shared();
    let ledger = ledger::PostgresBidLedger::new_shared();

    let state = service::AppState::new(
        &args.event,
        service::BiddingService::new(
            persistence.clone(),
            catalog.clone(),
            ledger.clone(),
            args.clock,
            clock::SystemTimeSource::new_shared(),
        ),
        service::ResultsService::new(persistence, catalog, ledger),
        service::AdminCredentials::new(&args.admin_user, &args.admin_password),
    );

    let svc_ctr = service::ServiceControl::new();

    ctrlc::set_handler({
        let svc_ctr = svc_ctr.clone();
        move || {
            info!("stopping all services");
            svc_ctr.stop_all();
        }
    })?;

    svc_ctr
        .spawn_loop(service::Ui::new(args.bind_address, state)?)
        .join()
}

fn add_item(args: config::AddItemArguments) -> Result<()> {
    let persistence = connect(&args.database)?;
    let catalog = catalog::PostgresItemCatalog::new_shared();

    let item = args.new_item();
    let id = catalog.add_item(&mut persistence.get_connection()?, item.clone())?;
    info!(id, name = %item.name, "item added");
    println!("{id}");
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    match config::Arguments::parse().command {
        config::Command::Serve(args) => serve(args),
        config::Command::AddItem(args) => add_item(args),
    }
}
