use std::{io, sync::OnceLock};

use application::{args, Args, Config, Service};
use service::{
    command::ReconcileListings,
    infra::{postgres, Postgres},
    query,
    read::transaction::Stranded,
    Command as _,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && level() >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && level() >= *meta.level()
                })),
        )
        .init();

    _ = start().await;
}

/// Returns the configured [`log::Level`].
fn level() -> log::Level {
    LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO)
}

async fn start() -> Result<(), ()> {
    let Args { config, command } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let service_config = service.try_into().map_err(|e| {
        log::error!("invalid `Config`: {e}");
    })?;

    let postgres_config = postgres.into();
    let mut postgres = Postgres::new(&postgres_config).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    match command {
        args::Command::Migrate => {
            let report = migrations::runner()
                .run_async(&mut postgres)
                .await
                .map_err(|e| {
                    log::error!("failed to run database migrations: {e}");
                })?;
            log::info!(
                "{} database migrations applied",
                report.applied_migrations().len(),
            );
        }
        args::Command::Reconcile { dry_run: true } => {
            let service = Service::new(service_config, postgres);
            let stranded = service
                .execute(query::transaction::Stranded::by(()))
                .await
                .map_err(|e| {
                    log::error!("failed to find stranded listings: {e}");
                })?;
            for Stranded(t) in &stranded {
                log::warn!(
                    "`Listing(id: {})` is not sold, while its \
                     `Transaction(id: {})` is completed",
                    t.listing_id,
                    t.id,
                );
            }
            log::info!("{} stranded listings found", stranded.len());
        }
        args::Command::Reconcile { dry_run: false } => {
            let service = Service::new(service_config, postgres);
            let out = service.execute(ReconcileListings).await.map_err(|e| {
                log::error!("failed to reconcile listings: {e}");
            })?;
            log::info!(
                "{} listings reconciled, {} skipped",
                out.repaired.len(),
                out.skipped.len(),
            );
        }
    }

    Ok(())
}
