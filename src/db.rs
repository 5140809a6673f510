use futures_util::future::BoxFuture;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::configuration::DatabaseSettings;
use crate::model::global_error::AppError;

/// Attempts per unit of work before a transient store error is surfaced.
pub const MAX_TXN_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

#[instrument(skip(settings))]
pub async fn init_db(settings: &DatabaseSettings) -> anyhow::Result<DatabaseConnection> {
    info!("configuring database pool");

    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .min_connections(settings.max_connections.min(5))
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing_log::log::LevelFilter::Debug);

    let db = Database::connect(options).await?;
    info!("database connection established");

    Ok(db)
}

/// Runs `op` inside one transaction and commits it.
///
/// Any error rolls the transaction back. Transient store errors (deadlock, lock
/// wait, busy pool) re-run the whole operation from scratch, bounded by
/// [`MAX_TXN_ATTEMPTS`]; all other errors are returned untouched.
pub async fn run_in_transaction<T, F>(db: &DatabaseConnection, op: F) -> Result<T, AppError>
where
    T: Send,
    F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match attempt_once(db, &op).await {
            Err(err) if err.is_retryable() && attempt < MAX_TXN_ATTEMPTS => {
                warn!(attempt, error = %err, "transient store error, retrying transaction");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

async fn attempt_once<T, F>(db: &DatabaseConnection, op: &F) -> Result<T, AppError>
where
    T: Send,
    F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, AppError>>,
{
    let txn = db.begin().await?;
    let result = op(&txn).await;

    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
