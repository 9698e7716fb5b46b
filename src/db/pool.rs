//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::{AsyncConnection, AsyncPgConnection};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap (just reference count increment).
/// Structures holding AsyncDbPool can derive Clone without additional Arc wrapping.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Creates an async database connection pool sized from the configuration.
///
/// # Errors
///
/// - `AppError::ConnectionPool` - If the initial connections cannot be opened
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());
    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(config.connection_timeout())
        .build(manager)
        .await
        .map_err(AppError::connection_pool)?;

    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool established"
    );
    Ok(pool)
}

/// Opens a standalone connection for `LISTEN`.
///
/// Subscriptions belong to a session, so the listener must not share a
/// pooled connection that could be handed to another task.
pub async fn establish_listener_connection(database_url: &str) -> AppResult<AsyncPgConnection> {
    AsyncPgConnection::establish(database_url)
        .await
        .map_err(|e| AppError::Database {
            operation: "establish listener connection".to_string(),
            source: anyhow::Error::from(e),
        })
}
