//! Database access module.
//!
//! Async PostgreSQL connection pooling with diesel_async and bb8, the
//! dedicated connection used for `LISTEN`, and the embedded migrations.

mod migrations;
mod pool;

pub use migrations::{MIGRATIONS, pending_migrations, revert_migrations, run_pending_migrations};
pub use pool::{AsyncDbPool, establish_async_connection_pool, establish_listener_connection};
