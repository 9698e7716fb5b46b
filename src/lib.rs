//! timetable-ledger library
//!
//! Postgres run ledger with insert notifications, the calendar mapping
//! store and the consumer that reacts to new runs.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod notify;
pub mod repositories;
pub mod schema;
pub mod services;
pub mod worker;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
