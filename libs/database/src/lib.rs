//! PostgreSQL connectivity for the analytics service.
//!
//! Pool configuration loaded from the environment, connection with retry,
//! migration running and health probes. Storage logic lives in the domain
//! crates; this crate only hands them a ready [`postgres::DatabaseConnection`].
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "analytics_api").await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};
