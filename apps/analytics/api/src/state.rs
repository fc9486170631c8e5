use database::postgres::DatabaseConnection;

/// Shared application state. Cloning shares the connection pool.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub db: DatabaseConnection,
}
