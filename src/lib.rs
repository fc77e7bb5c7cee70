pub mod commands;
pub mod data;
pub mod error;
pub mod logging;
pub mod models;
pub mod scope_path;
pub mod services;
pub mod settings;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use data::migrations;
use error::AppError;
use services::backend_client::HttpBackend;
use settings::AppSettings;
use state::AppState;

fn init_db(settings: &AppSettings) -> Result<rusqlite::Connection, AppError> {
    std::fs::create_dir_all(&settings.data_dir)?;
    let conn = rusqlite::Connection::open(settings.db_path())?;
    conn.busy_timeout(Duration::from_secs(5))?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Opens the local store and connects to the configured backend.
pub fn init_state(settings: &AppSettings) -> Result<AppState, AppError> {
    let conn = init_db(settings)?;
    let backend = HttpBackend::new(&settings.backend_url, settings.request_timeout)?;
    tracing::info!(
        backend = %settings.backend_url,
        db = %settings.db_path().display(),
        "state initialized"
    );
    Ok(AppState::new(Arc::new(backend), conn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_state_creates_database_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings {
            backend_url: "http://127.0.0.1:1".to_string(),
            data_dir: dir.path().join("nested"),
            request_timeout: Duration::from_secs(1),
        };
        let state = init_state(&settings).unwrap();
        assert!(settings.db_path().exists());
        assert!(!state.is_locked());
    }
}
