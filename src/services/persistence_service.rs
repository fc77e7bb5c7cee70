use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::data::repository;
use crate::error::AppError;
use crate::models::config::PipelineConfig;
use crate::models::preset::Preset;

pub const CONFIG_KEY: &str = "pipeline_config_v1";
pub const ACTIVE_PRESET_KEY: &str = "active_preset_v1";
pub const SAVED_LOGIC_KEY: &str = "saved_logic_v1";

/// Unreadable or malformed entries read as absent. Malformed ones are also deleted.
fn read_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> Option<T> {
    let raw = match repository::get_state(conn, key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read local state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "discarding corrupt local state");
            if let Err(err) = repository::delete_state(conn, key) {
                warn!(key, error = %err, "failed to delete corrupt local state");
            }
            None
        }
    }
}

fn write_json<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    repository::set_state(conn, key, &raw)
}

/// Directories are never stored; they are chosen again each session.
pub fn save_config(conn: &Connection, config: &PipelineConfig) -> Result<(), AppError> {
    write_json(conn, CONFIG_KEY, &config.without_directories())
}

pub fn load_config(conn: &Connection) -> Option<PipelineConfig> {
    read_json::<PipelineConfig>(conn, CONFIG_KEY).map(|config| config.without_directories())
}

pub fn save_active_preset(conn: &Connection, preset_id: &str) -> Result<(), AppError> {
    write_json(conn, ACTIVE_PRESET_KEY, &preset_id)
}

pub fn load_active_preset(conn: &Connection) -> Option<String> {
    read_json(conn, ACTIVE_PRESET_KEY)
}

pub fn save_saved_logic(conn: &Connection, preset: &Preset) -> Result<(), AppError> {
    write_json(conn, SAVED_LOGIC_KEY, preset)
}

pub fn load_saved_logic(conn: &Connection) -> Option<Preset> {
    read_json(conn, SAVED_LOGIC_KEY)
}
