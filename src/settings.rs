use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::error::AppError;

pub const BACKEND_URL_VAR: &str = "FILE_ORGANIZER_BACKEND_URL";
pub const DATA_DIR_VAR: &str = "FILE_ORGANIZER_DATA_DIR";
pub const HTTP_TIMEOUT_VAR: &str = "FILE_ORGANIZER_HTTP_TIMEOUT_SECS";

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DB_FILE_NAME: &str = "file-organizer.db";

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub backend_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolves settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend_url = get(BACKEND_URL_VAR).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let data_dir = match get(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("com", "FileOrganizer", "file-organizer")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| AppError::General("no home directory to store data in".to_string()))?,
        };

        let timeout_secs = match get(HTTP_TIMEOUT_VAR) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Validation(format!("{HTTP_TIMEOUT_VAR} must be whole seconds, got {raw}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            backend_url,
            data_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}
