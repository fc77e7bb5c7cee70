use crate::error::AppError;

/// Canonical textual form of a directory: forward slashes, no trailing separator.
pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }
    normalized
}

/// True when both directories are set and name the same place.
pub fn is_invalid_pair(source: &str, target: &str) -> bool {
    if source.is_empty() || target.is_empty() {
        return false;
    }
    let source = normalize(source);
    let target = normalize(target);
    if cfg!(windows) {
        return source.eq_ignore_ascii_case(&target);
    }
    source == target
}

pub fn validate_pair(source: &str, target: &str) -> Result<(), AppError> {
    if is_invalid_pair(source, target) {
        return Err(AppError::Validation(format!(
            "source and target must be different directories: {}",
            normalize(source)
        )));
    }
    Ok(())
}
