use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::category::FileCategory;

pub const DEFAULT_PROCESSING_FILE_LIMIT: u32 = 50_000;
pub const DEFAULT_MAX_PREVIEW_FILES: u32 = 500;

/// A primitive setting value. Sections never nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

pub type Section = BTreeMap<String, SettingValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Prefix,
    Rename,
    Extension,
    Standardize,
    Metadata,
    Deduplicate,
    Group,
    Transfer,
    TimestampFormat,
}

impl SectionName {
    pub const ALL: [SectionName; 9] = [
        Self::Prefix,
        Self::Rename,
        Self::Extension,
        Self::Standardize,
        Self::Metadata,
        Self::Deduplicate,
        Self::Group,
        Self::Transfer,
        Self::TimestampFormat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Rename => "rename",
            Self::Extension => "extension",
            Self::Standardize => "standardize",
            Self::Metadata => "metadata",
            Self::Deduplicate => "deduplicate",
            Self::Group => "group",
            Self::Transfer => "transfer",
            Self::TimestampFormat => "timestamp_format",
        }
    }
}

impl std::str::FromStr for SectionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown config section: {s}"))
    }
}

fn section<const N: usize>(entries: [(&str, SettingValue); N]) -> Section {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Per-step settings, serialized as top-level keys next to the scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sections {
    #[serde(default)]
    pub prefix: Section,
    #[serde(default)]
    pub rename: Section,
    #[serde(default)]
    pub extension: Section,
    #[serde(default)]
    pub standardize: Section,
    #[serde(default)]
    pub metadata: Section,
    #[serde(default)]
    pub deduplicate: Section,
    #[serde(default)]
    pub group: Section,
    #[serde(default)]
    pub transfer: Section,
    #[serde(default)]
    pub timestamp_format: Section,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            prefix: section([
                ("add_timestamp", true.into()),
                ("timeline_mode", "off".into()),
            ]),
            rename: section([
                ("replace_bodyname", "".into()),
                ("append_first_text", "".into()),
                ("append_second_text", "".into()),
            ]),
            extension: section([
                ("clean_extensions", true.into()),
                ("uniform_extensions", true.into()),
            ]),
            standardize: section([("use_filename_fallback", false.into())]),
            metadata: section([
                ("start_datetime", "1993-01-12 00:00:00".into()),
                ("add_timestamp", true.into()),
                ("keep_original_name", false.into()),
            ]),
            deduplicate: section([("faster_process", true.into())]),
            group: section([("prioritize_filename", true.into())]),
            transfer: section([("overwrite", false.into())]),
            timestamp_format: section([
                ("preset", "pcloud".into()),
                ("hour_format_12", true.into()),
            ]),
        }
    }
}

impl Sections {
    pub fn get(&self, name: SectionName) -> &Section {
        match name {
            SectionName::Prefix => &self.prefix,
            SectionName::Rename => &self.rename,
            SectionName::Extension => &self.extension,
            SectionName::Standardize => &self.standardize,
            SectionName::Metadata => &self.metadata,
            SectionName::Deduplicate => &self.deduplicate,
            SectionName::Group => &self.group,
            SectionName::Transfer => &self.transfer,
            SectionName::TimestampFormat => &self.timestamp_format,
        }
    }

    pub fn get_mut(&mut self, name: SectionName) -> &mut Section {
        match name {
            SectionName::Prefix => &mut self.prefix,
            SectionName::Rename => &mut self.rename,
            SectionName::Extension => &mut self.extension,
            SectionName::Standardize => &mut self.standardize,
            SectionName::Metadata => &mut self.metadata,
            SectionName::Deduplicate => &mut self.deduplicate,
            SectionName::Group => &mut self.group,
            SectionName::Transfer => &mut self.transfer,
            SectionName::TimestampFormat => &mut self.timestamp_format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "sourceDir", default)]
    pub source_dir: String,
    #[serde(rename = "targetDir", default)]
    pub target_dir: String,
    #[serde(rename = "isDryRun", default = "default_dry_run")]
    pub is_dry_run: bool,
    #[serde(rename = "fileCategory", default)]
    pub file_category: FileCategory,
    #[serde(default = "default_processing_file_limit")]
    pub processing_file_limit: u32,
    #[serde(default = "default_max_preview_files")]
    pub max_preview_files: u32,
    #[serde(flatten)]
    pub sections: Sections,
}

fn default_dry_run() -> bool {
    true
}

fn default_processing_file_limit() -> u32 {
    DEFAULT_PROCESSING_FILE_LIMIT
}

fn default_max_preview_files() -> u32 {
    DEFAULT_MAX_PREVIEW_FILES
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: String::new(),
            target_dir: String::new(),
            is_dry_run: default_dry_run(),
            file_category: FileCategory::All,
            processing_file_limit: DEFAULT_PROCESSING_FILE_LIMIT,
            max_preview_files: DEFAULT_MAX_PREVIEW_FILES,
            sections: Sections::default(),
        }
    }
}

impl PipelineConfig {
    /// Copy of this config with both directories blanked, for local persistence.
    pub fn without_directories(&self) -> Self {
        Self {
            source_dir: String::new(),
            target_dir: String::new(),
            ..self.clone()
        }
    }
}

/// Partial overlay of a [`PipelineConfig`]. Directories are never part of a preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdates {
    #[serde(rename = "fileCategory", default, skip_serializing_if = "Option::is_none")]
    pub file_category: Option<FileCategory>,
    #[serde(rename = "isDryRun", default, skip_serializing_if = "Option::is_none")]
    pub is_dry_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_file_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_preview_files: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<SectionName, Section>,
}

impl ConfigUpdates {
    pub fn is_empty(&self) -> bool {
        self.file_category.is_none()
            && self.is_dry_run.is_none()
            && self.processing_file_limit.is_none()
            && self.max_preview_files.is_none()
            && self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_serializes_with_backend_field_names() {
        let config = PipelineConfig {
            source_dir: "/in".to_string(),
            target_dir: "/out".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["sourceDir"], "/in");
        assert_eq!(value["targetDir"], "/out");
        assert_eq!(value["isDryRun"], true);
        assert_eq!(value["fileCategory"], "all");
        assert_eq!(value["timestamp_format"]["preset"], "pcloud");
        assert_eq!(value["deduplicate"]["faster_process"], true);
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = PipelineConfig::default();
        config
            .sections
            .get_mut(SectionName::Rename)
            .insert("replace_bodyname".to_string(), "trip".into());
        let text = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn without_directories_keeps_settings() {
        let mut config = PipelineConfig {
            source_dir: "/in".to_string(),
            target_dir: "/out".to_string(),
            file_category: FileCategory::Photos,
            ..Default::default()
        };
        config.is_dry_run = false;
        let stripped = config.without_directories();
        assert!(stripped.source_dir.is_empty());
        assert!(stripped.target_dir.is_empty());
        assert_eq!(stripped.file_category, FileCategory::Photos);
        assert!(!stripped.is_dry_run);
    }

    #[test]
    fn section_names_parse_from_wire_keys() {
        assert_eq!(
            "timestamp_format".parse::<SectionName>().unwrap(),
            SectionName::TimestampFormat
        );
        assert!("sourceDir".parse::<SectionName>().is_err());
    }
}
