use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::category::FileCategory;
use crate::models::config::PipelineConfig;
use crate::models::step::{FileChange, StepId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStepRequest<'a> {
    pub step_id: StepId,
    pub config: &'a PipelineConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunAllRequest<'a> {
    pub steps: &'a [StepId],
    pub config: &'a PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponse {
    pub step_id: StepId,
    pub success: bool,
    #[serde(default)]
    pub processed_files: Vec<FileChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanPathRequest<'a> {
    pub path: &'a str,
    pub category: FileCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPathResponse {
    pub count: u64,
    pub exists: bool,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListFilesRequest<'a> {
    pub path: &'a str,
    pub category: FileCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilesResponse {
    pub success: bool,
    #[serde(default)]
    pub files: Vec<ListedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePathRequest<'a> {
    pub path: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Directory pair remembered for one preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPair {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresetOverrideRequest<'a> {
    pub preset_key: &'a str,
    pub source: &'a str,
    pub target: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetOverridesResponse {
    #[serde(default)]
    pub overrides: BTreeMap<String, PathPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPreset {
    pub id: i64,
    pub name: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomPresetRequest<'a> {
    pub name: &'a str,
    pub source: &'a str,
    pub target: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomPresetsResponse {
    #[serde(default)]
    pub presets: Vec<CustomPreset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomPresetCreated {
    pub preset: CustomPreset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultLocations {
    pub home: String,
    pub desktop: String,
    pub downloads: String,
}
