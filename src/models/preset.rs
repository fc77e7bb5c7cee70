use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::category::FileCategory;
use crate::models::config::{ConfigUpdates, Section, SectionName, SettingValue};
use crate::models::step::StepId;

/// The neutral preset: no overlays, manual control.
pub const NONE_PRESET_ID: &str = "none";
pub const SAVED_LOGIC_PRESET_ID: &str = "saved-current-logic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config_updates: ConfigUpdates,
    #[serde(default)]
    pub step_updates: BTreeMap<StepId, bool>,
}

impl Preset {
    pub fn none() -> Self {
        Self {
            id: NONE_PRESET_ID.to_string(),
            name: "Manual".to_string(),
            description: "No preset. Every step and setting is under manual control.".to_string(),
            config_updates: ConfigUpdates::default(),
            step_updates: BTreeMap::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.id == NONE_PRESET_ID
    }
}

fn overlay<const N: usize>(entries: [(&str, SettingValue); N]) -> Section {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn steps(enabled: &[StepId]) -> BTreeMap<StepId, bool> {
    StepId::PROCESSING
        .into_iter()
        .map(|id| (id, enabled.contains(&id)))
        .collect()
}

pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::none(),
        Preset {
            id: "pcloud_archive".to_string(),
            name: "pCloud archive".to_string(),
            description: "Full pipeline into a dated archive using pCloud timestamps.".to_string(),
            config_updates: ConfigUpdates {
                file_category: Some(FileCategory::All),
                sections: BTreeMap::from([
                    (
                        SectionName::TimestampFormat,
                        overlay([("preset", "pcloud".into()), ("hour_format_12", true.into())]),
                    ),
                    (SectionName::Prefix, overlay([("add_timestamp", true.into())])),
                ]),
                ..Default::default()
            },
            step_updates: steps(&StepId::PROCESSING),
        },
        Preset {
            id: "google_photos_cleanup".to_string(),
            name: "Google Photos cleanup".to_string(),
            description: "Fix timestamps, drop duplicates and rename photos in place.".to_string(),
            config_updates: ConfigUpdates {
                file_category: Some(FileCategory::Photos),
                sections: BTreeMap::from([(
                    SectionName::TimestampFormat,
                    overlay([
                        ("preset", "google_photos".into()),
                        ("hour_format_12", false.into()),
                    ]),
                )]),
                ..Default::default()
            },
            step_updates: steps(&[StepId::Standardize, StepId::Deduplicate, StepId::Filename]),
        },
        Preset {
            id: "dedupe_only".to_string(),
            name: "Remove duplicates".to_string(),
            description: "Only the duplicate pass, with full content comparison.".to_string(),
            config_updates: ConfigUpdates {
                sections: BTreeMap::from([(
                    SectionName::Deduplicate,
                    overlay([("faster_process", false.into())]),
                )]),
                ..Default::default()
            },
            step_updates: steps(&[StepId::Deduplicate]),
        },
        Preset {
            id: "rename_only".to_string(),
            name: "Rename only".to_string(),
            description: "Apply filename rules without moving anything.".to_string(),
            config_updates: ConfigUpdates::default(),
            step_updates: steps(&[StepId::Filename]),
        },
    ]
}

pub fn find_builtin(id: &str) -> Option<Preset> {
    builtin_presets().into_iter().find(|preset| preset.id == id)
}
