use std::collections::BTreeMap;

use crate::models::config::{ConfigUpdates, PipelineConfig, SectionName};
use crate::models::preset::{Preset, NONE_PRESET_ID, SAVED_LOGIC_PRESET_ID};
use crate::services::pipeline_service::{PipelineEvent, PipelineState};

/// Step toggles and setting edits are only legal while no preset is active.
pub fn is_locked(active_preset_id: &str) -> bool {
    active_preset_id != NONE_PRESET_ID
}

/// Overlays `updates` on `config`. Scalars replace; sections merge one level deep,
/// overriding only the keys the update names.
pub fn merge_config(config: &PipelineConfig, updates: &ConfigUpdates) -> PipelineConfig {
    let mut merged = config.clone();
    if let Some(category) = updates.file_category {
        merged.file_category = category;
    }
    if let Some(dry_run) = updates.is_dry_run {
        merged.is_dry_run = dry_run;
    }
    if let Some(limit) = updates.processing_file_limit {
        merged.processing_file_limit = limit;
    }
    if let Some(limit) = updates.max_preview_files {
        merged.max_preview_files = limit;
    }
    for (name, overlay) in &updates.sections {
        let section = merged.sections.get_mut(*name);
        for (key, value) in overlay {
            section.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Step mutations a preset implies, in a form the pipeline store accepts.
pub fn step_events(preset: &Preset) -> Vec<PipelineEvent> {
    preset
        .step_updates
        .iter()
        .filter(|(id, _)| !id.is_structural())
        .map(|(id, enabled)| PipelineEvent::EnablementSet {
            id: *id,
            enabled: *enabled,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresetPlan {
    pub config: PipelineConfig,
    pub step_events: Vec<PipelineEvent>,
}

#[derive(Debug, Clone)]
pub struct PresetResolver {
    active_preset_id: String,
    saved_logic: Option<Preset>,
}

impl Default for PresetResolver {
    fn default() -> Self {
        Self::new(NONE_PRESET_ID.to_string(), None)
    }
}

impl PresetResolver {
    pub fn new(active_preset_id: String, saved_logic: Option<Preset>) -> Self {
        Self {
            active_preset_id,
            saved_logic,
        }
    }

    pub fn active_preset_id(&self) -> &str {
        &self.active_preset_id
    }

    pub fn is_locked(&self) -> bool {
        is_locked(&self.active_preset_id)
    }

    pub fn saved_logic(&self) -> Option<&Preset> {
        self.saved_logic.as_ref()
    }

    /// Computes the preset's effect and marks it active. Callers commit the plan.
    pub fn plan(&mut self, config: &PipelineConfig, preset: &Preset) -> PresetPlan {
        self.active_preset_id = preset.id.clone();
        PresetPlan {
            config: merge_config(config, &preset.config_updates),
            step_events: step_events(preset),
        }
    }

    pub fn apply_preset(
        &mut self,
        config: &PipelineConfig,
        steps: &PipelineState,
        preset: &Preset,
    ) -> (PipelineConfig, PipelineState) {
        let plan = self.plan(config, preset);
        let mut next = steps.clone();
        for event in plan.step_events {
            next.apply(event);
        }
        (plan.config, next)
    }

    /// Snapshots everything but the directories as a preset and locks onto it.
    pub fn save_current_logic(&mut self, config: &PipelineConfig, steps: &PipelineState) -> Preset {
        let sections = SectionName::ALL
            .into_iter()
            .map(|name| (name, config.sections.get(name).clone()))
            .collect();
        let step_updates: BTreeMap<_, _> = steps
            .steps()
            .iter()
            .filter(|step| !step.id.is_structural())
            .map(|step| (step.id, step.enabled))
            .collect();

        let preset = Preset {
            id: SAVED_LOGIC_PRESET_ID.to_string(),
            name: "Saved current logic".to_string(),
            description: "Manual configuration saved from the pipeline editor.".to_string(),
            config_updates: ConfigUpdates {
                file_category: Some(config.file_category),
                is_dry_run: Some(config.is_dry_run),
                processing_file_limit: Some(config.processing_file_limit),
                max_preview_files: Some(config.max_preview_files),
                sections,
            },
            step_updates,
        };
        self.saved_logic = Some(preset.clone());
        self.active_preset_id = preset.id.clone();
        preset
    }

    /// Re-applies the saved snapshot through the ordinary preset path.
    pub fn use_saved_logic(&mut self, config: &PipelineConfig) -> Option<PresetPlan> {
        let preset = self.saved_logic.clone()?;
        Some(self.plan(config, &preset))
    }
}
