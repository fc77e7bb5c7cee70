use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::category::FileCategory;
use crate::models::step::{FileChange, Step};
use crate::services::pipeline_service::PipelineState;

/// One entry per original file name, holding the result of the latest pipeline stage
/// that touched it. Entries keep the order in which files were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manifest {
    entries: Vec<FileChange>,
}

impl Manifest {
    pub fn get(&self, original: &str) -> Option<&FileChange> {
        self.entries.iter().find(|change| change.original == original)
    }

    pub fn entries(&self) -> &[FileChange] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub all: usize,
    pub photos: usize,
    pub video: usize,
    pub audio: usize,
    pub docs: usize,
    pub code: usize,
    pub others: usize,
}

impl FileStats {
    fn record(&mut self, category: FileCategory) {
        self.all += 1;
        match category {
            FileCategory::Photos => self.photos += 1,
            FileCategory::Video => self.video += 1,
            FileCategory::Audio => self.audio += 1,
            FileCategory::Docs => self.docs += 1,
            FileCategory::Code => self.code += 1,
            FileCategory::Others | FileCategory::All => self.others += 1,
        }
    }
}

/// Processing steps with results, in pipeline order regardless of storage order.
fn ranked_steps(state: &PipelineState) -> Vec<&Step> {
    let mut steps: Vec<(usize, &Step)> = state
        .steps()
        .iter()
        .filter(|step| !step.results.is_empty())
        .filter_map(|step| step.id.pipeline_rank().map(|rank| (rank, step)))
        .collect();
    steps.sort_by_key(|(rank, _)| *rank);
    steps.into_iter().map(|(_, step)| step).collect()
}

pub fn build_manifest(state: &PipelineState) -> Manifest {
    let mut entries: Vec<FileChange> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for step in ranked_steps(state) {
        for change in &step.results {
            match index.get(&change.original) {
                Some(&at) => entries[at] = change.clone(),
                None => {
                    index.insert(change.original.clone(), entries.len());
                    entries.push(change.clone());
                }
            }
        }
    }

    Manifest { entries }
}

pub fn file_stats(state: &PipelineState) -> FileStats {
    let mut seen = HashSet::new();
    let mut stats = FileStats::default();
    for step in ranked_steps(state) {
        for change in &step.results {
            if seen.insert(change.original.as_str()) {
                stats.record(FileCategory::classify(&change.original));
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::step::{ChangeStatus, StepId, StepStatus};

    fn change(original: &str, new: &str) -> FileChange {
        FileChange::new(original, new, ChangeStatus::Success)
    }

    fn with_results(entries: &[(StepId, Vec<FileChange>)]) -> PipelineState {
        let mut state = PipelineState::new();
        for (id, results) in entries {
            state.update_step_status(*id, StepStatus::Success, results.clone(), None);
        }
        state
    }

    #[test]
    fn later_stage_wins_for_the_same_file() {
        let state = with_results(&[
            (StepId::Filename, vec![change("x.jpg", "1993-07-12_x.jpg")]),
            (StepId::Standardize, vec![change("x.jpg", "x.jpg")]),
        ]);
        let manifest = build_manifest(&state);
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("x.jpg").unwrap().new, "1993-07-12_x.jpg");
    }

    #[test]
    fn files_only_in_early_stages_are_kept() {
        let state = with_results(&[
            (StepId::Deduplicate, vec![change("a.jpg", "a.jpg"), change("b.mp4", "b.mp4")]),
            (StepId::Transfer, vec![change("b.mp4", "/out/b.mp4")]),
        ]);
        let manifest = build_manifest(&state);
        let names: Vec<_> = manifest.entries().iter().map(|c| c.new.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "/out/b.mp4"]);
    }

    #[test]
    fn empty_pipeline_has_empty_manifest() {
        assert!(build_manifest(&PipelineState::new()).is_empty());
        assert_eq!(file_stats(&PipelineState::new()), FileStats::default());
    }

    #[test]
    fn stats_count_unique_originals_by_category() {
        let state = with_results(&[
            (
                StepId::Standardize,
                vec![
                    change("a.JPG", "a.jpg"),
                    change("clip.mov", "clip.mov"),
                    change("notes.pdf", "notes.pdf"),
                    change("README", "README"),
                ],
            ),
            (
                StepId::Group,
                vec![change("a.JPG", "2024/a.jpg"), change("main.rs", "main.rs")],
            ),
        ]);
        let stats = file_stats(&state);
        assert_eq!(
            stats,
            FileStats {
                all: 5,
                photos: 1,
                video: 1,
                audio: 0,
                docs: 1,
                code: 1,
                others: 1,
            }
        );
    }
}
