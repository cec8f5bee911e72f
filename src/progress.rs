use crate::plan::{Kit, KitStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnerProgress {
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressDetails {
    pub total_kits: usize,
    pub completed_kits: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub owner_progress: BTreeMap<String, OwnerProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseProgress {
    pub progress_percentage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ProgressDetails>,
}

pub fn compute_release_progress(kits: &[Kit]) -> ReleaseProgress {
    if kits.is_empty() {
        return ReleaseProgress::default();
    }

    let mut details = ProgressDetails {
        total_kits: kits.len(),
        ..ProgressDetails::default()
    };
    for kit in kits {
        let done = kit.status == KitStatus::Done;
        if done {
            details.completed_kits += 1;
        }
        *details
            .status_counts
            .entry(kit.status.as_str().to_string())
            .or_insert(0) += 1;
        let owner = details.owner_progress.entry(kit.owner.clone()).or_default();
        owner.total += 1;
        if done {
            owner.completed += 1;
        }
    }

    let progress_percentage = (details.completed_kits * 100 / details.total_kits) as u32;
    ReleaseProgress {
        progress_percentage,
        details: Some(details),
    }
}
