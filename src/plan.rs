use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlanId = i64;
pub type KitId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReleaseStatus {
    #[default]
    Draft,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KitStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    Blocked,
}

impl KitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KitStatus::NotStarted => "Not Started",
            KitStatus::InProgress => "In Progress",
            KitStatus::Done => "Done",
            KitStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for KitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleasePlan {
    pub id: PlanId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub status: ReleaseStatus,
    #[serde(default)]
    pub release_owner: String,
}

impl ReleasePlan {
    pub fn new(
        id: PlanId,
        name: impl Into<String>,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            start_date,
            end_date,
            status: ReleaseStatus::default(),
            release_owner: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kit {
    pub id: KitId,
    pub release_plan_id: PlanId,
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: KitStatus,
}

impl Kit {
    pub fn new(id: KitId, release_plan_id: PlanId, name: impl Into<String>) -> Self {
        Self {
            id,
            release_plan_id,
            name: name.into(),
            owner: String::new(),
            status: KitStatus::default(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_status(mut self, status: KitStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_use_display_labels_on_the_wire() {
        let kit = Kit::new(1, 1, "Payments").with_status(KitStatus::NotStarted);
        let json = serde_json::to_value(&kit).unwrap();
        assert_eq!(json["status"], "Not Started");
        let status: ReleaseStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(status, ReleaseStatus::InProgress);
    }
}
