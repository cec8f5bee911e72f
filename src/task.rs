use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TaskId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_id: Option<i64>,
    /// Estimated effort in hours. `None` counts as zero.
    #[serde(default)]
    pub duration_hours: Option<i64>,
    #[serde(default, with = "flexible_datetime")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, with = "flexible_datetime")]
    pub end_date: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, duration_hours: i64) -> Self {
        Self {
            id,
            title: title.into(),
            kit_id: None,
            duration_hours: Some(duration_hours),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_kit(mut self, kit_id: i64) -> Self {
        self.kit_id = Some(kit_id);
        self
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn declared_hours(&self) -> i64 {
        self.duration_hours.unwrap_or(0)
    }

    /// `None` when the hour count does not fit a chrono duration.
    pub fn duration(&self) -> Option<Duration> {
        Duration::try_hours(self.declared_hours())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "finish_to_start",
            DependencyType::StartToStart => "start_to_start",
            DependencyType::FinishToFinish => "finish_to_finish",
            DependencyType::StartToFinish => "start_to_finish",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "finish_to_start" | "fs" => Ok(DependencyType::FinishToStart),
            "start_to_start" | "ss" => Ok(DependencyType::StartToStart),
            "finish_to_finish" | "ff" => Ok(DependencyType::FinishToFinish),
            "start_to_finish" | "sf" => Ok(DependencyType::StartToFinish),
            other => Err(format!("unknown dependency type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub source_task_id: TaskId,
    pub target_task_id: TaskId,
    #[serde(default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    pub fn new(source: TaskId, target: TaskId, dependency_type: DependencyType) -> Self {
        Self {
            source_task_id: source,
            target_task_id: target,
            dependency_type,
            lag_days: 0,
        }
    }

    pub fn finish_to_start(source: TaskId, target: TaskId) -> Self {
        Self::new(source, target, DependencyType::FinishToStart)
    }

    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }

    pub fn lag(&self) -> Option<Duration> {
        Duration::try_days(self.lag_days)
    }
}

pub(crate) mod flexible_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) => super::parse_datetime(&text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time '{text}'"))),
        }
    }
}

pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_duration_counts_as_zero() {
        let mut task = Task::new(1, "Design", 6);
        task.duration_hours = None;
        assert_eq!(task.duration(), Some(Duration::zero()));
    }

    #[test]
    fn dependency_type_parses_long_and_short_forms() {
        assert_eq!(
            "start_to_start".parse::<DependencyType>().unwrap(),
            DependencyType::StartToStart
        );
        assert_eq!("FF".parse::<DependencyType>().unwrap(), DependencyType::FinishToFinish);
        assert!("overlap".parse::<DependencyType>().is_err());
    }

    #[test]
    fn oversized_values_have_no_duration() {
        assert_eq!(Task::new(1, "Forever", i64::MAX / 1000).duration(), None);
        assert_eq!(Dependency::finish_to_start(1, 2).with_lag(i64::MAX / 1000).lag(), None);
    }

    #[test]
    fn task_json_accepts_bare_dates() {
        let task: Task = serde_json::from_str(
            r#"{"id":7,"title":"Deploy","duration_hours":4,"start_date":"2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(task.start_date, parse_datetime("2024-01-01T00:00:00"));
        assert_eq!(task.end_date, None);
    }

    #[test]
    fn dependency_defaults_to_finish_to_start_without_lag() {
        let dep: Dependency =
            serde_json::from_str(r#"{"source_task_id":1,"target_task_id":2}"#).unwrap();
        assert_eq!(dep, Dependency::finish_to_start(1, 2));
        assert_eq!(dep.lag(), Some(Duration::zero()));
    }
}
