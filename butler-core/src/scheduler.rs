// ABOUTME: Declarative hourly tasks, each bound to its own IANA timezone
// ABOUTME: Loads tasks from TOML and finds the ones due at a given instant, hour granularity

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;

use crate::gear::Params;

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Where a task's messages go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub surface_id: Option<String>,
    pub channel_id: Option<String>,
}

/// A task fired once per day, somewhere in the hour of its `when` time.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: String,
    /// Time of day as "HH:MM", local to `timezone`. Only the hour is used.
    pub when: String,
    /// IANA zone name.
    pub timezone: String,
    pub intent: String,
    pub params: Option<Params>,
    pub output: Option<TaskOutput>,
    pub surface_text: Option<String>,
    pub default_message: Option<String>,
}

impl ScheduledTask {
    pub fn new(name: impl Into<String>, when: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            when: when.into(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            intent: intent.into(),
            params: None,
            output: None,
            surface_text: None,
            default_message: None,
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_output(mut self, surface_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        self.output = Some(TaskOutput {
            surface_id: Some(surface_id.into()),
            channel_id: Some(channel_id.into()),
        });
        self
    }

    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = Some(message.into());
        self
    }

    /// Hour of day the task runs at, in its own timezone.
    pub fn hour_of_day(&self) -> Result<u32> {
        let time = NaiveTime::parse_from_str(self.when.trim(), "%H:%M")
            .with_context(|| format!("Invalid time of day '{}', expected HH:MM", self.when))?;
        Ok(time.hour())
    }

    pub fn time_zone(&self) -> Result<Tz> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }

    /// Whether the task is due in the hour `instant` falls in, seen from the
    /// task's own timezone.
    pub fn is_due<Z: TimeZone>(&self, instant: &DateTime<Z>) -> Result<bool> {
        let hour = self.hour_of_day()?;
        let tz = self.time_zone()?;
        Ok(instant.with_timezone(&tz).hour() == hour)
    }

    /// Message to relay when the gear finished without saying anything.
    pub fn fallback_message(&self) -> Option<&str> {
        self.default_message
            .as_deref()
            .or(self.surface_text.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TasksFile {
    #[serde(default)]
    tasks: Vec<TaskRecord>,
}

#[derive(Debug, Deserialize)]
struct TaskRecord {
    name: String,
    when: String,
    #[serde(default = "default_timezone")]
    timezone: String,
    intent: String,
    params: Option<Params>,
    surface_id: Option<String>,
    surface_channel_id: Option<String>,
    surface_text: Option<String>,
    default_message: Option<String>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<TaskRecord> for ScheduledTask {
    fn from(record: TaskRecord) -> Self {
        let surface_id = non_blank(record.surface_id);
        let channel_id = non_blank(record.surface_channel_id);
        let output = if surface_id.is_none() && channel_id.is_none() {
            None
        } else {
            Some(TaskOutput {
                surface_id,
                channel_id,
            })
        };

        Self {
            name: record.name,
            when: record.when,
            timezone: record.timezone,
            intent: record.intent,
            params: record.params,
            output,
            surface_text: non_blank(record.surface_text),
            default_message: non_blank(record.default_message),
        }
    }
}

/// Immutable, ordered list of scheduled tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskScheduler {
    tasks: Vec<ScheduledTask>,
}

impl TaskScheduler {
    pub fn new(tasks: Vec<ScheduledTask>) -> Self {
        Self { tasks }
    }

    /// Load tasks from a TOML file made of `[[tasks]]` tables.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read tasks file {}", path.display()))?;
        let scheduler = Self::from_toml_str(&content)
            .with_context(|| format!("Cannot parse tasks file {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            count = scheduler.tasks.len(),
            "Loaded scheduled tasks"
        );
        Ok(scheduler)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TasksFile = toml::from_str(content).context("Invalid tasks TOML")?;
        Ok(Self::new(file.tasks.into_iter().map(ScheduledTask::from).collect()))
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks due at `instant`, in registration order.
    ///
    /// Each task compares the hour of `instant` converted to its own timezone
    /// with its declared hour; minutes are ignored. Tasks with an unparseable
    /// time or timezone are skipped and logged.
    pub fn find_due<Z: TimeZone>(&self, instant: &DateTime<Z>) -> Vec<&ScheduledTask> {
        self.tasks
            .iter()
            .filter(|task| match task.is_due(instant) {
                Ok(due) => due,
                Err(e) => {
                    tracing::warn!(task = %task.name, error = %e, "Skipping malformed scheduled task");
                    false
                }
            })
            .collect()
    }

    /// Check every task definition, returning one error line per broken task.
    pub fn validate(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter_map(|task| {
                task.hour_of_day()
                    .and_then(|_| task.time_zone())
                    .err()
                    .map(|e| format!("{}: {}", task.name, e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_of_day_parses_hh_mm() {
        assert_eq!(ScheduledTask::new("t", "08:45", "x").hour_of_day().unwrap(), 8);
        assert_eq!(ScheduledTask::new("t", "23:00", "x").hour_of_day().unwrap(), 23);
        assert!(ScheduledTask::new("t", "25:00", "x").hour_of_day().is_err());
        assert!(ScheduledTask::new("t", "noon", "x").hour_of_day().is_err());
    }

    #[test]
    fn test_unknown_timezone_is_an_error() {
        let task = ScheduledTask::new("t", "08:00", "x").with_timezone("Mars/Olympus");
        assert!(task.time_zone().is_err());
    }

    #[test]
    fn test_fallback_prefers_default_message() {
        let mut task = ScheduledTask::new("t", "08:00", "x");
        assert_eq!(task.fallback_message(), None);
        task.surface_text = Some("surface".to_string());
        assert_eq!(task.fallback_message(), Some("surface"));
        task.default_message = Some("default".to_string());
        assert_eq!(task.fallback_message(), Some("default"));
    }
}
