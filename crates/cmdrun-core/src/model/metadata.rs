use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last mutation recorded in the audit block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    #[default]
    Create,
    Update,
}

impl UpdateAction {
    /// Numeric code used on the wire (0 = create, 1 = update)
    pub fn code(&self) -> u8 {
        match self {
            UpdateAction::Create => 0,
            UpdateAction::Update => 1,
        }
    }
}

/// Audit block carried by every command record
///
/// Opaque to the lifecycle logic; only passed through to the wire form.
/// Timestamps are persisted as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub create_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub update_time: DateTime<Utc>,
    /// Username of the last actor that modified the record
    pub update_user: Option<String>,
    #[serde(default)]
    pub update_action: UpdateAction,
}

impl AuditMetadata {
    /// Audit block for a record created at `now`
    pub fn created(now: DateTime<Utc>, actor: Option<&str>) -> Self {
        Self {
            create_time: now,
            update_time: now,
            update_user: actor.map(str::to_string),
            update_action: UpdateAction::Create,
        }
    }

    /// Stamp an update performed at `now`
    pub fn touch(&mut self, now: DateTime<Utc>, actor: Option<&str>) {
        self.update_time = now;
        self.update_user = actor.map(str::to_string);
        self.update_action = UpdateAction::Update;
    }
}
