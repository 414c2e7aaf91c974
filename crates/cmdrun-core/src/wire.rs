//! Wire mapping for command records
//!
//! Inbound payloads are validated into a [`CommandPatch`] before anything
//! touches a record, so a rejected write never leaves partial changes.
//! Outbound records become a [`CommandView`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LifecycleConfig;
use crate::errors::{CmdRunError, Result};
use crate::lifecycle::{
    compute_display_duration, decode_timestamp, encode_timestamp,
    resolve_end_date_from_duration, DisplayDuration,
};
use crate::model::{
    AuditMetadata, CommandId, CommandRecord, NewCommand, UserId, WorkspaceId,
};

const MISSING_FIELD: &str = "Missing data for required field.";

/// Create/update payload as received from the boundary
///
/// `_id`, `workspace`, `creator` and `metadata` are output-only; they are
/// accepted so a client may echo a read response back, and then ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandPayload {
    pub command: Option<String>,
    pub itime: Option<Value>,
    pub duration: Option<Value>,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub params: Option<String>,
    pub user: Option<String>,
    pub tool: Option<String>,
    pub import_source: Option<String>,

    #[serde(rename = "_id")]
    pub id: Option<Value>,
    pub workspace: Option<Value>,
    pub creator: Option<Value>,
    pub metadata: Option<Value>,
}

impl CommandPayload {
    /// Parse a JSON payload
    ///
    /// # Errors
    ///
    /// `ValidationError` on malformed JSON or wrongly typed fields.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CmdRunError::validation("payload", e.to_string()))
    }

    /// Names of output-only fields present in the payload
    pub fn read_only_fields(&self) -> Vec<&'static str> {
        [
            ("_id", self.id.is_some()),
            ("workspace", self.workspace.is_some()),
            ("creator", self.creator.is_some()),
            ("metadata", self.metadata.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    /// Decode and check every writable field
    ///
    /// # Errors
    ///
    /// - `InvalidTimestamp` if `itime` is present but not a valid epoch value
    /// - `ValidationError` if `duration` is neither a number, null, nor a sentinel label
    pub fn validate(self) -> Result<CommandPatch> {
        let ignored = self.read_only_fields();
        if !ignored.is_empty() {
            tracing::debug!(fields = ?ignored, "ignoring read-only fields in payload");
        }

        let start_date = self.itime.as_ref().map(parse_itime).transpose()?;
        let duration_secs = match self.duration.as_ref() {
            Some(value) => parse_duration(value)?,
            None => None,
        };

        Ok(CommandPatch {
            command: self.command,
            start_date,
            duration_secs,
            ip: self.ip,
            hostname: self.hostname,
            params: self.params,
            user: self.user,
            tool: self.tool,
            import_source: self.import_source,
        })
    }
}

fn parse_itime(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let ms = n.as_f64().ok_or_else(|| CmdRunError::InvalidTimestamp {
                reason: format!("{} is not representable", n),
            })?;
            decode_timestamp(ms)
        }
        Value::Null => Err(CmdRunError::InvalidTimestamp {
            reason: "itime may not be null".to_string(),
        }),
        other => Err(CmdRunError::InvalidTimestamp {
            reason: format!("{} is not a number", other),
        }),
    }
}

/// Only a non-zero number yields a duration to apply
///
/// The sentinel labels are what a read returns for unfinished runs; echoing
/// them back is treated like omitting the field.
fn parse_duration(value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_f64() {
            Some(secs) if secs == 0.0 => Ok(None),
            Some(secs) => Ok(Some(secs)),
            None => Err(CmdRunError::validation("duration", "not a valid number")),
        },
        Value::String(label)
            if label == DisplayDuration::TIMEOUT_LABEL
                || label == DisplayDuration::IN_PROGRESS_LABEL =>
        {
            Ok(None)
        }
        other => Err(CmdRunError::validation(
            "duration",
            format!("{} is not a number of seconds", other),
        )),
    }
}

/// A validated payload, not yet applied to any record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPatch {
    pub command: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    /// Consumed into `end_date`; never stored as such
    pub duration_secs: Option<f64>,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub params: Option<String>,
    pub user: Option<String>,
    pub tool: Option<String>,
    pub import_source: Option<String>,
}

impl CommandPatch {
    /// Build a new record for `workspace_id`
    ///
    /// # Errors
    ///
    /// `ValidationError` if `itime` or `command` is missing, or the duration
    /// cannot be resolved.
    pub fn into_new_command(
        self,
        workspace_id: WorkspaceId,
        creator_id: Option<UserId>,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<NewCommand> {
        let start_date = self
            .start_date
            .ok_or_else(|| CmdRunError::validation("itime", MISSING_FIELD))?;
        let command = match self.command {
            Some(command) if !command.trim().is_empty() => command,
            Some(_) => return Err(CmdRunError::validation("command", "may not be empty")),
            None => return Err(CmdRunError::validation("command", MISSING_FIELD)),
        };
        let end_date = match self.duration_secs {
            Some(secs) => resolve_end_date_from_duration(start_date, secs)?,
            None => None,
        };

        Ok(NewCommand {
            workspace_id,
            creator_id,
            command,
            user: self.user,
            import_source: self.import_source,
            tool: self.tool,
            params: self.params,
            ip: self.ip,
            hostname: self.hostname,
            start_date,
            end_date,
            metadata: AuditMetadata::created(now, actor),
        })
    }

    /// Apply to an existing record
    ///
    /// Fields absent from the patch keep their stored values. Id, workspace
    /// and creator are never touched.
    ///
    /// # Errors
    ///
    /// `ValidationError` if the result would end before it starts, or the
    /// command is blanked. The record is unchanged on error.
    pub fn apply_to(
        self,
        record: &mut CommandRecord,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let start_date = self.start_date.unwrap_or(record.start_date);
        let end_date = match self.duration_secs {
            Some(secs) => resolve_end_date_from_duration(start_date, secs)?.or(record.end_date),
            None => record.end_date,
        };
        if let Some(end) = end_date {
            if end < start_date {
                return Err(CmdRunError::validation(
                    "itime",
                    "start date is after the recorded end date",
                ));
            }
        }
        if matches!(&self.command, Some(command) if command.trim().is_empty()) {
            return Err(CmdRunError::validation("command", "may not be empty"));
        }

        record.start_date = start_date;
        record.end_date = end_date;
        if let Some(command) = self.command {
            record.command = command;
        }
        overwrite(&mut record.ip, self.ip);
        overwrite(&mut record.hostname, self.hostname);
        overwrite(&mut record.params, self.params);
        overwrite(&mut record.user, self.user);
        overwrite(&mut record.tool, self.tool);
        overwrite(&mut record.import_source, self.import_source);
        record.metadata.touch(now, actor);
        Ok(())
    }
}

fn overwrite(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Audit block as rendered on reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataView {
    pub create_time: i64,
    pub update_time: i64,
    pub creator: Option<String>,
    pub owner: Option<String>,
    pub update_user: Option<String>,
    pub update_action: u8,
    /// Command that produced the object; a command run never has one
    pub command_id: Option<CommandId>,
}

/// Command record as rendered on reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandView {
    #[serde(rename = "_id")]
    pub id: CommandId,
    pub command: String,
    pub duration: DisplayDuration,
    pub itime: i64,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub params: Option<String>,
    pub user: Option<String>,
    pub creator: Option<String>,
    pub workspace: String,
    pub tool: Option<String>,
    pub import_source: Option<String>,
    pub metadata: MetadataView,
}

impl CommandView {
    /// Render `record` with its resolved workspace name and creator username
    pub fn new(
        record: &CommandRecord,
        workspace: &str,
        creator: Option<&str>,
        now: DateTime<Utc>,
        config: &LifecycleConfig,
    ) -> Self {
        let creator = creator.map(str::to_string);
        Self {
            id: record.id,
            command: record.command.clone(),
            duration: compute_display_duration(record.start_date, record.end_date, now, config),
            itime: encode_timestamp(record.start_date),
            ip: record.ip.clone(),
            hostname: record.hostname.clone(),
            params: record.params.clone(),
            user: record.user.clone(),
            creator: creator.clone(),
            workspace: workspace.to_string(),
            tool: record.tool.clone(),
            import_source: record.import_source.clone(),
            metadata: MetadataView {
                create_time: encode_timestamp(record.metadata.create_time),
                update_time: encode_timestamp(record.metadata.update_time),
                creator: creator.clone(),
                owner: creator,
                update_user: record.metadata.update_user.clone(),
                update_action: record.metadata.update_action.code(),
                command_id: None,
            },
        }
    }
}

/// One entry of the list envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandListEntry {
    pub id: CommandId,
    pub key: CommandId,
    pub value: CommandView,
}

/// `{"commands": [{"id", "key", "value"}]}`, the shape list consumers expect
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandListEnvelope {
    pub commands: Vec<CommandListEntry>,
}

impl FromIterator<CommandView> for CommandListEnvelope {
    fn from_iter<I: IntoIterator<Item = CommandView>>(iter: I) -> Self {
        Self {
            commands: iter
                .into_iter()
                .map(|view| CommandListEntry {
                    id: view.id,
                    key: view.id,
                    value: view,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn payload(value: Value) -> CommandPayload {
        serde_json::from_value(value).unwrap()
    }

    fn stored(start: DateTime<Utc>) -> CommandRecord {
        NewCommand {
            workspace_id: 1,
            creator_id: Some(9),
            command: "nmap".to_string(),
            user: Some("alice".to_string()),
            import_source: Some("shell".to_string()),
            tool: Some("nmap".to_string()),
            params: Some("-sV 10.0.0.1".to_string()),
            ip: Some("10.0.0.5".to_string()),
            hostname: Some("kali".to_string()),
            start_date: start,
            end_date: None,
            metadata: AuditMetadata::created(start, Some("alice")),
        }
        .into_record(42)
    }

    #[test]
    fn test_duration_becomes_end_date() {
        let t = 1_717_243_200_000i64;
        let new = payload(json!({"command": "nmap", "itime": t, "duration": 120}))
            .validate()
            .unwrap()
            .into_new_command(1, None, None, now())
            .unwrap();

        let start = DateTime::from_timestamp_millis(t).unwrap();
        assert_eq!(new.start_date, start);
        assert_eq!(new.end_date, Some(start + Duration::seconds(120)));
    }

    #[test]
    fn test_missing_itime_rejected_on_create() {
        let err = payload(json!({"command": "nmap"}))
            .validate()
            .unwrap()
            .into_new_command(1, None, None, now())
            .unwrap_err();

        assert!(matches!(err, CmdRunError::ValidationError { ref field, .. } if field == "itime"));
    }

    #[test]
    fn test_missing_command_rejected_on_create() {
        let err = payload(json!({"itime": 1000}))
            .validate()
            .unwrap()
            .into_new_command(1, None, None, now())
            .unwrap_err();

        assert!(matches!(err, CmdRunError::ValidationError { ref field, .. } if field == "command"));
    }

    #[test]
    fn test_string_itime_is_invalid_timestamp() {
        let err = payload(json!({"command": "nmap", "itime": "yesterday"}))
            .validate()
            .unwrap_err();

        assert!(matches!(err, CmdRunError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_sentinel_duration_is_ignored() {
        let patch = payload(json!({"command": "nmap", "itime": 1000, "duration": "In progress"}))
            .validate()
            .unwrap();

        assert_eq!(patch.duration_secs, None);
    }

    #[test]
    fn test_boolean_duration_rejected() {
        let err = payload(json!({"duration": true})).validate().unwrap_err();
        assert!(matches!(err, CmdRunError::ValidationError { ref field, .. } if field == "duration"));
    }

    #[test]
    fn test_update_with_duration_closes_run() {
        let start = now() - Duration::minutes(5);
        let mut record = stored(start);

        payload(json!({"duration": 30.5}))
            .validate()
            .unwrap()
            .apply_to(&mut record, Some("bob"), now())
            .unwrap();

        assert_eq!(record.end_date, Some(start + Duration::milliseconds(30_500)));
        assert_eq!(record.command, "nmap");
        assert_eq!(record.metadata.update_user.as_deref(), Some("bob"));
    }

    #[test]
    fn test_update_rejects_start_after_end_without_mutating() {
        let start = now() - Duration::minutes(5);
        let mut record = stored(start);
        record.end_date = Some(start + Duration::seconds(10));
        let before = record.clone();

        let later_ms = encode_timestamp(start + Duration::hours(1));
        let err = payload(json!({"itime": later_ms, "command": "changed"}))
            .validate()
            .unwrap()
            .apply_to(&mut record, None, now())
            .unwrap_err();

        assert!(matches!(err, CmdRunError::ValidationError { .. }));
        assert_eq!(record, before);
    }

    #[test]
    fn test_read_only_fields_do_not_alter_record() {
        let start = now() - Duration::minutes(5);
        let mut record = stored(start);
        let view = CommandView::new(&record, "acme", Some("alice"), now(), &LifecycleConfig::default());

        let mut echoed = serde_json::to_value(&view).unwrap();
        echoed["_id"] = json!(999);
        echoed["workspace"] = json!("other");
        echoed["creator"] = json!("mallory");
        let echoed: CommandPayload = serde_json::from_value(echoed).unwrap();
        assert_eq!(echoed.read_only_fields().len(), 4);

        echoed.validate().unwrap().apply_to(&mut record, None, now()).unwrap();

        assert_eq!(record.id, 42);
        assert_eq!(record.workspace_id, 1);
        assert_eq!(record.creator_id, Some(9));
        assert_eq!(record.start_date, start);
        assert_eq!(record.end_date, None);
    }

    #[test]
    fn test_view_shape() {
        let start = now() - Duration::hours(1);
        let record = stored(start);
        let view = CommandView::new(&record, "acme", Some("alice"), now(), &LifecycleConfig::default());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["_id"], 42);
        assert_eq!(json["itime"], encode_timestamp(start));
        assert_eq!(json["duration"], "In progress");
        assert_eq!(json["workspace"], "acme");
        assert_eq!(json["creator"], "alice");
        assert_eq!(json["metadata"]["update_action"], 0);
        assert!(json.get("end_date").is_none());
    }

    #[test]
    fn test_metadata_block_keys() {
        let record = stored(now());
        let view = CommandView::new(&record, "acme", Some("alice"), now(), &LifecycleConfig::default());
        let json = serde_json::to_value(&view).unwrap();
        let metadata = json["metadata"].as_object().unwrap();

        for key in [
            "create_time",
            "update_time",
            "creator",
            "owner",
            "update_user",
            "update_action",
            "command_id",
        ] {
            assert!(metadata.contains_key(key), "missing metadata key {}", key);
        }
        assert!(metadata["command_id"].is_null());
        assert_eq!(metadata["owner"], "alice");
        assert_eq!(metadata["create_time"], encode_timestamp(now()));
    }

    #[test]
    fn test_envelope_keys_entries_by_id() {
        let record = stored(now());
        let view = CommandView::new(&record, "acme", None, now(), &LifecycleConfig::default());
        let envelope: CommandListEnvelope = vec![view].into_iter().collect();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["commands"][0]["id"], 42);
        assert_eq!(json["commands"][0]["key"], 42);
        assert_eq!(json["commands"][0]["value"]["_id"], 42);
    }
}
