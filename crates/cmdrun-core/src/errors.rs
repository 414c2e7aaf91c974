use cmdrun_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using CmdRunError
pub type Result<T> = std::result::Result<T, CmdRunError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that boundary collaborators use to
/// pick an external status without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,
    InvalidTimestamp,
    InvalidConfig,

    // Lookup
    NotFound,
    AlreadyExists,
    ConstraintViolation,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidTimestamp => "ERR_INVALID_TIMESTAMP",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::InvalidTimestamp
                | ExErrorKind::NotFound
                | ExErrorKind::AlreadyExists
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context so that the boundary can
/// log and report failures uniformly.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    field: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            field: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (command id, workspace name, username)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add the offending wire field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        if let Some(trace_id) = &self.trace_id {
            write!(f, " (trace_id: {})", trace_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for command-run operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmdRunError {
    /// `itime` could not be interpreted as an epoch-millisecond value
    #[error("Invalid itime value: {reason}")]
    InvalidTimestamp { reason: String },

    /// A wire payload failed validation
    #[error("Invalid field '{field}': {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Command not found: {command_id}")]
    CommandNotFound { command_id: i64 },

    #[error("Workspace not found: {name}")]
    WorkspaceNotFound { name: String },

    #[error("Workspace already exists: {name}")]
    WorkspaceExists { name: String },

    #[error("User not found: {username}")]
    UserNotFound { username: String },

    #[error("Username already taken: {username}")]
    UsernameTaken { username: String },

    /// A configuration value is out of range or unparseable
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl CmdRunError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CmdRunError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<CmdRunError> for ExError {
    fn from(err: CmdRunError) -> Self {
        match err {
            CmdRunError::InvalidTimestamp { reason } => ExError::new(ExErrorKind::InvalidTimestamp)
                .with_field("itime")
                .with_message(format!("Invalid Itime Value: {}", reason)),

            CmdRunError::ValidationError { field, reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_field(field)
                    .with_message(reason)
            }

            CmdRunError::CommandNotFound { command_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(command_id.to_string())
                .with_message("Command not found"),

            CmdRunError::WorkspaceNotFound { name } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(name)
                .with_message("Workspace not found"),

            CmdRunError::WorkspaceExists { name } => ExError::new(ExErrorKind::AlreadyExists)
                .with_entity_id(name)
                .with_message("Workspace already exists"),

            CmdRunError::UserNotFound { username } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(username)
                .with_message("User not found"),

            CmdRunError::UsernameTaken { username } => ExError::new(ExErrorKind::AlreadyExists)
                .with_entity_id(username)
                .with_message("Username already taken"),

            CmdRunError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExErrorKind::InvalidTimestamp.code(), "ERR_INVALID_TIMESTAMP");
        assert_eq!(ExErrorKind::NotFound.code(), "ERR_NOT_FOUND");
        assert_eq!(ExErrorKind::Persistence.code(), "ERR_PERSISTENCE");
    }

    #[test]
    fn test_invalid_timestamp_maps_to_itime_field() {
        let err: ExError = CmdRunError::InvalidTimestamp {
            reason: "not a number".to_string(),
        }
        .into();

        assert_eq!(err.kind(), ExErrorKind::InvalidTimestamp);
        assert_eq!(err.field(), Some("itime"));
        assert!(err.kind().is_client_error());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("command_get")
            .with_entity_id("7")
            .with_message("Command not found");

        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_NOT_FOUND]"));
        assert!(rendered.contains("command_get"));
        assert!(rendered.contains("entity_id: 7"));
    }
}
