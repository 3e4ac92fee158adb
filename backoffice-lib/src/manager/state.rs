//! Interaction state held by a collection manager.

use crate::model::Record;
use crate::model::RecordId;
use crate::model::Value;

/// The single mutation awaiting user confirmation or a form submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PendingMutation {
    #[default]
    None,
    /// The edit form is open for this record.
    Edit(Record),
    /// A delete is awaiting confirmation for this record.
    Delete(Record),
}

impl PendingMutation {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingMutation::None)
    }

    /// Returns the record the mutation targets.
    pub fn target(&self) -> Option<&Record> {
        match self {
            PendingMutation::None => None,
            PendingMutation::Edit(record) | PendingMutation::Delete(record) => Some(record),
        }
    }

    /// Returns the identifier of the targeted record.
    pub fn target_id(&self) -> Option<RecordId> {
        self.target().and_then(Record::id)
    }
}

/// Addresses one table cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub id: RecordId,
    pub field: String,
}

impl CellKey {
    pub fn new(id: RecordId, field: impl Into<String>) -> Self {
        Self {
            id,
            field: field.into(),
        }
    }
}

/// Inline edit state of one cell.
///
/// `Idle -> Editing -> Submitting -> Idle | Error`. A failed submit puts
/// `previous` back into the record and keeps the message at the cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellEdit {
    #[default]
    Idle,
    Editing {
        draft: String,
    },
    Submitting {
        draft: String,
        previous: Option<Value>,
    },
    Error {
        message: String,
        previous: Option<Value>,
    },
}

impl CellEdit {
    pub fn is_idle(&self) -> bool {
        matches!(self, CellEdit::Idle)
    }

    /// Returns the draft text while editing or submitting.
    pub fn draft(&self) -> Option<&str> {
        match self {
            CellEdit::Editing { draft } | CellEdit::Submitting { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Returns the error message of a failed submit.
    pub fn error(&self) -> Option<&str> {
        match self {
            CellEdit::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message meant for the person at the table, not for the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_target() {
        let record = Record::with_id(RecordId(3));
        assert_eq!(PendingMutation::None.target_id(), None);
        assert_eq!(PendingMutation::Delete(record.clone()).target_id(), Some(RecordId(3)));
        assert_eq!(PendingMutation::Edit(record).target_id(), Some(RecordId(3)));
    }

    #[test]
    fn test_cell_edit_accessors() {
        let editing = CellEdit::Editing {
            draft: "12".to_string(),
        };
        assert_eq!(editing.draft(), Some("12"));
        assert!(editing.error().is_none());

        let failed = CellEdit::Error {
            message: "nope".to_string(),
            previous: None,
        };
        assert_eq!(failed.error(), Some("nope"));
        assert!(failed.draft().is_none());
        assert!(CellEdit::default().is_idle());
    }
}
