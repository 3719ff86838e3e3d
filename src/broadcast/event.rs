//! Wire format of everything pushed over the event channel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ClassRecord, Student, StudentUpdates};

/// Server to client event. Persistent events carry the store revision they produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Event {
    /// Full store snapshot; always the first frame on a connection
    FullState {
        revision: i64,
        classes: BTreeMap<String, ClassRecord>,
    },
    ClassCreated {
        revision: i64,
        class_name: String,
        class: ClassRecord,
    },
    ClassDeleted {
        revision: i64,
        class_name: String,
    },
    StudentAdded {
        revision: i64,
        class_name: String,
        student: Student,
    },
    StudentDeleted {
        revision: i64,
        class_name: String,
        student_id: String,
        student_index: usize,
        timestamp: String,
    },
    StudentPointsUpdated {
        revision: i64,
        class_name: String,
        student_id: String,
        points: i64,
        timestamp: String,
    },
    StudentUpdated {
        revision: i64,
        class_name: String,
        student_id: String,
        updates: StudentUpdates,
        timestamp: String,
    },
    WeekReset {
        revision: i64,
        class_name: String,
        timestamp: String,
    },
    AllPointsUpdated {
        revision: i64,
        class_name: String,
        change: i64,
        timestamp: String,
    },
    RolloverOccurred {
        revision: i64,
        class_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_week_key: Option<String>,
        week_key: String,
        timestamp: String,
    },
    /// Ephemeral spotlight on one student
    StudentSelected {
        class_name: String,
        student_index: usize,
        student_id: String,
    },
    /// Ephemeral spotlight cleared
    SelectionCleared { class_name: String },
}

impl Event {
    /// Store revision this event produced, `None` for ephemeral events.
    pub fn revision(&self) -> Option<i64> {
        match self {
            Event::FullState { revision, .. }
            | Event::ClassCreated { revision, .. }
            | Event::ClassDeleted { revision, .. }
            | Event::StudentAdded { revision, .. }
            | Event::StudentDeleted { revision, .. }
            | Event::StudentPointsUpdated { revision, .. }
            | Event::StudentUpdated { revision, .. }
            | Event::WeekReset { revision, .. }
            | Event::AllPointsUpdated { revision, .. }
            | Event::RolloverOccurred { revision, .. } => Some(*revision),
            Event::StudentSelected { .. } | Event::SelectionCleared { .. } => None,
        }
    }
}

/// Client to server intent relayed as an ephemeral event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Spotlight a student; the server picks one at random when no index is given
    SelectRandomStudent {
        class_name: String,
        #[serde(default)]
        student_index: Option<usize>,
        #[serde(default)]
        student_id: Option<String>,
    },
    ClearSelection { class_name: String },
}
