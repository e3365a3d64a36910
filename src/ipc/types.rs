use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::records::{AttendanceRecord, GradeRecord, Nivel, PaymentRecord, Student, Subject};
use crate::store::{DraftOverlay, RecordStore};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}

/// Identity pushed in by the session collaborator; the sidecar does no
/// authentication of its own.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

/// One dashboard session's worth of state: roster/catalog plus the three
/// record stores and their draft overlays. Constructed when a workspace is
/// selected, dropped when the next one is.
#[derive(Default)]
pub struct Session {
    pub roster: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub attendance: RecordStore<AttendanceRecord>,
    pub attendance_drafts: DraftOverlay<AttendanceRecord>,
    /// Level the attendance editor is open on; completeness is checked
    /// against this level's active students only.
    pub attendance_nivel: Option<Nivel>,
    pub grades: RecordStore<GradeRecord>,
    pub grade_drafts: DraftOverlay<GradeRecord>,
    pub payments: RecordStore<PaymentRecord>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub actor: Option<Actor>,
    pub session: Session,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            workspace: None,
            db: None,
            actor: None,
            session: Session::default(),
        }
    }
}
