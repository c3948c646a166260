use serde::Serialize;

/// Whether a registered unit is at or below the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Done,
    Todo,
}

impl MigrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::Done => "done",
            MigrationState::Todo => "todo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// 1-based registry position.
    pub position: usize,
    pub name: String,
    pub label: String,
    pub state: MigrationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListReport {
    pub cursor: u64,
    pub entries: Vec<MigrationStatus>,
}

impl ListReport {
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == MigrationState::Todo)
            .count()
    }
}

/// Outcome of a completed `up` run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpReport {
    pub cursor_before: u64,
    pub cursor_after: u64,
    pub applied: Vec<usize>,
    pub skipped: Vec<usize>,
}

/// Outcome of a completed `down` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownReport {
    /// Cursor was already 0.
    Noop,
    Reverted {
        position: usize,
        name: String,
        cursor: u64,
    },
}
