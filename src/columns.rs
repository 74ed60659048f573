use ratatui::style::Color;

use crate::application::Status;

/// A board column. Rejected applications are tracked but have no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub status: Status,
    pub title: &'static str,
    pub color: Color,
}

pub const COLUMNS: [Column; 3] = [
    Column {
        status: Status::Applied,
        title: "Applied",
        color: Color::Blue,
    },
    Column {
        status: Status::Interviewing,
        title: "Interviewing",
        color: Color::Yellow,
    },
    Column {
        status: Status::Offer,
        title: "Offer",
        color: Color::Green,
    },
];

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Rejected => Color::Red,
        _ => COLUMNS
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.color)
            .unwrap_or(Color::Gray),
    }
}

/// Looks up a drop target by its column id.
pub fn drop_target(column_id: &str) -> Option<Status> {
    Status::parse(column_id).filter(|status| COLUMNS.iter().any(|c| c.status == *status))
}

/// The end of a drag gesture: which card, and which column it was released
/// over (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub record_id: String,
    pub over: Option<String>,
}

impl DragEnd {
    /// Resolves the gesture into a status-change intent. Drops outside a
    /// valid column are discarded.
    pub fn resolve(&self) -> Option<(&str, Status)> {
        let status = self.over.as_deref().and_then(drop_target)?;
        Some((self.record_id.as_str(), status))
    }
}
