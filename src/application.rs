use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// Where an application currently stands. Determines its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Applied,
    Interviewing,
    Offer,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Applied,
        Status::Interviewing,
        Status::Offer,
        Status::Rejected,
    ];

    /// Wire / column identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Applied => "applied",
            Status::Interviewing => "interviewing",
            Status::Offer => "offer",
            Status::Rejected => "rejected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Applied => "Applied",
            Status::Interviewing => "Interviewing",
            Status::Offer => "Offer",
            Status::Rejected => "Rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Cycles through all four statuses, wrapping at either end.
    pub fn cycle(self, step: isize) -> Status {
        let len = Status::ALL.len() as isize;
        let index = Status::ALL.iter().position(|s| *s == self).unwrap_or(0) as isize;
        Status::ALL[(index + step).rem_euclid(len) as usize]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job application, as stored remotely.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Application {
    pub id: String,
    #[serde(rename = "user_id", default)]
    pub owner: Option<String>,
    #[serde(rename = "company_name")]
    pub company: String,
    #[serde(rename = "role_title")]
    pub role: String,
    pub status: Status,
    pub deadline: Option<NaiveDate>,
    #[serde(rename = "application_date")]
    pub applied_on: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn initials(&self) -> String {
        company_initials(&self.company)
    }

    pub fn deadline_badge(&self, today: NaiveDate) -> Option<DeadlineBadge> {
        self.deadline.map(|deadline| DeadlineBadge::compute(deadline, today))
    }

    /// Applies the fields present in `patch`.
    pub fn apply(&mut self, patch: &ApplicationPatch) {
        if let Some(company) = &patch.company {
            self.company = company.clone();
        }
        if let Some(role) = &patch.role {
            self.role = role.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
    }
}

/// A new application before the gateway has assigned it an id.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ApplicationDraft {
    #[serde(rename = "user_id", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "company_name")]
    pub company: String,
    #[serde(rename = "role_title")]
    pub role: String,
    pub status: Status,
    pub deadline: Option<NaiveDate>,
    #[serde(rename = "application_date", skip_serializing_if = "Option::is_none")]
    pub applied_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ApplicationDraft {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> BoardResult<()> {
        require_text("company", &self.company)?;
        require_text("role", &self.role)
    }
}

/// Full replacement of the user-editable fields of an application.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationFields {
    pub company: String,
    pub role: String,
    pub status: Status,
    pub deadline: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ApplicationFields {
    pub fn of(application: &Application) -> Self {
        Self {
            company: application.company.clone(),
            role: application.role.clone(),
            status: application.status,
            deadline: application.deadline,
            notes: application.notes.clone(),
        }
    }

    pub fn validate(&self) -> BoardResult<()> {
        require_text("company", &self.company)?;
        require_text("role", &self.role)
    }
}

/// Partial update sent to the gateway. `None` leaves a field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct ApplicationPatch {
    #[serde(rename = "company_name", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "role_title", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl ApplicationPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl From<ApplicationFields> for ApplicationPatch {
    fn from(fields: ApplicationFields) -> Self {
        Self {
            company: Some(fields.company),
            role: Some(fields.role),
            status: Some(fields.status),
            deadline: Some(fields.deadline),
            notes: Some(fields.notes),
        }
    }
}

fn require_text(field: &str, value: &str) -> BoardResult<()> {
    if value.trim().is_empty() {
        return Err(BoardError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineUrgency {
    Overdue,
    DueSoon,
    Future,
}

/// Countdown shown on a card with a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineBadge {
    pub days_left: i64,
    pub urgency: DeadlineUrgency,
}

impl DeadlineBadge {
    const DUE_SOON_DAYS: i64 = 3;

    pub fn compute(deadline: NaiveDate, today: NaiveDate) -> Self {
        let days_left = (deadline - today).num_days();
        let urgency = if days_left < 0 {
            DeadlineUrgency::Overdue
        } else if days_left <= Self::DUE_SOON_DAYS {
            DeadlineUrgency::DueSoon
        } else {
            DeadlineUrgency::Future
        };
        Self { days_left, urgency }
    }

    pub fn text(&self) -> String {
        match self.urgency {
            DeadlineUrgency::Overdue => "Overdue".to_string(),
            _ => format!("{} days left", self.days_left),
        }
    }
}

/// First letter of up to the first two words, uppercased.
pub fn company_initials(company: &str) -> String {
    company
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(json!(Status::Interviewing), json!("interviewing"));
        let parsed: Status = serde_json::from_value(json!("offer")).unwrap();
        assert_eq!(parsed, Status::Offer);
        assert!(serde_json::from_value::<Status>(json!("ghosted")).is_err());
    }

    #[test]
    fn test_status_cycle_wraps() {
        assert_eq!(Status::Applied.cycle(1), Status::Interviewing);
        assert_eq!(Status::Applied.cycle(-1), Status::Rejected);
        assert_eq!(Status::Rejected.cycle(1), Status::Applied);
    }

    #[test]
    fn test_application_reads_wire_names() {
        let row = json!({
            "id": "a1",
            "user_id": "u1",
            "company_name": "Acme",
            "role_title": "Engineer",
            "status": "applied",
            "deadline": null,
            "application_date": "2024-03-01",
            "notes": "referral",
            "created_at": "2024-03-01T10:00:00.123456+00:00",
            "updated_at": "2024-03-01T10:00:00+00:00"
        });
        let app: Application = serde_json::from_value(row).unwrap();
        assert_eq!(app.company, "Acme");
        assert_eq!(app.role, "Engineer");
        assert_eq!(app.owner.as_deref(), Some("u1"));
        assert_eq!(app.applied_on, date(2024, 3, 1));
        assert!(app.deadline.is_none());
    }

    #[test]
    fn test_draft_omits_unset_owner_and_date() {
        let draft = ApplicationDraft::new("Acme", "Engineer");
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("user_id").is_none());
        assert!(value.get("application_date").is_none());
        assert_eq!(value["status"], "applied");
        assert_eq!(value["company_name"], "Acme");
    }

    #[test]
    fn test_draft_validation_requires_company_and_role() {
        assert!(ApplicationDraft::new("Acme", "Engineer").validate().is_ok());
        let err = ApplicationDraft::new("  ", "Engineer").validate().unwrap_err();
        assert!(matches!(err, BoardError::Validation(msg) if msg.contains("company")));
        let err = ApplicationDraft::new("Acme", "").validate().unwrap_err();
        assert!(matches!(err, BoardError::Validation(msg) if msg.contains("role")));
    }

    #[test]
    fn test_status_patch_serializes_only_status() {
        let value = serde_json::to_value(ApplicationPatch::status(Status::Offer)).unwrap();
        assert_eq!(value, json!({ "status": "offer" }));
    }

    #[test]
    fn test_full_patch_clears_nullable_fields() {
        let patch = ApplicationPatch::from(ApplicationFields {
            company: "Acme".into(),
            role: "Engineer".into(),
            status: Status::Applied,
            deadline: None,
            notes: None,
        });
        let value = serde_json::to_value(patch).unwrap();
        assert_eq!(value["deadline"], json!(null));
        assert_eq!(value["notes"], json!(null));
    }

    #[test]
    fn test_deadline_badge_thresholds() {
        let today = date(2024, 5, 10);
        let overdue = DeadlineBadge::compute(date(2024, 5, 9), today);
        assert_eq!(overdue.urgency, DeadlineUrgency::Overdue);
        assert_eq!(overdue.text(), "Overdue");

        let due_today = DeadlineBadge::compute(today, today);
        assert_eq!(due_today.urgency, DeadlineUrgency::DueSoon);
        assert_eq!(due_today.text(), "0 days left");

        assert_eq!(
            DeadlineBadge::compute(date(2024, 5, 13), today).urgency,
            DeadlineUrgency::DueSoon
        );
        let later = DeadlineBadge::compute(date(2024, 5, 14), today);
        assert_eq!(later.urgency, DeadlineUrgency::Future);
        assert_eq!(later.text(), "4 days left");
    }

    #[test]
    fn test_company_initials() {
        assert_eq!(company_initials("Acme"), "A");
        assert_eq!(company_initials("open ai labs"), "OA");
        assert_eq!(company_initials(""), "");
    }
}
