use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};

use crate::application::{Application, ApplicationDraft, ApplicationFields, Status};
use crate::error::{BoardError, BoardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Company,
    Role,
    Status,
    Deadline,
    Notes,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Company,
        FormField::Role,
        FormField::Status,
        FormField::Deadline,
        FormField::Notes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Company => "Company *",
            FormField::Role => "Role *",
            FormField::Status => "Status",
            FormField::Deadline => "Deadline (YYYY-MM-DD)",
            FormField::Notes => "Notes",
        }
    }

    fn step(self, by: isize) -> FormField {
        let len = Self::ORDER.len() as isize;
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(index + by).rem_euclid(len) as usize]
    }
}

/// What a submitted form asks the board to do.
#[derive(Debug, Clone, PartialEq)]
pub enum FormSubmission {
    Create(ApplicationDraft),
    Edit { id: String, fields: ApplicationFields },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    None,
    Close,
    Submit(FormSubmission),
}

/// Add/edit dialog state. Values survive failed submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationForm {
    pub editing: Option<String>,
    pub company: String,
    pub role: String,
    pub status: Status,
    pub deadline: String,
    pub notes: String,
    pub focus: FormField,
    pub submitting: bool,
    pub error: Option<String>,
}

impl ApplicationForm {
    pub fn new() -> Self {
        Self {
            editing: None,
            company: String::new(),
            role: String::new(),
            status: Status::Applied,
            deadline: String::new(),
            notes: String::new(),
            focus: FormField::Company,
            submitting: false,
            error: None,
        }
    }

    pub fn edit(application: &Application) -> Self {
        Self {
            editing: Some(application.id.clone()),
            company: application.company.clone(),
            role: application.role.clone(),
            status: application.status,
            deadline: application
                .deadline
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            notes: application.notes.clone().unwrap_or_default(),
            ..Self::new()
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Job Application"
        } else {
            "Add New Job Application"
        }
    }

    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Company => self.company.clone(),
            FormField::Role => self.role.clone(),
            FormField::Status => format!("< {} >", self.status.label()),
            FormField::Deadline => self.deadline.clone(),
            FormField::Notes => self.notes.clone(),
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Company => Some(&mut self.company),
            FormField::Role => Some(&mut self.role),
            FormField::Deadline => Some(&mut self.deadline),
            FormField::Notes => Some(&mut self.notes),
            FormField::Status => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if self.submitting {
            return match key.code {
                KeyCode::Esc => FormAction::Close,
                _ => FormAction::None,
            };
        }
        match key.code {
            KeyCode::Esc => return FormAction::Close,
            KeyCode::Enter => {
                return match self.submission() {
                    Ok(submission) => {
                        self.error = None;
                        self.submitting = true;
                        FormAction::Submit(submission)
                    }
                    Err(err) => {
                        self.error = Some(err.to_string());
                        FormAction::None
                    }
                };
            }
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.step(1),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.step(-1),
            KeyCode::Left if self.focus == FormField::Status => self.status = self.status.cycle(-1),
            KeyCode::Right if self.focus == FormField::Status => self.status = self.status.cycle(1),
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.text_mut() {
                    text.push(c);
                }
            }
            _ => {}
        }
        FormAction::None
    }

    /// A failed submission reopens the form for another attempt.
    pub fn submission_failed(&mut self, err: &BoardError) {
        self.submitting = false;
        self.error = Some(err.to_string());
    }

    pub fn submission(&self) -> BoardResult<FormSubmission> {
        let deadline = parse_deadline(&self.deadline)?;
        let notes = Some(self.notes.trim().to_string()).filter(|n| !n.is_empty());
        let company = self.company.trim().to_string();
        let role = self.role.trim().to_string();

        match &self.editing {
            Some(id) => {
                let fields = ApplicationFields {
                    company,
                    role,
                    status: self.status,
                    deadline,
                    notes,
                };
                fields.validate()?;
                Ok(FormSubmission::Edit {
                    id: id.clone(),
                    fields,
                })
            }
            None => {
                let draft = ApplicationDraft {
                    company,
                    role,
                    status: self.status,
                    deadline,
                    notes,
                    ..ApplicationDraft::default()
                };
                draft.validate()?;
                Ok(FormSubmission::Create(draft))
            }
        }
    }
}

impl Default for ApplicationForm {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_deadline(raw: &str) -> BoardResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BoardError::Validation(format!("deadline '{raw}' is not a YYYY-MM-DD date")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut ApplicationForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_new_form_submits_create_with_defaults() {
        let mut form = ApplicationForm::new();
        type_text(&mut form, "Acme");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "Engineer");

        match form.handle_key(key(KeyCode::Enter)) {
            FormAction::Submit(FormSubmission::Create(draft)) => {
                assert_eq!(draft.company, "Acme");
                assert_eq!(draft.role, "Engineer");
                assert_eq!(draft.status, Status::Applied);
                assert!(draft.deadline.is_none());
                assert!(draft.notes.is_none());
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert!(form.submitting);
    }

    #[test]
    fn test_missing_role_blocks_submission_and_keeps_values() {
        let mut form = ApplicationForm::new();
        type_text(&mut form, "Acme");

        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::None);
        assert_eq!(form.company, "Acme");
        assert!(form.error.as_deref().unwrap().contains("role"));
        assert!(!form.submitting);
    }

    #[test]
    fn test_bad_deadline_blocks_submission() {
        let mut form = ApplicationForm::new();
        form.company = "Acme".into();
        form.role = "Engineer".into();
        form.deadline = "next friday".into();

        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::None);
        assert!(form.error.is_some());
    }

    #[test]
    fn test_status_field_cycles_all_statuses() {
        let mut form = ApplicationForm::new();
        form.focus = FormField::Status;
        form.handle_key(key(KeyCode::Left));
        assert_eq!(form.status, Status::Rejected);
        form.handle_key(key(KeyCode::Char('x')));
        assert_eq!(form.company, "");
    }

    #[test]
    fn test_edit_form_round_trips_record_fields() {
        let application = Application {
            id: "a1".into(),
            owner: None,
            company: "Acme".into(),
            role: "Engineer".into(),
            status: Status::Offer,
            deadline: NaiveDate::from_ymd_opt(2030, 2, 1),
            applied_on: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            notes: Some("negotiating".into()),
            created_at: Default::default(),
            updated_at: Default::default(),
        };
        let form = ApplicationForm::edit(&application);
        assert_eq!(form.title(), "Edit Job Application");
        assert_eq!(form.deadline, "2030-02-01");

        match form.submission().unwrap() {
            FormSubmission::Edit { id, fields } => {
                assert_eq!(id, "a1");
                assert_eq!(fields, ApplicationFields::of(&application));
            }
            other => panic!("unexpected submission {other:?}"),
        }
    }

    #[test]
    fn test_failed_submission_reopens_form() {
        let mut form = ApplicationForm::new();
        form.company = "Acme".into();
        form.role = "Engineer".into();
        form.handle_key(key(KeyCode::Enter));

        form.submission_failed(&BoardError::Transport("offline".into()));

        assert!(!form.submitting);
        assert_eq!(form.company, "Acme");
        assert!(form.error.is_some());
    }
}
