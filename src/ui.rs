use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::application::{Application, ApplicationPatch, DeadlineUrgency};
use crate::columns::{status_color, DragEnd, COLUMNS};
use crate::dialog::{ApplicationForm, FormAction, FormField, FormSubmission};
use crate::error::BoardResult;
use crate::gateway::ApplicationGateway;
use crate::kanban_board::{KanbanBoard, Notification, NotificationKind, StatusChange};

const TOAST_TTL: Duration = Duration::from_secs(4);
const NOTES_PREVIEW: usize = 40;

/// Result of a gateway call, sent back to the event loop that owns the board.
#[derive(Debug)]
pub enum Completion {
    Loaded(BoardResult<Vec<Application>>),
    Created(BoardResult<Application>),
    Edited(BoardResult<Application>),
    Deleted { id: String, result: BoardResult<()> },
    StatusChanged { change: StatusChange, result: BoardResult<Application> },
}

/// A card being carried between columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    pub record_id: String,
    pub hover: usize,
}

pub struct App {
    pub board: KanbanBoard,
    gateway: Arc<dyn ApplicationGateway>,
    completions: UnboundedSender<Completion>,
    pub selected_column: usize,
    pub selected_card: usize,
    pub drag: Option<DragState>,
    pub dialog: Option<ApplicationForm>,
    toast: Option<(Notification, Instant)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(board: KanbanBoard, gateway: Arc<dyn ApplicationGateway>) -> (Self, UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Self {
            board,
            gateway,
            completions: tx,
            selected_column: 0,
            selected_card: 0,
            drag: None,
            dialog: None,
            toast: None,
            should_quit: false,
        };
        (app, rx)
    }

    /// Runs a gateway call off the event loop; its outcome comes back as a `Completion`.
    fn spawn<F>(&self, call: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completions.clone();
        tokio::spawn(async move {
            if tx.send(call.await).is_err() {
                debug!("event loop gone; dropping completion");
            }
        });
    }

    pub fn request_load(&mut self) {
        self.board.begin_load();
        let gateway = Arc::clone(&self.gateway);
        let owner = self.board.owner().map(str::to_string);
        self.spawn(async move { Completion::Loaded(gateway.list_all(owner.as_deref()).await) });
    }

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded(result) => self.board.finish_load(result),
            Completion::Created(result) => {
                let outcome = self.board.finish_create(result).map(|_| ());
                self.settle_dialog(outcome);
            }
            Completion::Edited(result) => {
                let outcome = self.board.finish_edit(result).map(|_| ());
                self.settle_dialog(outcome);
            }
            Completion::Deleted { id, result } => {
                self.board.finish_delete(&id, result).ok();
            }
            Completion::StatusChanged { change, result } => match result {
                Ok(_) => self.board.confirm_status_change(&change),
                Err(err) => self.board.rollback_status_change(&change, &err),
            },
        }
        self.refresh_toast();
        self.clamp_selection();
    }

    fn settle_dialog(&mut self, outcome: BoardResult<()>) {
        match outcome {
            Ok(()) => self.dialog = None,
            Err(err) => {
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.submission_failed(&err);
                }
            }
        }
    }

    fn refresh_toast(&mut self) {
        if let Some(latest) = self.board.take_notifications().pop() {
            self.toast = Some((latest, Instant::now()));
        }
    }

    pub fn expire_toast(&mut self) {
        if matches!(&self.toast, Some((_, shown)) if shown.elapsed() >= TOAST_TTL) {
            self.toast = None;
        }
    }

    pub fn toast(&self) -> Option<&Notification> {
        self.toast.as_ref().map(|(n, _)| n)
    }

    fn column_cards(&self, column: usize) -> Vec<&Application> {
        COLUMNS
            .get(column)
            .map(|c| self.board.get_applications_by_status(c.status))
            .unwrap_or_default()
    }

    pub fn selected_application(&self) -> Option<&Application> {
        self.column_cards(self.selected_column)
            .get(self.selected_card)
            .copied()
    }

    fn clamp_selection(&mut self) {
        let len = self.column_cards(self.selected_column).len();
        self.selected_card = self.selected_card.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.dialog.is_some() {
            self.handle_dialog_key(key);
        } else if self.drag.is_some() {
            self.handle_drag_key(key);
        } else {
            self.handle_board_key(key);
        }
        self.refresh_toast();
        self.clamp_selection();
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        // cards are hidden behind the loading screen
        if self.board.is_loading()
            && matches!(key.code, KeyCode::Char('d') | KeyCode::Char('e') | KeyCode::Char(' '))
        {
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('a') => self.dialog = Some(ApplicationForm::new()),
            KeyCode::Char('e') => {
                if let Some(form) = self.selected_application().map(ApplicationForm::edit) {
                    self.dialog = Some(form);
                }
            }
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('r') => self.request_load(),
            KeyCode::Char(' ') => {
                if let Some(record_id) = self.selected_application().map(|a| a.id.clone()) {
                    self.drag = Some(DragState {
                        record_id,
                        hover: self.selected_column,
                    });
                }
            }
            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.selected_card = 0;
                }
            }
            KeyCode::Right => {
                if self.selected_column < COLUMNS.len() - 1 {
                    self.selected_column += 1;
                    self.selected_card = 0;
                }
            }
            KeyCode::Up => {
                if self.selected_card > 0 {
                    self.selected_card -= 1;
                }
            }
            KeyCode::Down => {
                let max_cards = self.column_cards(self.selected_column).len();
                if self.selected_card + 1 < max_cards {
                    self.selected_card += 1;
                }
            }
            _ => {}
        }
    }

    fn handle_drag_key(&mut self, key: KeyEvent) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Left => drag.hover = drag.hover.saturating_sub(1),
            KeyCode::Right => drag.hover = (drag.hover + 1).min(COLUMNS.len() - 1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let over = COLUMNS.get(drag.hover).map(|c| c.status.as_str().to_string());
                let end = DragEnd {
                    record_id: drag.record_id.clone(),
                    over,
                };
                let hover = drag.hover;
                self.drag = None;
                self.selected_column = hover;
                self.drag_end(&end);
            }
            KeyCode::Esc => {
                let end = DragEnd {
                    record_id: drag.record_id.clone(),
                    over: None,
                };
                self.drag = None;
                self.drag_end(&end);
            }
            _ => {}
        }
    }

    /// Applies the drop locally and confirms it with the gateway in the background.
    pub fn drag_end(&mut self, end: &DragEnd) {
        let Some((id, status)) = end.resolve() else {
            return;
        };
        let Some(change) = self.board.begin_status_change(id, status) else {
            return;
        };
        let gateway = Arc::clone(&self.gateway);
        self.spawn(async move {
            let result = gateway
                .update(&change.id, &ApplicationPatch::status(change.next))
                .await;
            Completion::StatusChanged { change, result }
        });
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_application().map(|a| a.id.clone()) else {
            return;
        };
        if self.board.is_deleting(&id) {
            return;
        }
        self.board.begin_delete(&id);
        let gateway = Arc::clone(&self.gateway);
        self.spawn(async move {
            let result = gateway.delete(&id).await;
            Completion::Deleted { id, result }
        });
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        match dialog.handle_key(key) {
            FormAction::None => {}
            FormAction::Close => self.dialog = None,
            FormAction::Submit(submission) => self.submit(submission),
        }
    }

    fn submit(&mut self, submission: FormSubmission) {
        let gateway = Arc::clone(&self.gateway);
        match submission {
            FormSubmission::Create(draft) => match self.board.begin_create(draft) {
                Ok(draft) => self.spawn(async move { Completion::Created(gateway.create(&draft).await) }),
                Err(err) => self.settle_dialog(Err(err)),
            },
            FormSubmission::Edit { id, fields } => match self.board.begin_edit(&id, fields) {
                Ok(patch) => self.spawn(async move { Completion::Edited(gateway.update(&id, &patch).await) }),
                Err(err) => self.settle_dialog(Err(err)),
            },
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(2),
            ])
            .split(f.area());

        self.draw_header(f, chunks[0]);
        if self.board.is_loading() {
            let loading = Paragraph::new("Loading your job applications...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(loading, chunks[1]);
        } else {
            self.draw_columns(f, chunks[1]);
        }
        self.draw_footer(f, chunks[2]);

        if let Some(dialog) = &self.dialog {
            draw_dialog(f, dialog);
        }
    }

    fn draw_header(&self, f: &mut Frame, area: Rect) {
        let summary = self.board.summary();
        let tiles = [
            ("Total Applications", summary.total, Color::White),
            ("Applied", summary.applied, COLUMNS[0].color),
            ("Interviewing", summary.interviewing, COLUMNS[1].color),
            ("Offers", summary.offers, COLUMNS[2].color),
        ];
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Percentage(25); tiles.len()])
            .split(area);

        for (i, (label, count, color)) in tiles.iter().enumerate() {
            let tile = Paragraph::new(vec![
                Line::from(Span::styled(
                    count.to_string(),
                    Style::default().fg(*color).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(*label, Style::default().fg(Color::DarkGray))),
            ])
            .block(Block::default().borders(Borders::ALL).title(if i == 0 {
                " Momentum · Job Tracker "
            } else {
                ""
            }));
            f.render_widget(tile, chunks[i]);
        }
    }

    fn draw_columns(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Percentage(33),
                Constraint::Percentage(33),
                Constraint::Percentage(34),
            ])
            .split(area);
        let today = Local::now().date_naive();

        for (i, column) in COLUMNS.iter().enumerate() {
            let cards = self.board.get_applications_by_status(column.status);
            let items: Vec<ListItem> = cards
                .iter()
                .map(|a| ListItem::new(card_lines(a, today, self.board.is_deleting(&a.id))))
                .collect();

            let hovered = self.drag.as_ref().is_some_and(|d| d.hover == i);
            let focused = self.drag.is_none() && self.selected_column == i;
            let border_style = if hovered {
                Style::default().fg(column.color).add_modifier(Modifier::BOLD)
            } else if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let title = if hovered {
                format!(" {} ({}) · drop here ", column.title, cards.len())
            } else {
                format!(" {} ({}) ", column.title, cards.len())
            };

            let list = List::new(items)
                .block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .border_style(border_style),
                )
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

            let mut state = ListState::default();
            if focused && !cards.is_empty() {
                state.select(Some(self.selected_card));
            }
            f.render_stateful_widget(list, chunks[i], &mut state);
        }

        if self.board.is_empty() {
            let hint = Paragraph::new(vec![
                Line::from(Span::styled(
                    "No job applications yet",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from("Start tracking your job search momentum by adding your first application."),
                Line::from("Press 'a' to add one."),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            f.render_widget(hint, centered(area, 60, 5));
        }
    }

    fn draw_footer(&self, f: &mut Frame, area: Rect) {
        let status_line = match (&self.drag, self.toast()) {
            (Some(drag), _) => {
                let carried = self
                    .board
                    .get(&drag.record_id)
                    .map(|a| format!("{} at {}", a.role, a.company))
                    .unwrap_or_default();
                Line::from(Span::styled(
                    format!("Moving {carried}: ←/→ choose column, space to drop, esc to cancel"),
                    Style::default().fg(Color::Cyan),
                ))
            }
            (None, Some(toast)) => {
                let color = match toast.kind {
                    NotificationKind::Success => Color::Green,
                    NotificationKind::Error => Color::Red,
                };
                Line::from(Span::styled(toast.message.clone(), Style::default().fg(color)))
            }
            (None, None) => Line::from(""),
        };
        let help = Line::from(Span::styled(
            "a add · e edit · d delete · space move · ←/→/↑/↓ select · r reload · q quit",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(Paragraph::new(vec![status_line, help]), area);
    }
}

fn card_lines(application: &Application, today: NaiveDate, deleting: bool) -> Vec<Line<'static>> {
    let badge_color = status_color(application.status);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {:<2} ", application.initials()),
                Style::default().fg(Color::Black).bg(badge_color),
            ),
            Span::raw(" "),
            Span::styled(
                application.role.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(format!("     {}", application.company)),
        Line::from(Span::styled(
            format!("     Applied {}", application.applied_on.format("%b %-d, %Y")),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if let Some(badge) = application.deadline_badge(today) {
        let color = match badge.urgency {
            DeadlineUrgency::Overdue => Color::Red,
            DeadlineUrgency::DueSoon => Color::Yellow,
            DeadlineUrgency::Future => Color::DarkGray,
        };
        lines.push(Line::from(Span::styled(
            format!("     Deadline: {}", badge.text()),
            Style::default().fg(color),
        )));
    }

    if let Some(notes) = application.notes.as_deref().and_then(|n| n.lines().next()) {
        let mut preview: String = notes.chars().take(NOTES_PREVIEW).collect();
        if notes.chars().count() > NOTES_PREVIEW {
            preview.push('…');
        }
        lines.push(Line::from(Span::styled(
            format!("     {preview}"),
            Style::default().fg(Color::Gray),
        )));
    }

    let marker = if deleting {
        Span::styled("     Deleting...", Style::default().fg(Color::Red))
    } else {
        Span::styled(
            format!("     [{}]", application.status.label()),
            Style::default().fg(badge_color),
        )
    };
    lines.push(Line::from(marker));
    lines.push(Line::from(""));
    lines
}

fn draw_dialog(f: &mut Frame, dialog: &ApplicationForm) {
    let area = centered(f.area(), 60, 17);
    f.render_widget(Clear, area);

    let mut lines = Vec::new();
    for field in [
        FormField::Company,
        FormField::Role,
        FormField::Status,
        FormField::Deadline,
        FormField::Notes,
    ] {
        let focused = dialog.focus == field;
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if focused && field != FormField::Status { "▏" } else { "" };
        lines.push(Line::from(Span::styled(field.label(), label_style)));
        lines.push(Line::from(format!("  {}{cursor}", dialog.value(field))));
    }
    lines.push(Line::from(""));
    if let Some(error) = &dialog.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    let hint = if dialog.submitting {
        "Saving..."
    } else if dialog.editing.is_some() {
        "enter update · tab next field · esc cancel"
    } else {
        "enter add · tab next field · esc cancel"
    };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));

    let form = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" {} ", dialog.title()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(form, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    completions: &mut UnboundedReceiver<Completion>,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    app.request_load();

    while !app.should_quit {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err),
                None => return Ok(()),
            },
            Some(completion) = completions.recv() => app.apply(completion),
            _ = tick.tick() => app.expire_toast(),
        }
    }
    Ok(())
}
