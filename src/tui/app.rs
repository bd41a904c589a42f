//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and coordinates between the
//! hierarchy browser, the task board, and the dialog overlays. Every API
//! call is driven to completion on the runtime before the next key is
//! processed, so mutations are serialized and no completion handler can
//! outlive the view that started it.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Runtime;

use crate::api::ApiClient;
use crate::board::{is_overdue, status_progress, Board};
use crate::comments::CommentThread;
use crate::dates::{format_date, format_date_relative};
use crate::evidence::{file_badge, format_bytes, EvidencePanel};
use crate::fields::{Priority, Status};
use crate::session::Capabilities;
use crate::task::{initials, Employee, NewAnnual, NewMonthly, NewSemester};
use crate::tui::board_form::{BucketForm, TaskForm, PRIORITY_FIELD, STATUS_FIELD};
use crate::tui::colors::{
    priority_color, status_color, ANNUAL_BLUE, BOARD_SLATE, MONTHLY_ORANGE, SEMESTER_PURPLE,
};
use crate::tui::enums::{AppState, NavContext, NavLevel};
use crate::tui::input::InputField;
use crate::tui::utils::centered_rect;

/// One row in the hierarchy browser, regardless of level.
struct BucketRow {
    id: i64,
    number: Option<u32>,
    title: String,
    desc: String,
}

/// Pending destructive action awaiting confirmation.
enum ConfirmAction {
    DeleteEvidence { evidence_id: i64, name: String },
}

/// Main application state for the terminal user interface.
pub struct App<'rt> {
    rt: &'rt Runtime,
    client: ApiClient,
    caps: Capabilities,
    employee: Option<Employee>,

    state: AppState,
    nav: NavContext,
    buckets: Vec<BucketRow>,
    bucket_state: TableState,

    board: Option<Board>,
    task_state: TableState,
    evidence: Option<EvidencePanel>,
    evidence_sel: usize,
    comments: Option<CommentThread>,

    task_form: TaskForm,
    bucket_form: BucketForm,
    comment_input: InputField,
    upload_input: InputField,
    status_pick: usize,
    confirm: Option<ConfirmAction>,
    search_active: bool,
    status_message: String,
}

impl<'rt> App<'rt> {
    pub fn new(
        rt: &'rt Runtime,
        client: ApiClient,
        caps: Capabilities,
        employee: Option<Employee>,
        start_monthly: Option<i64>,
    ) -> Self {
        let mut app = App {
            rt,
            client,
            caps,
            employee,
            state: AppState::Buckets,
            nav: NavContext::default(),
            buckets: Vec::new(),
            bucket_state: TableState::default(),
            board: None,
            task_state: TableState::default(),
            evidence: None,
            evidence_sel: 0,
            comments: None,
            task_form: TaskForm::new(caps),
            bucket_form: BucketForm::new(NavLevel::Annual),
            comment_input: InputField::new(),
            upload_input: InputField::new(),
            status_pick: 0,
            confirm: None,
            search_active: false,
            status_message: String::new(),
        };
        match start_monthly {
            Some(id) => app.open_board(id),
            None => app.load_buckets(),
        }
        app
    }

    // ---- data loading --------------------------------------------------

    fn load_buckets(&mut self) {
        self.status_message.clear();
        let result = match self.nav.level() {
            NavLevel::Annual => self.rt.block_on(self.client.list_annuals()).map(|list| {
                list.into_iter()
                    .map(|a| BucketRow {
                        id: a.id,
                        number: None,
                        title: a.title.unwrap_or_else(|| "—".into()),
                        desc: a.desc.unwrap_or_default(),
                    })
                    .collect()
            }),
            NavLevel::Semester => {
                let project_id = self.nav.annual_id.unwrap_or_default();
                self.rt
                    .block_on(self.client.list_semesters(project_id))
                    .map(|list| {
                        list.into_iter()
                            .map(|s| BucketRow {
                                id: s.id,
                                number: s.semester,
                                title: s.title.unwrap_or_else(|| "—".into()),
                                desc: s.desc.unwrap_or_default(),
                            })
                            .collect()
                    })
            }
            NavLevel::Monthly => {
                let semester_id = self.nav.semester_id.unwrap_or_default();
                self.rt
                    .block_on(self.client.list_monthlies(semester_id))
                    .map(|list| {
                        list.into_iter()
                            .map(|m| BucketRow {
                                id: m.id,
                                number: m.month,
                                title: m.title.unwrap_or_else(|| "—".into()),
                                desc: m.desc.unwrap_or_default(),
                            })
                            .collect()
                    })
            }
        };
        match result {
            Ok(rows) => {
                self.buckets = rows;
                let select = if self.buckets.is_empty() { None } else { Some(0) };
                self.bucket_state.select(select);
            }
            Err(e) => {
                self.buckets.clear();
                self.bucket_state.select(None);
                self.status_message = e.to_string();
            }
        }
    }

    fn open_board(&mut self, monthly_id: i64) {
        let mut board = Board::new(self.client.clone(), self.caps, monthly_id);
        self.rt.block_on(board.load());
        if let Some(err) = &board.error {
            self.status_message = err.clone();
        }
        self.board = Some(board);
        self.state = AppState::Board;
        self.sync_subresources();
    }

    fn reload_board(&mut self) {
        if let Some(board) = self.board.as_mut() {
            self.rt.block_on(board.load());
        }
        self.sync_subresources();
    }

    /// Re-attach the evidence panel and comment thread to whichever task
    /// is currently selected. Comments only refetch when the selection
    /// actually moved; evidence re-seeds from the freshly loaded task.
    fn sync_subresources(&mut self) {
        let target = self
            .board
            .as_ref()
            .and_then(|b| b.selected_task())
            .map(|t| (t.id, t.evidence_files.clone()));
        match target {
            Some((task_id, files)) => {
                let moved = self.comments.as_ref().map_or(true, |c| c.task_id != task_id);
                self.evidence = Some(EvidencePanel::new(self.client.clone(), task_id, files));
                self.evidence_sel = 0;
                if moved {
                    let mut thread = CommentThread::new(self.client.clone(), task_id);
                    self.rt.block_on(thread.load());
                    self.comments = Some(thread);
                }
            }
            None => {
                self.evidence = None;
                self.comments = None;
            }
        }
    }

    // ---- selection helpers ---------------------------------------------

    fn filtered_task_ids(&self) -> Vec<i64> {
        self.board
            .as_ref()
            .map(|b| b.filtered().iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    fn move_task_selection(&mut self, delta: i64) {
        let ids = self.filtered_task_ids();
        if ids.is_empty() {
            return;
        }
        let Some(board) = self.board.as_mut() else {
            return;
        };
        let current = board.selected.and_then(|id| ids.iter().position(|&x| x == id));
        let next = match current {
            Some(i) => (i as i64 + delta).clamp(0, ids.len() as i64 - 1) as usize,
            None => 0,
        };
        board.select(ids[next]);
        self.sync_subresources();
    }

    fn move_bucket_selection(&mut self, delta: i64) {
        if self.buckets.is_empty() {
            return;
        }
        let current = self.bucket_state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, self.buckets.len() as i64 - 1) as usize;
        self.bucket_state.select(Some(next));
    }

    // ---- input handling ------------------------------------------------

    fn handle_input(&mut self) -> io::Result<bool> {
        if !event::poll(Duration::from_millis(200))? {
            return Ok(false);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(false);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        match self.state {
            AppState::Buckets => self.handle_buckets_input(key.code),
            AppState::Board => self.handle_board_input(key.code, key.modifiers),
            AppState::AddTask => self.handle_task_form_input(key.code, false),
            AppState::EditTask => self.handle_task_form_input(key.code, true),
            AppState::BucketForm => self.handle_bucket_form_input(key.code),
            AppState::StatusPick => self.handle_status_pick_input(key.code),
            AppState::CommentInput => self.handle_comment_input(key.code),
            AppState::UploadInput => self.handle_upload_input(key.code),
            AppState::Confirm => self.handle_confirm_input(key.code),
            AppState::Help => {
                self.state = AppState::Board;
                Ok(false)
            }
        }
    }

    fn handle_buckets_input(&mut self, key: KeyCode) -> io::Result<bool> {
        match key {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Down | KeyCode::Char('j') => self.move_bucket_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_bucket_selection(-1),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.enter_selected_bucket(),
            KeyCode::Esc | KeyCode::Left | KeyCode::Backspace => {
                if self.nav.pop() {
                    self.load_buckets();
                } else {
                    return Ok(true);
                }
            }
            KeyCode::Char('a') => self.begin_bucket_create(),
            KeyCode::Char('r') => self.load_buckets(),
            _ => {}
        }
        Ok(false)
    }

    fn enter_selected_bucket(&mut self) {
        let Some(index) = self.bucket_state.selected() else {
            return;
        };
        let Some(row) = self.buckets.get(index) else {
            return;
        };
        let (id, number, title) = (row.id, row.number, row.title.clone());
        match self.nav.level() {
            NavLevel::Annual => {
                self.nav.enter_annual(id, Some(title));
                self.load_buckets();
            }
            NavLevel::Semester => {
                self.nav.enter_semester(id, number);
                self.load_buckets();
            }
            NavLevel::Monthly => self.open_board(id),
        }
    }

    fn begin_bucket_create(&mut self) {
        let level = self.nav.level();
        let allowed = match level {
            NavLevel::Annual => self.caps.bod,
            NavLevel::Semester | NavLevel::Monthly => self.caps.hod,
        };
        if !allowed {
            self.status_message = match level {
                NavLevel::Annual => "Creating annual projects requires the BoD role".into(),
                _ => "Creating buckets requires Head of Department or above".into(),
            };
            return;
        }
        self.bucket_form = BucketForm::new(level);
        self.state = AppState::BucketForm;
    }

    fn handle_board_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        if self.search_active {
            match key {
                KeyCode::Esc => {
                    self.search_active = false;
                    if let Some(board) = self.board.as_mut() {
                        board.filter.query.clear();
                    }
                }
                KeyCode::Enter => self.search_active = false,
                KeyCode::Backspace => {
                    if let Some(board) = self.board.as_mut() {
                        board.filter.query.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(board) = self.board.as_mut() {
                        board.filter.query.push(c);
                    }
                }
                _ => {}
            }
            return Ok(false);
        }

        match key {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc | KeyCode::Backspace => {
                self.board = None;
                self.evidence = None;
                self.comments = None;
                self.state = AppState::Buckets;
                self.load_buckets();
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_task_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_task_selection(-1),
            KeyCode::Char('r') => self.reload_board(),
            KeyCode::Char('/') => self.search_active = true,
            KeyCode::Char('f') => self.cycle_status_filter(),
            KeyCode::Char('p') => self.cycle_priority_filter(),
            KeyCode::Char('a') => {
                self.task_form = TaskForm::new(self.caps);
                self.status_message.clear();
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') => {
                if let Some(board) = self.board.as_mut() {
                    if board.selected.is_some() {
                        board.begin_edit();
                        self.task_form = TaskForm::from_draft(&board.draft, self.caps);
                        self.status_message.clear();
                        self.state = AppState::EditTask;
                    }
                }
            }
            KeyCode::Char('s') => {
                if let Some(task) = self.board.as_ref().and_then(|b| b.selected_task()) {
                    self.status_pick = Status::ALL
                        .iter()
                        .position(|&s| s == task.status)
                        .unwrap_or(0);
                    self.state = AppState::StatusPick;
                }
            }
            KeyCode::Char('c') => {
                if self.comments.is_some() {
                    self.comment_input.clear();
                    self.state = AppState::CommentInput;
                }
            }
            KeyCode::Char('u') => {
                if self.evidence.is_some() {
                    self.upload_input.clear();
                    self.state = AppState::UploadInput;
                }
            }
            KeyCode::Char(']') => self.move_evidence_selection(1),
            KeyCode::Char('[') => self.move_evidence_selection(-1),
            KeyCode::Char('x') => self.begin_evidence_delete(),
            KeyCode::Char('h') => self.state = AppState::Help,
            KeyCode::Char('G') if modifiers.contains(KeyModifiers::SHIFT) => {
                self.move_task_selection(i64::MAX / 2)
            }
            _ => {}
        }
        Ok(false)
    }

    fn cycle_status_filter(&mut self) {
        if let Some(board) = self.board.as_mut() {
            board.filter.status = match board.filter.status {
                None => Some(Status::ALL[0]),
                Some(current) => {
                    let idx = Status::ALL.iter().position(|&s| s == current).unwrap_or(0);
                    Status::ALL.get(idx + 1).copied()
                }
            };
        }
    }

    fn cycle_priority_filter(&mut self) {
        if let Some(board) = self.board.as_mut() {
            board.filter.priority = match board.filter.priority {
                None => Some(Priority::ALL[0]),
                Some(current) => {
                    let idx = Priority::ALL.iter().position(|&p| p == current).unwrap_or(0);
                    Priority::ALL.get(idx + 1).copied()
                }
            };
        }
    }

    fn move_evidence_selection(&mut self, delta: i64) {
        let Some(panel) = self.evidence.as_ref() else {
            return;
        };
        if panel.files.is_empty() {
            return;
        }
        let max = panel.files.len() as i64 - 1;
        self.evidence_sel = (self.evidence_sel as i64 + delta).clamp(0, max) as usize;
    }

    fn begin_evidence_delete(&mut self) {
        let Some(panel) = self.evidence.as_ref() else {
            return;
        };
        let Some(file) = panel.files.get(self.evidence_sel) else {
            return;
        };
        self.confirm = Some(ConfirmAction::DeleteEvidence {
            evidence_id: file.id,
            name: file.file_name.clone().unwrap_or_else(|| "file".into()),
        });
        self.state = AppState::Confirm;
    }

    fn handle_task_form_input(&mut self, key: KeyCode, is_edit: bool) -> io::Result<bool> {
        match key {
            KeyCode::Esc => {
                if is_edit {
                    if let Some(board) = self.board.as_mut() {
                        board.cancel_edit();
                    }
                }
                self.state = AppState::Board;
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Enter => self.submit_task_form(is_edit),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn submit_task_form(&mut self, is_edit: bool) {
        let draft = self.task_form.to_draft();
        let Some(board) = self.board.as_mut() else {
            self.state = AppState::Board;
            return;
        };
        let ok = if is_edit {
            board.draft = draft;
            self.rt.block_on(board.update_selected())
        } else {
            self.rt.block_on(board.create_task(&draft))
        };
        if ok {
            self.status_message = if is_edit {
                "Task updated".into()
            } else {
                "Task added".into()
            };
            self.state = AppState::Board;
            self.sync_subresources();
        }
        // On failure stay in the form; the board error shows in the bar.
    }

    fn handle_bucket_form_input(&mut self, key: KeyCode) -> io::Result<bool> {
        match key {
            KeyCode::Esc => self.state = AppState::Buckets,
            KeyCode::Tab | KeyCode::Down => self.bucket_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.bucket_form.prev_field(),
            KeyCode::Left => self.bucket_form.active_input().move_cursor_left(),
            KeyCode::Right => self.bucket_form.active_input().move_cursor_right(),
            KeyCode::Backspace => self.bucket_form.active_input().handle_backspace(),
            KeyCode::Enter => self.submit_bucket_form(),
            KeyCode::Char(c) => self.bucket_form.active_input().handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn submit_bucket_form(&mut self) {
        let title = self.bucket_form.title.value.trim().to_string();
        if title.is_empty() {
            self.status_message = "Title must not be empty.".into();
            return;
        }
        let desc = {
            let d = self.bucket_form.desc.value.trim();
            (!d.is_empty()).then(|| d.to_string())
        };
        let result = match self.bucket_form.level {
            NavLevel::Annual => self
                .rt
                .block_on(self.client.create_annual(&NewAnnual { title, desc })),
            NavLevel::Semester => {
                let Some(semester) = self.bucket_form.parsed_number().filter(|n| (1..=2).contains(n))
                else {
                    self.status_message = "Semester must be 1 or 2.".into();
                    return;
                };
                let project_id = self.nav.annual_id.unwrap_or_default();
                self.rt.block_on(self.client.create_semester(
                    project_id,
                    &NewSemester {
                        semester,
                        title,
                        desc,
                    },
                ))
            }
            NavLevel::Monthly => {
                let Some(month) = self.bucket_form.parsed_number().filter(|n| (1..=12).contains(n))
                else {
                    self.status_message = "Month must be between 1 and 12.".into();
                    return;
                };
                let semester_id = self.nav.semester_id.unwrap_or_default();
                let project_id = self.nav.annual_id.unwrap_or_default();
                self.rt.block_on(self.client.create_monthly(
                    semester_id,
                    &NewMonthly {
                        project_id,
                        month,
                        title,
                        desc,
                    },
                ))
            }
        };
        match result {
            Ok(()) => {
                self.status_message = "Created".into();
                self.state = AppState::Buckets;
                self.load_buckets();
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    fn handle_status_pick_input(&mut self, key: KeyCode) -> io::Result<bool> {
        match key {
            KeyCode::Esc => self.state = AppState::Board,
            KeyCode::Down | KeyCode::Char('j') => {
                self.status_pick = (self.status_pick + 1) % Status::ALL.len();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.status_pick = (self.status_pick + Status::ALL.len() - 1) % Status::ALL.len();
            }
            KeyCode::Enter => {
                let status = Status::ALL[self.status_pick];
                let task_id = self.board.as_ref().and_then(|b| b.selected);
                if let (Some(board), Some(task_id)) = (self.board.as_mut(), task_id) {
                    if self.rt.block_on(board.quick_status(task_id, status)) {
                        self.status_message = format!("Status set to {}", status.label());
                    }
                }
                self.state = AppState::Board;
                self.sync_subresources();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_comment_input(&mut self, key: KeyCode) -> io::Result<bool> {
        match key {
            KeyCode::Esc => self.state = AppState::Board,
            KeyCode::Backspace => self.comment_input.handle_backspace(),
            KeyCode::Delete => self.comment_input.handle_delete(),
            KeyCode::Left => self.comment_input.move_cursor_left(),
            KeyCode::Right => self.comment_input.move_cursor_right(),
            KeyCode::Enter => {
                let text = self.comment_input.value.clone();
                if let Some(thread) = self.comments.as_mut() {
                    if self.rt.block_on(thread.add(&text)) {
                        self.status_message = "Comment sent".into();
                        self.comment_input.clear();
                        self.state = AppState::Board;
                    } else if let Some(err) = thread.error.clone() {
                        self.status_message = err;
                    }
                    // Blank text: stay in the composer, nothing was sent.
                }
            }
            KeyCode::Char(c) => self.comment_input.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn handle_upload_input(&mut self, key: KeyCode) -> io::Result<bool> {
        match key {
            KeyCode::Esc => self.state = AppState::Board,
            KeyCode::Backspace => self.upload_input.handle_backspace(),
            KeyCode::Delete => self.upload_input.handle_delete(),
            KeyCode::Left => self.upload_input.move_cursor_left(),
            KeyCode::Right => self.upload_input.move_cursor_right(),
            KeyCode::Enter => {
                let path = self.upload_input.value.trim().to_string();
                if path.is_empty() {
                    return Ok(false);
                }
                if let Some(panel) = self.evidence.as_mut() {
                    if self.rt.block_on(panel.upload(&[PathBuf::from(path)])) {
                        self.status_message = "Attachment uploaded".into();
                        self.upload_input.clear();
                        self.state = AppState::Board;
                    } else if let Some(err) = panel.error.clone() {
                        self.status_message = err;
                    }
                }
            }
            KeyCode::Char(c) => self.upload_input.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> io::Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(ConfirmAction::DeleteEvidence { evidence_id, name }) =
                    self.confirm.take()
                {
                    if let Some(panel) = self.evidence.as_mut() {
                        if self.rt.block_on(panel.remove(evidence_id)) {
                            self.status_message = format!("Deleted {name}");
                            self.evidence_sel = 0;
                        } else if let Some(err) = panel.error.clone() {
                            self.status_message = err;
                        }
                    }
                }
                self.state = AppState::Board;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm = None;
                self.state = AppState::Board;
            }
            _ => {}
        }
        Ok(false)
    }

    // ---- rendering -----------------------------------------------------

    fn level_color(&self) -> Color {
        match self.nav.level() {
            NavLevel::Annual => ANNUAL_BLUE,
            NavLevel::Semester => SEMESTER_PURPLE,
            NavLevel::Monthly => MONTHLY_ORANGE,
        }
    }

    fn render_buckets(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let who = self
            .employee
            .as_ref()
            .map(|e| e.display_name().to_string())
            .unwrap_or_else(|| "not logged in".into());
        let header = Paragraph::new(Line::from(vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{}  ·  {}", self.nav.display_name(), who),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        let number_header = match self.nav.level() {
            NavLevel::Annual => "",
            NavLevel::Semester => "Sem",
            NavLevel::Monthly => "Month",
        };
        let header_cells = ["ID", number_header, "Title", "Description"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header_row = Row::new(header_cells)
            .style(Style::default().bg(self.level_color()).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = self
            .buckets
            .iter()
            .map(|b| {
                let number = b.number.map(|n| n.to_string()).unwrap_or_default();
                Row::new(vec![
                    Cell::from(b.id.to_string()),
                    Cell::from(number),
                    Cell::from(b.title.clone()),
                    Cell::from(b.desc.clone()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Min(24),
            Constraint::Min(20),
        ];
        let title = format!(
            "{} ({}) - Enter to open, 'a' to create",
            self.nav.display_name(),
            self.buckets.len()
        );
        let table = Table::new(rows, widths)
            .header(header_row)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, chunks[1], &mut self.bucket_state);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let Some(board) = &self.board else {
            return;
        };
        let today = Local::now().date_naive();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        // Summary header.
        let title = board
            .monthly
            .as_ref()
            .and_then(|m| m.title.clone())
            .unwrap_or_else(|| "Task Board".into());
        let stats = board.stats();
        let mut lines = vec![Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.push(Line::from(Span::styled(
            format!(
                "{} tasks · {} in progress · {} completed · {} critical · {} overdue",
                stats.total, stats.in_progress, stats.completed, stats.critical, stats.overdue
            ),
            Style::default().fg(Color::Gray),
        )));
        let summary = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).style(Style::default()))
            .alignment(Alignment::Left);
        f.render_widget(summary, chunks[0]);

        let progress = board.progress();
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(gauge_color(progress)))
            .percent(progress as u16);
        f.render_widget(gauge, chunks[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(44), Constraint::Percentage(56)])
            .split(chunks[2]);

        self.render_task_table(f, body[0], today);
        self.render_task_detail(f, body[1], today);
    }

    fn render_task_table(&mut self, f: &mut Frame, area: Rect, today: chrono::NaiveDate) {
        let Some(board) = &self.board else {
            return;
        };
        let filtered = board.filtered();

        let header_cells = ["ID", "Status", "Pri", "Due", "%", "Title"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header_row = Row::new(header_cells)
            .style(Style::default().bg(BOARD_SLATE).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = filtered
            .iter()
            .map(|t| {
                let overdue = is_overdue(t.enddate, t.status, today);
                let due = format_date_relative(t.enddate, today);
                let due_cell = if overdue {
                    Cell::from(format!("{due}!")).style(Style::default().fg(Color::Red))
                } else {
                    Cell::from(due)
                };
                let style = match t.status {
                    Status::Completed => Style::default().fg(Color::DarkGray),
                    s => Style::default().fg(status_color(s)),
                };
                Row::new(vec![
                    Cell::from(t.id.to_string()),
                    Cell::from(t.status.label()),
                    Cell::from(t.priority.label())
                        .style(Style::default().fg(priority_color(t.priority))),
                    due_cell,
                    Cell::from(format!("{}", status_progress(t.status))),
                    Cell::from(t.title.clone()),
                ])
                .style(style)
            })
            .collect();

        let selected_pos = board
            .selected
            .and_then(|id| filtered.iter().position(|t| t.id == id));
        self.task_state.select(selected_pos);

        let mut title = format!("Tasks ({}/{})", filtered.len(), board.tasks.len());
        if board.filter.is_active() {
            title.push_str(" · filtered");
        }
        let widths = [
            Constraint::Length(5),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(4),
            Constraint::Min(16),
        ];
        let table = Table::new(rows, widths)
            .header(header_row)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, area, &mut self.task_state);
    }

    fn render_task_detail(&mut self, f: &mut Frame, area: Rect, today: chrono::NaiveDate) {
        let Some(board) = &self.board else {
            return;
        };
        let block = Block::default().borders(Borders::ALL).title("Detail");
        let Some(task) = board.selected_task() else {
            let empty = Paragraph::new("Select a task on the left")
                .block(block)
                .alignment(Alignment::Center);
            f.render_widget(empty, area);
            return;
        };

        let overdue = is_overdue(task.enddate, task.status, today);
        let mut text: Vec<Line> = Vec::new();

        text.push(Line::from(Span::styled(
            task.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        let mut tags = vec![
            Span::styled(
                format!(" {} ", task.status.label()),
                Style::default().bg(status_color(task.status)).fg(Color::Black),
            ),
            Span::raw(" "),
            Span::styled(
                format!(" {} ", task.priority.label()),
                Style::default()
                    .bg(priority_color(task.priority))
                    .fg(Color::White),
            ),
        ];
        if overdue {
            tags.push(Span::raw(" "));
            tags.push(Span::styled(
                " Overdue ",
                Style::default().bg(Color::Red).fg(Color::White),
            ));
        }
        text.push(Line::from(tags));
        text.push(Line::default());

        if let Some(desc) = &task.desc {
            text.push(Line::from(desc.clone()));
            text.push(Line::default());
        }

        text.push(Line::from(vec![
            Span::styled("Start: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format_date(task.startdate)),
            Span::raw("   "),
            Span::styled("Due: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format_date(task.enddate),
                if overdue {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                },
            ),
        ]));

        let owner = task.owner_name.as_deref().unwrap_or("—");
        let pic = task.pic_name.as_deref().unwrap_or("unassigned");
        text.push(Line::from(vec![
            Span::styled("Owner: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("[{}] {}", initials(owner), owner)),
            Span::raw("   "),
            Span::styled("PIC: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("[{}] {}", initials(pic), pic)),
        ]));
        text.push(Line::default());

        // Workflow strip: past stages dim, current highlighted.
        let current_idx = Status::ALL.iter().position(|&s| s == task.status).unwrap_or(0);
        let mut strip: Vec<Span> = vec![Span::styled(
            format!("{:>3}% ", status_progress(task.status)),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for (i, s) in Status::ALL.iter().enumerate() {
            let style = if i == current_idx {
                Style::default().bg(BOARD_SLATE).fg(Color::White)
            } else if i < current_idx {
                Style::default().fg(Color::Gray)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            strip.push(Span::styled(format!(" {} ", s.label()), style));
            if i + 1 < Status::ALL.len() {
                strip.push(Span::raw("·"));
            }
        }
        text.push(Line::from(strip));
        text.push(Line::default());

        // Evidence.
        let evidence_len = self.evidence.as_ref().map_or(0, |p| p.files.len());
        text.push(Line::from(Span::styled(
            format!("Attachments ({evidence_len})"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if let Some(panel) = &self.evidence {
            if let Some(err) = &panel.error {
                text.push(Line::from(Span::styled(
                    err.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
            for (i, ev) in panel.files.iter().enumerate() {
                let marker = if i == self.evidence_sel { "▶ " } else { "  " };
                let name = ev.file_name.as_deref().unwrap_or("file");
                let size = ev.file_size.map(format_bytes).unwrap_or_default();
                text.push(Line::from(format!(
                    "{marker}{:<4} {} {}",
                    file_badge(ev.file_type.as_deref(), ev.file_name.as_deref()),
                    name,
                    size
                )));
            }
            if panel.files.is_empty() {
                text.push(Line::from(Span::styled(
                    "  none",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        text.push(Line::default());

        // Comments.
        let comment_len = self.comments.as_ref().map_or(0, |c| c.comments.len());
        text.push(Line::from(Span::styled(
            format!("Comments ({comment_len})"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if let Some(thread) = &self.comments {
            for c in thread.comments.iter().rev().take(6).rev() {
                let author = c.employee_name.as_deref().unwrap_or("?");
                let when = c
                    .created_at
                    .map(|t| t.format("%-d %b %H:%M").to_string())
                    .unwrap_or_else(|| "—".into());
                text.push(Line::from(Span::styled(
                    format!("[{}] {} · {}", initials(author), author, when),
                    Style::default().fg(Color::Cyan),
                )));
                text.push(Line::from(format!("    {}", c.comment)));
            }
            if thread.comments.is_empty() {
                text.push(Line::from(Span::styled(
                    "  none",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        let detail = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
        f.render_widget(detail, area);
    }

    fn render_task_form(&mut self, f: &mut Frame, area: Rect, is_edit: bool) {
        let popup = centered_rect(64, 70, area);
        f.render_widget(Clear, popup);
        let title = if is_edit { "Edit Task" } else { "Add Task" };

        let form = &self.task_form;
        let mut lines = vec![
            form_text_line("Title*", &form.title),
            form_text_line("Description", &form.desc),
            form_text_line("Start date", &form.start),
            form_text_line("Due date", &form.due),
            form_selector_line(
                "Status",
                Status::ALL[form.status].label(),
                form.current_field == STATUS_FIELD,
            ),
            form_selector_line(
                "Priority",
                Priority::ALL[form.priority].label(),
                form.current_field == PRIORITY_FIELD,
            ),
        ];
        if form.show_pic {
            lines.push(form_text_line("PIC employee ID", &form.pic));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Tab next field · ←/→ move or cycle · Enter save · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        f.render_widget(widget, popup);
    }

    fn render_bucket_form(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(56, 44, area);
        f.render_widget(Clear, popup);
        let title = match self.bucket_form.level {
            NavLevel::Annual => "Create Annual Project",
            NavLevel::Semester => "Create Semester",
            NavLevel::Monthly => "Create Monthly",
        };
        let mut lines = vec![
            form_text_line("Title*", &self.bucket_form.title),
            form_text_line("Description", &self.bucket_form.desc),
        ];
        if let Some(label) = self.bucket_form.number_label() {
            lines.push(form_text_line(label, &self.bucket_form.number));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Tab next field · Enter create · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        f.render_widget(widget, popup);
    }

    fn render_status_pick(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(34, 44, area);
        f.render_widget(Clear, popup);
        let lines: Vec<Line> = Status::ALL
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let marker = if i == self.status_pick { ">> " } else { "   " };
                let style = if i == self.status_pick {
                    Style::default().bg(Color::Gray).fg(Color::Black)
                } else {
                    Style::default().fg(status_color(*s))
                };
                Line::from(Span::styled(
                    format!("{marker}{} ({}%)", s.label(), status_progress(*s)),
                    style,
                ))
            })
            .collect();
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Set Status"));
        f.render_widget(widget, popup);
    }

    fn render_line_input(&mut self, f: &mut Frame, area: Rect, title: &str, field: &InputField) {
        let popup = centered_rect(60, 18, area);
        f.render_widget(Clear, popup);
        let lines = vec![
            Line::from(render_input_value(field)),
            Line::default(),
            Line::from(Span::styled(
                "Enter send · Esc cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let widget =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(widget, popup);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 16, area);
        f.render_widget(Clear, popup);
        let message = match &self.confirm {
            Some(ConfirmAction::DeleteEvidence { name, .. }) => {
                format!("Delete attachment \"{name}\"?")
            }
            None => String::new(),
        };
        let lines = vec![
            Line::from(message),
            Line::default(),
            Line::from(Span::styled(
                "y confirm · n cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Confirm"))
            .alignment(Alignment::Center);
        f.render_widget(widget, popup);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = [
            ("j/k", "move selection"),
            ("Enter", "open bucket / drill down"),
            ("Esc", "back up one level"),
            ("a", "add task (or bucket in the browser)"),
            ("e", "edit selected task"),
            ("s", "quick status change"),
            ("f / p", "cycle status / priority filter"),
            ("/", "search titles"),
            ("c", "comment on selected task"),
            ("u", "upload evidence (file path)"),
            ("[ / ]", "select evidence entry"),
            ("x", "delete selected evidence"),
            ("r", "reload from the backend"),
            ("q", "quit"),
        ]
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>7}  "), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(*what),
            ])
        })
        .collect();
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help (any key to close)"));
        f.render_widget(widget, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let board_error = self.board.as_ref().and_then(|b| b.error.clone());
        let (text, style) = if let Some(err) = board_error {
            (err, Style::default().fg(Color::White).bg(Color::Red))
        } else if self.search_active {
            let query = self
                .board
                .as_ref()
                .map(|b| b.filter.query.clone())
                .unwrap_or_default();
            (
                format!("Search: {query} (Esc to clear, Enter to confirm)"),
                Style::default().bg(BOARD_SLATE).fg(Color::White),
            )
        } else if !self.status_message.is_empty() {
            (
                self.status_message.clone(),
                Style::default().bg(BOARD_SLATE).fg(Color::White),
            )
        } else {
            let hint = match self.state {
                AppState::Buckets => "Enter open · a create · r reload · q quit",
                AppState::Board => {
                    "e edit · s status · a add · c comment · u upload · x del evidence · h help"
                }
                _ => "",
            };
            (
                hint.to_string(),
                Style::default().bg(BOARD_SLATE).fg(Color::Gray),
            )
        };
        let bar = Paragraph::new(text).style(style);
        f.render_widget(bar, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
            .split(f.area());

        match self.state {
            AppState::Buckets => self.render_buckets(f, chunks[0]),
            AppState::BucketForm => {
                self.render_buckets(f, chunks[0]);
                self.render_bucket_form(f, chunks[0]);
            }
            AppState::Board => self.render_board(f, chunks[0]),
            AppState::AddTask => {
                self.render_board(f, chunks[0]);
                self.render_task_form(f, chunks[0], false);
            }
            AppState::EditTask => {
                self.render_board(f, chunks[0]);
                self.render_task_form(f, chunks[0], true);
            }
            AppState::StatusPick => {
                self.render_board(f, chunks[0]);
                self.render_status_pick(f, chunks[0]);
            }
            AppState::CommentInput => {
                self.render_board(f, chunks[0]);
                let field = self.comment_input.clone();
                self.render_line_input(f, chunks[0], "Comment", &field);
            }
            AppState::UploadInput => {
                self.render_board(f, chunks[0]);
                let field = self.upload_input.clone();
                self.render_line_input(f, chunks[0], "Upload evidence (file path)", &field);
            }
            AppState::Confirm => {
                self.render_board(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
            AppState::Help => self.render_help(f, chunks[0]),
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn gauge_color(percent: u8) -> Color {
    if percent >= 80 {
        Color::Rgb(5, 150, 105)
    } else if percent >= 50 {
        Color::Rgb(37, 99, 235)
    } else if percent >= 25 {
        Color::Rgb(245, 158, 11)
    } else {
        Color::Rgb(244, 63, 94)
    }
}

fn form_text_line<'a>(label: &'a str, field: &InputField) -> Line<'a> {
    let label_style = if field.active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let mut spans = vec![Span::styled(format!("{label:<16}"), label_style)];
    spans.extend(render_input_value(field));
    Line::from(spans)
}

fn form_selector_line<'a>(label: &'a str, value: &'a str, active: bool) -> Line<'a> {
    let label_style = if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    Line::from(vec![
        Span::styled(format!("{label:<16}"), label_style),
        Span::raw("< "),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" >"),
    ])
}

/// Render an input value with a cursor block when the field is active.
fn render_input_value(field: &InputField) -> Vec<Span<'static>> {
    if !field.active {
        return vec![Span::raw(field.value.clone())];
    }
    let (before, after) = field.value.split_at(field.cursor);
    let mut chars = after.chars();
    let at_cursor = chars.next();
    let rest: String = chars.collect();
    let mut spans = vec![Span::raw(before.to_string())];
    spans.push(Span::styled(
        at_cursor.map(String::from).unwrap_or_else(|| " ".into()),
        Style::default().bg(Color::White).fg(Color::Black),
    ));
    spans.push(Span::raw(rest));
    spans
}
