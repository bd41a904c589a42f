//! Task entity store and board view state for one monthly bucket.
//!
//! The [`Board`] owns the loaded task list exclusively; every mutation goes
//! through its own methods and follows the same policy: validate locally,
//! fire the call, await it, then reload the whole bucket so the client
//! reflects server-computed fields. Nothing is merged partially — on
//! failure the previously loaded state stays on screen (stale but
//! consistent) and the error is surfaced as a message string.
//!
//! The network edge is kept thin: every response lands in a pure
//! `apply_*` transition, so the board's behaviour is unit-testable
//! without I/O.

use chrono::{Local, NaiveDate};

use crate::api::{ApiClient, ApiError};
use crate::dates::parse_date_input;
use crate::fields::{Priority, Status};
use crate::session::Capabilities;
use crate::task::{MonthDetail, Monthly, NewTask, StatusPatch, Task, TaskPatch};

/// Integer percentage in [0, 100] summarizing a collection of tasks: mean
/// of the status weights, rounded half-up. Total over any finite sequence;
/// the empty bucket reports 0.
pub fn aggregate_progress(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let sum: f64 = tasks.iter().map(|t| t.status.weight()).sum();
    ((sum / tasks.len() as f64) * 100.0).round() as u8
}

/// A single task's own progress indicator, the degenerate one-element case.
pub fn status_progress(status: Status) -> u8 {
    (status.weight() * 100.0).round() as u8
}

/// A task is overdue when its due date has passed and it is not in a
/// terminal status; completed and approved work is never overdue.
pub fn is_overdue(enddate: Option<NaiveDate>, status: Status, today: NaiveDate) -> bool {
    match enddate {
        Some(due) if !status.is_terminal() => due < today,
        _ => false,
    }
}

/// Headline counts for the board's stat row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub critical: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn of(tasks: &[Task], today: NaiveDate) -> Self {
        TaskStats {
            total: tasks.len(),
            in_progress: tasks.iter().filter(|t| t.status == Status::InProgress).count(),
            completed: tasks.iter().filter(|t| t.status == Status::Completed).count(),
            critical: tasks.iter().filter(|t| t.priority == Priority::Critical).count(),
            overdue: tasks
                .iter()
                .filter(|t| is_overdue(t.enddate, t.status, today))
                .count(),
        }
    }
}

/// Display filter over the held task list. Criteria compose by logical
/// AND; `None` means "all". The query matches case-insensitively as a
/// substring of the title only.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub query: String,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        let q = self.query.trim().to_lowercase();
        q.is_empty() || task.title.to_lowercase().contains(&q)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_some() || self.priority.is_some() || !self.query.trim().is_empty()
    }
}

/// Snapshot of a task's editable fields. Selecting a task captures one of
/// these so entering edit mode needs no refetch; discarding an edit just
/// re-snapshots from the store's live copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub desc: String,
    pub startdate: String,
    pub enddate: String,
    pub status: Status,
    pub priority: Priority,
    pub pic: String,
}

impl TaskDraft {
    pub fn of(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            desc: task.desc.clone().unwrap_or_default(),
            startdate: task.startdate.map(|d| d.to_string()).unwrap_or_default(),
            enddate: task.enddate.map(|d| d.to_string()).unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            pic: task
                .pic_employee_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    fn trimmed_title(&self) -> Result<String, String> {
        let title = self.title.trim();
        if title.is_empty() {
            Err("Title must not be empty.".to_string())
        } else {
            Ok(title.to_string())
        }
    }

    fn desc_or_none(&self) -> Option<String> {
        let desc = self.desc.trim();
        (!desc.is_empty()).then(|| desc.to_string())
    }

    fn parsed_pic(&self) -> Option<i64> {
        self.pic.trim().parse().ok()
    }

    /// Build the create payload. Fails locally, before any network call,
    /// when the title is blank. The PIC is attached only for HoD actors.
    pub fn to_new_task(&self, caps: Capabilities) -> Result<NewTask, String> {
        Ok(NewTask {
            title: self.trimmed_title()?,
            desc: self.desc_or_none(),
            startdate: parse_date_input(&self.startdate),
            enddate: parse_date_input(&self.enddate),
            status: self.status,
            priority: self.priority,
            pic_employee_id: if caps.hod { self.parsed_pic() } else { None },
        })
    }

    /// Build the full-field update payload. Without the HoD capability the
    /// PIC field is omitted entirely so the backend keeps the existing
    /// assignment.
    pub fn to_patch(&self, caps: Capabilities) -> Result<TaskPatch, String> {
        Ok(TaskPatch {
            title: self.trimmed_title()?,
            desc: self.desc_or_none(),
            startdate: parse_date_input(&self.startdate),
            enddate: parse_date_input(&self.enddate),
            status: self.status,
            priority: self.priority,
            pic_employee_id: if caps.hod { Some(self.parsed_pic()) } else { None },
        })
    }
}

/// The task entity store plus the filter/selection view over it.
pub struct Board {
    client: ApiClient,
    caps: Capabilities,
    pub monthly_id: i64,
    pub monthly: Option<Monthly>,
    pub tasks: Vec<Task>,
    pub error: Option<String>,
    pub filter: TaskFilter,
    pub selected: Option<i64>,
    pub edit_mode: bool,
    pub draft: TaskDraft,
}

impl Board {
    pub fn new(client: ApiClient, caps: Capabilities, monthly_id: i64) -> Self {
        Board {
            client,
            caps,
            monthly_id,
            monthly: None,
            tasks: Vec::new(),
            error: None,
            filter: TaskFilter::default(),
            selected: None,
            edit_mode: false,
            draft: TaskDraft::default(),
        }
    }

    // ---- store operations (fire, await, reload) ------------------------

    /// Fetch the bucket and replace the held state wholesale. On failure
    /// the prior list stays untouched and the error is recorded.
    pub async fn load(&mut self) {
        self.error = None;
        match self.client.month_detail(self.monthly_id).await {
            Ok(detail) => self.apply_loaded(detail),
            Err(e) => self.apply_load_failed(e),
        }
    }

    /// Create a task in this bucket. Returns true when the task was
    /// created and the board reloaded.
    pub async fn create_task(&mut self, draft: &TaskDraft) -> bool {
        self.error = None;
        let payload = match draft.to_new_task(self.caps) {
            Ok(p) => p,
            Err(msg) => {
                self.error = Some(msg);
                return false;
            }
        };
        match self.client.create_task(self.monthly_id, &payload).await {
            Ok(()) => {
                self.load().await;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Push the current draft as a full-field update of the selected task.
    pub async fn update_selected(&mut self) -> bool {
        let Some(task_id) = self.selected else {
            return false;
        };
        self.error = None;
        let payload = match self.draft.to_patch(self.caps) {
            Ok(p) => p,
            Err(msg) => {
                self.error = Some(msg);
                return false;
            }
        };
        match self.client.update_task(task_id, &payload).await {
            Ok(()) => {
                self.edit_mode = false;
                self.load().await;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Inline status change from the list view; reduced payload, same
    /// reload policy.
    pub async fn quick_status(&mut self, task_id: i64, status: Status) -> bool {
        self.error = None;
        match self
            .client
            .update_task_status(task_id, &StatusPatch { status })
            .await
        {
            Ok(()) => {
                self.load().await;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    // ---- pure state transitions ----------------------------------------

    pub fn apply_loaded(&mut self, detail: MonthDetail) {
        self.monthly = detail.monthly;
        self.tasks = detail.tasks;
        let still_there = self
            .selected
            .is_some_and(|id| self.tasks.iter().any(|t| t.id == id));
        if !still_there {
            self.selected = self.tasks.first().map(|t| t.id);
            self.edit_mode = false;
        }
        // A background reload must not clobber in-progress edits; the
        // draft re-derives from the fresh copy only outside edit mode.
        if !self.edit_mode {
            self.resnapshot_draft();
        }
    }

    pub fn apply_load_failed(&mut self, error: ApiError) {
        self.error = Some(error.to_string());
    }

    fn resnapshot_draft(&mut self) {
        if let Some(task) = self.selected_task() {
            self.draft = TaskDraft::of(task);
        } else {
            self.draft = TaskDraft::default();
        }
    }

    // ---- selection and derived views -----------------------------------

    /// Select a task and snapshot its editable fields, leaving edit mode.
    pub fn select(&mut self, task_id: i64) {
        if self.tasks.iter().any(|t| t.id == task_id) {
            self.selected = Some(task_id);
            self.edit_mode = false;
            self.resnapshot_draft();
        }
    }

    /// Enter edit mode on the current draft snapshot.
    pub fn begin_edit(&mut self) {
        if self.selected.is_some() {
            self.edit_mode = true;
        }
    }

    /// Leave edit mode, discarding the draft and re-snapshotting from the
    /// store's live copy.
    pub fn cancel_edit(&mut self) {
        self.edit_mode = false;
        self.resnapshot_draft();
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let id = self.selected?;
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The displayed subset: status AND priority AND title query.
    pub fn filtered(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| self.filter.matches(t)).collect()
    }

    pub fn progress(&self) -> u8 {
        aggregate_progress(&self.tasks)
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::of(&self.tasks, Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;

    fn task(id: i64, title: &str, status: Status, priority: Priority) -> Task {
        Task {
            id,
            title: title.to_string(),
            status,
            priority,
            ..Task::default()
        }
    }

    fn board_with(tasks: Vec<Task>) -> Board {
        let mut board = Board::new(
            ApiClient::new("http://localhost:3001", None),
            Capabilities::default(),
            1,
        );
        board.apply_loaded(MonthDetail {
            monthly: None,
            tasks,
        });
        board
    }

    #[test]
    fn empty_bucket_reports_zero_progress() {
        assert_eq!(aggregate_progress(&[]), 0);
    }

    #[test]
    fn single_task_progress_is_its_weight() {
        let t = |s| vec![task(1, "T", s, Priority::Medium)];
        assert_eq!(aggregate_progress(&t(Status::InProgress)), 30);
        assert_eq!(aggregate_progress(&t(Status::Completed)), 100);
        assert_eq!(aggregate_progress(&t(Status::OnHold)), 0);
        assert_eq!(status_progress(Status::Approved), 90);
    }

    #[test]
    fn three_task_bucket_aggregates_to_43() {
        let tasks = vec![
            task(1, "A", Status::InProgress, Priority::Medium),
            task(2, "B", Status::Completed, Priority::Medium),
            task(3, "C", Status::Assigned, Priority::Medium),
        ];
        // round(((0.3 + 1.0 + 0.0) / 3) * 100) = 43
        assert_eq!(aggregate_progress(&tasks), 43);
    }

    #[test]
    fn progress_stays_in_range() {
        for status in Status::ALL {
            let tasks: Vec<Task> = (0..5)
                .map(|i| task(i, "T", status, Priority::Low))
                .collect();
            assert!(aggregate_progress(&tasks) <= 100);
        }
    }

    #[test]
    fn filters_compose_with_and_semantics() {
        let tasks = vec![
            task(1, "Alpha", Status::Assigned, Priority::Low),
            task(2, "Beta", Status::InProgress, Priority::Critical),
        ];
        let mut board = board_with(tasks);

        board.filter.status = Some(Status::InProgress);
        board.filter.priority = Some(Priority::Critical);
        let hits = board.filtered();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Beta");

        board.filter.status = Some(Status::Assigned);
        assert!(board.filtered().is_empty());
    }

    #[test]
    fn title_search_is_case_insensitive_substring() {
        let mut board = board_with(vec![
            task(1, "Alpha Task", Status::Assigned, Priority::Medium),
            task(2, "Beta Task", Status::Assigned, Priority::Medium),
        ]);
        board.filter.query = "alp".to_string();
        let hits = board.filtered();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn overdue_ignores_terminal_statuses() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        let past = NaiveDate::from_ymd_opt(2025, 8, 1);
        assert!(is_overdue(past, Status::InProgress, today));
        assert!(!is_overdue(past, Status::Completed, today));
        assert!(!is_overdue(past, Status::Approved, today));
        assert!(!is_overdue(None, Status::InProgress, today));
        let future = NaiveDate::from_ymd_opt(2025, 9, 1);
        assert!(!is_overdue(future, Status::InProgress, today));
    }

    #[test]
    fn stats_count_each_dimension() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        let mut overdue = task(3, "C", Status::InProgress, Priority::Low);
        overdue.enddate = NaiveDate::from_ymd_opt(2025, 7, 1);
        let tasks = vec![
            task(1, "A", Status::InProgress, Priority::Critical),
            task(2, "B", Status::Completed, Priority::Medium),
            overdue,
        ];
        let stats = TaskStats::of(&tasks, today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.in_progress, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn blank_titles_are_rejected_before_any_call() {
        let draft = TaskDraft {
            title: "   ".to_string(),
            ..TaskDraft::default()
        };
        assert!(draft.to_new_task(Capabilities::default()).is_err());
        assert!(draft.to_patch(Capabilities::default()).is_err());
    }

    #[test]
    fn pic_assignment_requires_hod() {
        let draft = TaskDraft {
            title: "Survey".to_string(),
            pic: "12".to_string(),
            ..TaskDraft::default()
        };
        let staff = draft.to_new_task(Capabilities::default()).unwrap();
        assert_eq!(staff.pic_employee_id, None);
        let hod = draft
            .to_new_task(Capabilities { bod: false, hod: true })
            .unwrap();
        assert_eq!(hod.pic_employee_id, Some(12));

        let patch_staff = draft.to_patch(Capabilities::default()).unwrap();
        assert!(patch_staff.pic_employee_id.is_none());
        let patch_hod = draft
            .to_patch(Capabilities { bod: false, hod: true })
            .unwrap();
        assert_eq!(patch_hod.pic_employee_id, Some(Some(12)));
    }

    #[test]
    fn selection_snapshots_a_draft() {
        let mut t = task(2, "Beta", Status::InProgress, Priority::Critical);
        t.pic_employee_id = Some(7);
        let mut board = board_with(vec![task(1, "Alpha", Status::Assigned, Priority::Low), t]);
        board.select(2);
        assert_eq!(board.draft.title, "Beta");
        assert_eq!(board.draft.status, Status::InProgress);
        assert_eq!(board.draft.pic, "7");
        assert!(!board.edit_mode);
    }

    #[test]
    fn reload_preserves_draft_only_while_editing() {
        let mut board = board_with(vec![task(1, "Alpha", Status::Assigned, Priority::Low)]);
        board.select(1);
        board.begin_edit();
        board.draft.title = "Alpha (reworded)".to_string();

        // Fresh copy arrives mid-edit: keystrokes survive.
        board.apply_loaded(MonthDetail {
            monthly: None,
            tasks: vec![task(1, "Alpha v2", Status::InProgress, Priority::Low)],
        });
        assert_eq!(board.draft.title, "Alpha (reworded)");

        // Outside edit mode the draft re-derives from the fresh copy.
        board.cancel_edit();
        assert_eq!(board.draft.title, "Alpha v2");
        assert_eq!(board.draft.status, Status::InProgress);
    }

    #[test]
    fn failed_load_keeps_prior_state() {
        let mut board = board_with(vec![task(1, "Alpha", Status::Assigned, Priority::Low)]);
        board.apply_load_failed(ApiError::Backend("Request failed (502)".into()));
        assert_eq!(board.tasks.len(), 1);
        assert_eq!(board.error.as_deref(), Some("Request failed (502)"));
    }

    #[test]
    fn selection_follows_reload() {
        let mut board = board_with(vec![
            task(1, "Alpha", Status::Assigned, Priority::Low),
            task(2, "Beta", Status::Assigned, Priority::Low),
        ]);
        board.select(2);
        // Selected task vanished from the bucket: fall back to the first.
        board.apply_loaded(MonthDetail {
            monthly: None,
            tasks: vec![task(1, "Alpha", Status::Assigned, Priority::Low)],
        });
        assert_eq!(board.selected, Some(1));
    }
}
