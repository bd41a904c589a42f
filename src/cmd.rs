//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers behind the `pmb`
//! subcommands, from session management to board inspection and the
//! mutating task operations. Handlers print human-oriented tables in
//! fixed-width columns and return errors for `main` to surface.

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use log::info;

use crate::api::ApiClient;
use crate::board::{is_overdue, status_progress, Board, TaskDraft, TaskFilter};
use crate::cli::Cli;
use crate::comments::{validate_comment, CommentThread};
use crate::dates::{format_date, format_date_relative, parse_date_input};
use crate::evidence::{file_badge, format_bytes, EvidencePanel};
use crate::fields::{Priority, Status};
use crate::session::{Capabilities, Session};
use crate::task::{initials, NewAnnual, NewComment, NewMonthly, NewSemester, StatusPatch, Task};

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate against the backend and store the session locally.
    Login {
        /// Account email.
        email: String,
        /// Password; prompted on stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Remove the stored session.
    Logout,

    /// Show the cached employee record and derived capabilities.
    Whoami,

    /// List annual projects.
    Annuals,

    /// Create an annual project (Board of Directors only).
    NewAnnual {
        /// Project title.
        title: String,
        #[arg(long)]
        desc: Option<String>,
    },

    /// List semesters under an annual project.
    Semesters {
        /// Annual project ID.
        project_id: i64,
    },

    /// Create a semester under an annual project (HoD and up).
    NewSemester {
        /// Annual project ID.
        project_id: i64,
        /// Semester title.
        title: String,
        /// 1 (Jan-Jun) or 2 (Jul-Dec).
        #[arg(long, default_value_t = 1)]
        semester: u32,
        #[arg(long)]
        desc: Option<String>,
    },

    /// List monthly buckets under a semester.
    Monthlies {
        /// Semester ID.
        semester_id: i64,
    },

    /// Create a monthly bucket under a semester (HoD and up).
    NewMonthly {
        /// Semester ID.
        semester_id: i64,
        /// Bucket title.
        title: String,
        /// Annual project the semester belongs to.
        #[arg(long)]
        project_id: i64,
        /// Calendar month 1-12.
        #[arg(long)]
        month: u32,
        #[arg(long)]
        desc: Option<String>,
    },

    /// Show a monthly board: stats, progress and the task table.
    Board {
        /// Monthly bucket ID.
        monthly_id: i64,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Case-insensitive title search.
        #[arg(long)]
        query: Option<String>,
    },

    /// View a single task with comments and evidence.
    View {
        /// Monthly bucket ID the task lives in.
        monthly_id: i64,
        /// Task ID.
        task_id: i64,
    },

    /// Add a task to a monthly bucket.
    Add {
        /// Monthly bucket ID.
        monthly_id: i64,
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Start date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        start: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum, default_value_t = Status::Assigned)]
        status: Status,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// PIC employee ID (HoD and up; ignored otherwise).
        #[arg(long)]
        pic: Option<i64>,
    },

    /// Update fields on a task (unset fields keep their current values).
    Update {
        /// Monthly bucket ID the task lives in.
        monthly_id: i64,
        /// Task ID.
        task_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// PIC employee ID (HoD and up).
        #[arg(long)]
        pic: Option<i64>,
    },

    /// Quick inline status change.
    Status {
        /// Task ID.
        task_id: i64,
        #[arg(value_enum)]
        status: Status,
    },

    /// List comments on a task.
    Comments {
        /// Task ID.
        task_id: i64,
    },

    /// Add a comment to a task.
    Comment {
        /// Task ID.
        task_id: i64,
        /// Comment text.
        text: String,
    },

    /// Manage evidence attachments.
    Evidence {
        #[command(subcommand)]
        action: EvidenceAction,
    },

    /// Launch the interactive board UI.
    Ui {
        /// Jump straight to a monthly board.
        monthly_id: Option<i64>,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum EvidenceAction {
    /// List attachments with resolved download URLs.
    List {
        /// Task ID.
        task_id: i64,
    },
    /// Upload one or more files in a single call.
    Add {
        /// Task ID.
        task_id: i64,
        /// Files to attach.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete an attachment (asks for confirmation).
    Rm {
        /// Task ID.
        task_id: i64,
        /// Evidence ID.
        evidence_id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

type CmdResult = Result<(), Box<dyn Error>>;

// ---- session ----------------------------------------------------------

pub async fn cmd_login(
    client: &ApiClient,
    session_path: &Path,
    email: String,
    password: Option<String>,
) -> CmdResult {
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password: ")?,
    };
    let (cookie, user) = client.login(&email, &password).await?;
    if cookie.is_none() {
        return Err("backend did not set a session cookie".into());
    }
    let name = user
        .employee
        .as_ref()
        .map(|e| e.display_name().to_string())
        .unwrap_or_else(|| email.clone());
    let session = Session { cookie, user };
    session.save(session_path)?;
    info!("session stored at {}", session_path.display());
    println!("Logged in as {name}");
    Ok(())
}

pub fn cmd_logout(session_path: &Path) -> CmdResult {
    Session::clear(session_path)?;
    println!("Session cleared");
    Ok(())
}

pub fn cmd_whoami(session: &Session, caps: Capabilities) -> CmdResult {
    let Some(employee) = session.employee() else {
        return Err("not logged in; run `pmb login <email>` first".into());
    };
    println!("{}", employee.display_name());
    if let Some(email) = &employee.email {
        println!("  email:      {email}");
    }
    if let Some(position) = &employee.position {
        println!("  position:   {position}");
    }
    if let Some(department) = &employee.department {
        println!("  department: {department}");
    }
    if let Some(company) = &employee.company {
        println!("  company:    {company}");
    }
    let role = if caps.bod {
        "Board of Directors"
    } else if caps.hod {
        "Head of Department"
    } else {
        "Staff"
    };
    println!("  role:       {role}");
    Ok(())
}

// ---- hierarchy --------------------------------------------------------

pub async fn cmd_annuals(client: &ApiClient) -> CmdResult {
    let annuals = client.list_annuals().await?;
    if annuals.is_empty() {
        println!("No annual projects yet.");
        return Ok(());
    }
    println!("{:<6} {}", "ID", "Title");
    for a in annuals {
        println!(
            "{:<6} {}",
            a.id,
            a.title.as_deref().unwrap_or("—"),
        );
    }
    Ok(())
}

pub async fn cmd_new_annual(
    client: &ApiClient,
    caps: Capabilities,
    title: String,
    desc: Option<String>,
) -> CmdResult {
    if !caps.bod {
        return Err("creating annual projects requires the Board of Directors role".into());
    }
    let title = non_blank(&title, "title")?;
    client.create_annual(&NewAnnual { title, desc }).await?;
    println!("Created annual project");
    Ok(())
}

pub async fn cmd_semesters(client: &ApiClient, project_id: i64) -> CmdResult {
    let detail = client.annual_detail(project_id).await?;
    if let Some(project) = &detail.data {
        println!("{}", project.title.as_deref().unwrap_or("Project"));
        if let Some(desc) = &project.desc {
            println!("{desc}");
        }
        println!();
    }
    let semesters = detail.semesters;
    if semesters.is_empty() {
        println!("No semesters under project {project_id} yet.");
        return Ok(());
    }
    println!("{:<6} {:<10} {}", "ID", "Semester", "Title");
    for s in semesters {
        let half = match s.semester {
            Some(1) => "1 Jan-Jun",
            Some(2) => "2 Jul-Dec",
            _ => "-",
        };
        println!("{:<6} {:<10} {}", s.id, half, s.title.as_deref().unwrap_or("—"));
    }
    Ok(())
}

pub async fn cmd_new_semester(
    client: &ApiClient,
    caps: Capabilities,
    project_id: i64,
    semester: u32,
    title: String,
    desc: Option<String>,
) -> CmdResult {
    if !caps.hod {
        return Err("creating semesters requires Head of Department or above".into());
    }
    if !(1..=2).contains(&semester) {
        return Err("semester must be 1 or 2".into());
    }
    let title = non_blank(&title, "title")?;
    client
        .create_semester(project_id, &NewSemester { semester, title, desc })
        .await?;
    println!("Created semester {semester} under project {project_id}");
    Ok(())
}

pub async fn cmd_monthlies(client: &ApiClient, semester_id: i64) -> CmdResult {
    // Fetch the header and the list the way the board does: both reads,
    // semester metadata first.
    let detail = client.semester_detail(semester_id).await?;
    if let Some(semester) = &detail.data {
        let half = match semester.semester {
            Some(1) => "Semester 1 (Jan-Jun)",
            Some(2) => "Semester 2 (Jul-Dec)",
            _ => "Semester",
        };
        println!("{} — {}", half, semester.title.as_deref().unwrap_or("—"));
        println!();
    }
    let monthlies = client.list_monthlies(semester_id).await?;
    if monthlies.is_empty() {
        println!("No monthly buckets under semester {semester_id} yet.");
        return Ok(());
    }
    println!("{:<6} {:<7} {}", "ID", "Month", "Title");
    for m in monthlies {
        println!(
            "{:<6} {:<7} {}",
            m.id,
            m.month.map(month_name).unwrap_or("-"),
            m.title.as_deref().unwrap_or("—"),
        );
    }
    Ok(())
}

pub async fn cmd_new_monthly(
    client: &ApiClient,
    caps: Capabilities,
    semester_id: i64,
    project_id: i64,
    month: u32,
    title: String,
    desc: Option<String>,
) -> CmdResult {
    if !caps.hod {
        return Err("creating monthly buckets requires Head of Department or above".into());
    }
    if !(1..=12).contains(&month) {
        return Err("month must be between 1 and 12".into());
    }
    let title = non_blank(&title, "title")?;
    client
        .create_monthly(
            semester_id,
            &NewMonthly {
                project_id,
                month,
                title,
                desc,
            },
        )
        .await?;
    println!("Created monthly bucket for {}", month_name(month));
    Ok(())
}

// ---- board ------------------------------------------------------------

pub async fn cmd_board(
    client: &ApiClient,
    caps: Capabilities,
    monthly_id: i64,
    status: Option<Status>,
    priority: Option<Priority>,
    query: Option<String>,
) -> CmdResult {
    let mut board = Board::new(client.clone(), caps, monthly_id);
    board.load().await;
    if let Some(err) = board.error.take() {
        return Err(err.into());
    }

    if let Some(monthly) = &board.monthly {
        println!("{}", monthly.title.as_deref().unwrap_or("Task Board"));
        if let Some(desc) = &monthly.desc {
            println!("{desc}");
        }
        println!();
    }

    let stats = board.stats();
    println!(
        "Tasks: {}  In progress: {}  Completed: {}  Critical: {}  Overdue: {}",
        stats.total, stats.in_progress, stats.completed, stats.critical, stats.overdue
    );
    println!("{} {}%", progress_bar(board.progress(), 30), board.progress());
    println!();

    board.filter = TaskFilter {
        status,
        priority,
        query: query.unwrap_or_default(),
    };
    let filtered = board.filtered();
    if filtered.is_empty() {
        println!("No tasks match.");
        return Ok(());
    }
    print_task_table(&filtered);
    Ok(())
}

pub async fn cmd_view(
    client: &ApiClient,
    caps: Capabilities,
    monthly_id: i64,
    task_id: i64,
) -> CmdResult {
    let mut board = Board::new(client.clone(), caps, monthly_id);
    board.load().await;
    if let Some(err) = board.error.take() {
        return Err(err.into());
    }
    let Some(task) = board.tasks.iter().find(|t| t.id == task_id) else {
        return Err(format!("task {task_id} not found in monthly {monthly_id}").into());
    };

    let today = Local::now().date_naive();
    println!("#{} {}", task.id, task.title);
    println!(
        "  {} · {} · {}%",
        task.status.label(),
        task.priority.label(),
        status_progress(task.status)
    );
    if let Some(desc) = &task.desc {
        println!("  {desc}");
    }
    let due = format_date(task.enddate);
    let overdue = if is_overdue(task.enddate, task.status, today) {
        "  · OVERDUE"
    } else {
        ""
    };
    println!("  Start: {}  Due: {}{}", format_date(task.startdate), due, overdue);
    if let Some(name) = &task.owner_name {
        println!("  Owner: [{}] {}", initials(name), name);
    }
    match &task.pic_name {
        Some(name) => println!("  PIC:   [{}] {}", initials(name), name),
        None => println!("  PIC:   unassigned"),
    }

    println!("\nAttachments ({})", task.evidence_files.len());
    let evidence = EvidencePanel::new(client.clone(), task_id, task.evidence_files.clone());
    for ev in &evidence.files {
        let name = ev.file_name.as_deref().unwrap_or("file");
        let size = ev.file_size.map(format_bytes).unwrap_or_default();
        let url = evidence.resolved_url(ev).unwrap_or_default();
        println!(
            "  {:<6} {:<4} {:<28} {:<10} {}",
            ev.id,
            file_badge(ev.file_type.as_deref(), ev.file_name.as_deref()),
            truncate(name, 28),
            size,
            url
        );
    }

    let mut thread = CommentThread::new(client.clone(), task_id);
    thread.load().await;
    println!("\nComments ({})", thread.comments.len());
    for c in &thread.comments {
        let author = c.employee_name.as_deref().unwrap_or("?");
        let when = c
            .created_at
            .map(|t| t.format("%-d %b %H:%M").to_string())
            .unwrap_or_else(|| "—".into());
        println!("  [{}] {} · {}", initials(author), author, when);
        println!("      {}", c.comment);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_add(
    client: &ApiClient,
    caps: Capabilities,
    monthly_id: i64,
    title: String,
    desc: Option<String>,
    start: Option<String>,
    due: Option<String>,
    status: Status,
    priority: Priority,
    pic: Option<i64>,
) -> CmdResult {
    let draft = TaskDraft {
        title,
        desc: desc.unwrap_or_default(),
        startdate: start.unwrap_or_default(),
        enddate: due.unwrap_or_default(),
        status,
        priority,
        pic: pic.map(|p| p.to_string()).unwrap_or_default(),
    };
    let mut board = Board::new(client.clone(), caps, monthly_id);
    if !board.create_task(&draft).await {
        return Err(board.error.unwrap_or_else(|| "create failed".into()).into());
    }
    println!(
        "Added task to monthly {monthly_id} ({} task(s) on the board)",
        board.tasks.len()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_update(
    client: &ApiClient,
    caps: Capabilities,
    monthly_id: i64,
    task_id: i64,
    title: Option<String>,
    desc: Option<String>,
    start: Option<String>,
    due: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    pic: Option<i64>,
) -> CmdResult {
    let mut board = Board::new(client.clone(), caps, monthly_id);
    board.load().await;
    if let Some(err) = board.error.take() {
        return Err(err.into());
    }
    if !board.tasks.iter().any(|t| t.id == task_id) {
        return Err(format!("task {task_id} not found in monthly {monthly_id}").into());
    }
    board.select(task_id);
    board.begin_edit();

    if let Some(title) = title {
        board.draft.title = title;
    }
    if let Some(desc) = desc {
        board.draft.desc = desc;
    }
    if let Some(start) = start {
        board.draft.startdate = resolve_date_arg(&start)?;
    }
    if let Some(due) = due {
        board.draft.enddate = resolve_date_arg(&due)?;
    }
    if let Some(status) = status {
        board.draft.status = status;
    }
    if let Some(priority) = priority {
        board.draft.priority = priority;
    }
    if let Some(pic) = pic {
        board.draft.pic = pic.to_string();
    }

    if !board.update_selected().await {
        return Err(board.error.unwrap_or_else(|| "update failed".into()).into());
    }
    println!("Updated task {task_id}");
    Ok(())
}

pub async fn cmd_status(client: &ApiClient, task_id: i64, status: Status) -> CmdResult {
    client
        .update_task_status(task_id, &StatusPatch { status })
        .await?;
    println!("Task {task_id} is now {}", status.label());
    Ok(())
}

// ---- comments ---------------------------------------------------------

pub async fn cmd_comments(client: &ApiClient, task_id: i64) -> CmdResult {
    let comments = client.list_comments(task_id).await?;
    if comments.is_empty() {
        println!("No comments yet.");
        return Ok(());
    }
    for c in comments {
        let author = c.employee_name.as_deref().unwrap_or("?");
        let when = c
            .created_at
            .map(|t| t.format("%-d %b %H:%M").to_string())
            .unwrap_or_else(|| "—".into());
        println!("[{}] {} · {}", initials(author), author, when);
        println!("    {}", c.comment);
    }
    Ok(())
}

pub async fn cmd_comment(client: &ApiClient, task_id: i64, text: String) -> CmdResult {
    let Some(comment) = validate_comment(&text) else {
        return Err("comment text must not be empty".into());
    };
    client.add_comment(task_id, &NewComment { comment }).await?;
    println!("Comment added to task {task_id}");
    Ok(())
}

// ---- evidence ---------------------------------------------------------

pub async fn cmd_evidence_list(client: &ApiClient, task_id: i64) -> CmdResult {
    let mut panel = EvidencePanel::new(client.clone(), task_id, Vec::new());
    panel.refresh().await;
    if let Some(err) = panel.error.take() {
        return Err(err.into());
    }
    if panel.files.is_empty() {
        println!("No attachments on task {task_id}.");
        return Ok(());
    }
    println!("{:<6} {:<4} {:<28} {:<10} {}", "ID", "Type", "Name", "Size", "URL");
    for ev in &panel.files {
        let name = ev.file_name.as_deref().unwrap_or("file");
        let size = ev.file_size.map(format_bytes).unwrap_or_default();
        let url = panel.resolved_url(ev).unwrap_or_default();
        println!(
            "{:<6} {:<4} {:<28} {:<10} {}",
            ev.id,
            file_badge(ev.file_type.as_deref(), ev.file_name.as_deref()),
            truncate(name, 28),
            size,
            url
        );
    }
    Ok(())
}

pub async fn cmd_evidence_add(
    client: &ApiClient,
    task_id: i64,
    files: Vec<PathBuf>,
) -> CmdResult {
    let mut panel = EvidencePanel::new(client.clone(), task_id, Vec::new());
    if !panel.upload(&files).await {
        return Err(panel.error.unwrap_or_else(|| "upload failed".into()).into());
    }
    println!("Uploaded {} file(s) to task {task_id}", panel.files.len());
    Ok(())
}

pub async fn cmd_evidence_rm(
    client: &ApiClient,
    task_id: i64,
    evidence_id: i64,
    yes: bool,
) -> CmdResult {
    if !yes {
        let answer = prompt_line(&format!(
            "Delete evidence {evidence_id} from task {task_id}? [y/N] "
        ))?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }
    client.delete_evidence(task_id, evidence_id).await?;
    println!("Deleted evidence {evidence_id}");
    Ok(())
}

// ---- misc -------------------------------------------------------------

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Print tasks in a formatted table.
pub fn print_task_table(tasks: &[&Task]) {
    println!(
        "{:<5} {:<11} {:<9} {:<10} {:<16} {:>4}  {}",
        "ID", "Status", "Pri", "Due", "PIC", "Prog", "Title"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let due = format_date_relative(t.enddate, today);
        let due = if is_overdue(t.enddate, t.status, today) {
            format!("{due}!")
        } else {
            due
        };
        let pic = t.pic_name.as_deref().unwrap_or("-");
        println!(
            "{:<5} {:<11} {:<9} {:<10} {:<16} {:>3}%  {}",
            t.id,
            t.status.label(),
            t.priority.label(),
            due,
            truncate(pic, 16),
            status_progress(t.status),
            t.title
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// ASCII progress bar for the board summary line.
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (percent as usize * width) / 100;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    for i in 0..width {
        bar.push(if i < filled { '#' } else { '-' });
    }
    bar.push(']');
    bar
}

pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    match month {
        1..=12 => NAMES[(month - 1) as usize],
        _ => "-",
    }
}

fn non_blank(value: &str, what: &str) -> Result<String, Box<dyn Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{what} must not be empty").into())
    } else {
        Ok(trimmed.to_string())
    }
}

fn resolve_date_arg(input: &str) -> Result<String, Box<dyn Error>> {
    match parse_date_input(input) {
        Some(date) => Ok(date.to_string()),
        None => Err(format!("unrecognized date: {input}").into()),
    }
}

fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long title", 8), "a rathe…");
    }

    #[test]
    fn progress_bar_scales() {
        assert_eq!(progress_bar(0, 10), "[----------]");
        assert_eq!(progress_bar(50, 10), "[#####-----]");
        assert_eq!(progress_bar(100, 10), "[##########]");
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "Jan");
        assert_eq!(month_name(12), "Dec");
        assert_eq!(month_name(0), "-");
        assert_eq!(month_name(13), "-");
    }
}
