//! Terminal setup and the TUI entry point.

use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;

use crate::api::ApiClient;
use crate::session::Capabilities;
use crate::task::Employee;
use crate::tui::app::App;

/// Launch the interactive board UI, optionally jumping straight into a
/// monthly bucket. The terminal is restored even when the app errors.
pub fn run_tui(
    rt: &Runtime,
    client: ApiClient,
    caps: Capabilities,
    employee: Option<Employee>,
    start_monthly: Option<i64>,
) -> io::Result<()> {
    let mut app = App::new(rt, client, caps, employee, start_monthly);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}
