//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, Status};

// These support branded views of the UI
// reflecting the current hierarchy level

/// Used for annual projects
pub const ANNUAL_BLUE: Color = Color::Rgb(30, 64, 175);
/// Used for semesters
pub const SEMESTER_PURPLE: Color = Color::Rgb(109, 40, 217);
/// Used for monthly buckets
pub const MONTHLY_ORANGE: Color = Color::Rgb(234, 88, 12);
/// Used for the board header
pub const BOARD_SLATE: Color = Color::Rgb(51, 65, 85);

/// Status dot/accent color, matching the board's palette.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::Assigned => Color::Rgb(148, 163, 184),
        Status::OnHold => Color::Rgb(161, 161, 170),
        Status::InProgress => Color::Rgb(245, 158, 11),
        Status::RevisionRequired => Color::Rgb(244, 63, 94),
        Status::SubmittedForReview => Color::Rgb(99, 102, 241),
        Status::Approved => Color::Rgb(16, 185, 129),
        Status::Completed => Color::Rgb(4, 120, 87),
    }
}

/// Priority pill color.
pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Critical => Color::Rgb(225, 29, 72),
        Priority::Medium => Color::Rgb(245, 158, 11),
        Priority::Low => Color::Rgb(5, 150, 105),
    }
}
