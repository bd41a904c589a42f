//! Enumerations for TUI state management.

/// Application screen state for the terminal user interface.
#[derive(Clone, Copy, PartialEq)]
pub enum AppState {
    /// Hierarchy browser: annual projects, semesters or monthly buckets.
    Buckets,
    /// The monthly task board (list + detail panel).
    Board,
    AddTask,
    EditTask,
    /// Create form for the current hierarchy level.
    BucketForm,
    /// Status quick-pick popup over the board.
    StatusPick,
    /// Single-line comment composer.
    CommentInput,
    /// Evidence upload path prompt.
    UploadInput,
    Confirm,
    Help,
}

/// Hierarchy levels for the bucket browser.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum NavLevel {
    Annual,
    Semester,
    Monthly,
}

/// Context for hierarchical navigation: which level is listed and which
/// parents were drilled through to get here.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct NavContext {
    pub annual_id: Option<i64>,
    pub annual_title: Option<String>,
    pub semester_id: Option<i64>,
    pub semester_no: Option<u32>,
}

impl NavContext {
    pub fn level(&self) -> NavLevel {
        if self.semester_id.is_some() {
            NavLevel::Monthly
        } else if self.annual_id.is_some() {
            NavLevel::Semester
        } else {
            NavLevel::Annual
        }
    }

    /// Drill into an annual project.
    pub fn enter_annual(&mut self, id: i64, title: Option<String>) {
        self.annual_id = Some(id);
        self.annual_title = title;
        self.semester_id = None;
        self.semester_no = None;
    }

    /// Drill into a semester.
    pub fn enter_semester(&mut self, id: i64, number: Option<u32>) {
        self.semester_id = Some(id);
        self.semester_no = number;
    }

    /// Go up one level. Returns false when already at the top.
    pub fn pop(&mut self) -> bool {
        if self.semester_id.is_some() {
            self.semester_id = None;
            self.semester_no = None;
            true
        } else if self.annual_id.is_some() {
            self.annual_id = None;
            self.annual_title = None;
            true
        } else {
            false
        }
    }

    /// Get a human-readable display name for this navigation context.
    pub fn display_name(&self) -> String {
        match self.level() {
            NavLevel::Annual => "Annual Projects".to_string(),
            NavLevel::Semester => format!(
                "Semesters of {}",
                self.annual_title.as_deref().unwrap_or("project")
            ),
            NavLevel::Monthly => match self.semester_no {
                Some(n) => format!("Monthlies of Semester {n}"),
                None => "Monthlies".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drilling_and_popping_levels() {
        let mut nav = NavContext::default();
        assert_eq!(nav.level(), NavLevel::Annual);
        nav.enter_annual(3, Some("Expansion 2025".into()));
        assert_eq!(nav.level(), NavLevel::Semester);
        nav.enter_semester(7, Some(2));
        assert_eq!(nav.level(), NavLevel::Monthly);
        assert!(nav.pop());
        assert_eq!(nav.level(), NavLevel::Semester);
        assert!(nav.pop());
        assert_eq!(nav.level(), NavLevel::Annual);
        assert!(!nav.pop());
    }
}
