//! Form handling for the terminal user interface.
//!
//! `TaskForm` backs both the add-task and edit-task dialogs: text fields
//! for the free-form values, cycling selectors for status and priority,
//! and a PIC field that only exists for actors with the HoD capability.
//! `BucketForm` is the lighter create dialog shared by the annual,
//! semester and monthly levels of the hierarchy browser.

use crate::board::TaskDraft;
use crate::fields::{Priority, Status};
use crate::session::Capabilities;
use crate::tui::enums::NavLevel;
use crate::tui::input::InputField;

/// Field order constants for the task form.
pub const TITLE_FIELD: usize = 0;
pub const DESC_FIELD: usize = 1;
pub const START_FIELD: usize = 2;
pub const DUE_FIELD: usize = 3;
pub const STATUS_FIELD: usize = 4;
pub const PRIORITY_FIELD: usize = 5;
pub const PIC_FIELD: usize = 6;

/// Task form for creating and editing tasks.
pub struct TaskForm {
    pub title: InputField,
    pub desc: InputField,
    pub start: InputField,
    pub due: InputField,
    pub pic: InputField,
    pub status: usize,
    pub priority: usize,
    pub current_field: usize,
    /// PIC assignment renders only for HoD and above.
    pub show_pic: bool,
}

impl TaskForm {
    pub fn new(caps: Capabilities) -> Self {
        let mut form = TaskForm {
            title: InputField::new(),
            desc: InputField::new(),
            start: InputField::new(),
            due: InputField::new(),
            pic: InputField::new(),
            status: 0,
            priority: 1, // Medium
            current_field: TITLE_FIELD,
            show_pic: caps.hod,
        };
        form.update_active_field();
        form
    }

    /// Create a task form populated from a draft snapshot.
    pub fn from_draft(draft: &TaskDraft, caps: Capabilities) -> Self {
        let mut form = Self::new(caps);
        form.title = InputField::with_value(&draft.title);
        form.desc = InputField::with_value(&draft.desc);
        form.start = InputField::with_value(&draft.startdate);
        form.due = InputField::with_value(&draft.enddate);
        form.pic = InputField::with_value(&draft.pic);
        form.status = Status::ALL.iter().position(|&s| s == draft.status).unwrap_or(0);
        form.priority = Priority::ALL
            .iter()
            .position(|&p| p == draft.priority)
            .unwrap_or(1);
        form.update_active_field();
        form
    }

    /// Collapse the form back into a draft for the board to submit.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.value.clone(),
            desc: self.desc.value.clone(),
            startdate: self.start.value.clone(),
            enddate: self.due.value.clone(),
            status: Status::ALL[self.status],
            priority: Priority::ALL[self.priority],
            pic: if self.show_pic {
                self.pic.value.clone()
            } else {
                String::new()
            },
        }
    }

    pub fn field_count(&self) -> usize {
        if self.show_pic {
            7
        } else {
            6
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    fn fields_mut(&mut self) -> [&mut InputField; 5] {
        [
            &mut self.title,
            &mut self.desc,
            &mut self.start,
            &mut self.due,
            &mut self.pic,
        ]
    }

    fn update_active_field(&mut self) {
        let current = self.current_field;
        for field in self.fields_mut() {
            field.active = false;
        }
        match current {
            TITLE_FIELD => self.title.active = true,
            DESC_FIELD => self.desc.active = true,
            START_FIELD => self.start.active = true,
            DUE_FIELD => self.due.active = true,
            PIC_FIELD => self.pic.active = true,
            _ => {} // selectors
        }
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_FIELD => Some(&mut self.title),
            DESC_FIELD => Some(&mut self.desc),
            START_FIELD => Some(&mut self.start),
            DUE_FIELD => Some(&mut self.due),
            PIC_FIELD => Some(&mut self.pic),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_backspace();
        }
    }

    /// Left/right arrows: cursor movement in text fields, cycling in the
    /// status and priority selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            STATUS_FIELD => {
                let n = Status::ALL.len();
                self.status = if right {
                    (self.status + 1) % n
                } else {
                    (self.status + n - 1) % n
                };
            }
            PRIORITY_FIELD => {
                let n = Priority::ALL.len();
                self.priority = if right {
                    (self.priority + 1) % n
                } else {
                    (self.priority + n - 1) % n
                };
            }
            _ => {
                if let Some(field) = self.active_input() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }
}

/// Create dialog for a hierarchy bucket. The numeric field is the month
/// (monthly level) or the semester half (semester level); annual projects
/// need none.
pub struct BucketForm {
    pub title: InputField,
    pub desc: InputField,
    pub number: InputField,
    pub level: NavLevel,
    pub current_field: usize,
}

impl BucketForm {
    pub fn new(level: NavLevel) -> Self {
        let mut number = InputField::new();
        if level == NavLevel::Semester {
            number.set("1");
        }
        BucketForm {
            title: InputField::new(),
            desc: InputField::new(),
            number,
            level,
            current_field: 0,
        }
    }

    pub fn number_label(&self) -> Option<&'static str> {
        match self.level {
            NavLevel::Annual => None,
            NavLevel::Semester => Some("Semester (1-2)"),
            NavLevel::Monthly => Some("Month (1-12)"),
        }
    }

    pub fn field_count(&self) -> usize {
        if self.number_label().is_some() {
            3
        } else {
            2
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.sync_active();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.sync_active();
    }

    fn sync_active(&mut self) {
        let current = self.current_field;
        self.title.active = current == 0;
        self.desc.active = current == 1;
        self.number.active = current == 2;
    }

    pub fn active_input(&mut self) -> &mut InputField {
        match self.current_field {
            0 => &mut self.title,
            1 => &mut self.desc,
            _ => &mut self.number,
        }
    }

    pub fn parsed_number(&self) -> Option<u32> {
        self.number.value.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pic_field_exists_only_for_hod() {
        let staff = TaskForm::new(Capabilities::default());
        assert_eq!(staff.field_count(), 6);
        let hod = TaskForm::new(Capabilities { bod: false, hod: true });
        assert_eq!(hod.field_count(), 7);
    }

    #[test]
    fn draft_round_trip() {
        let draft = TaskDraft {
            title: "Survey".into(),
            desc: "Outlet 1".into(),
            startdate: "2025-02-01".into(),
            enddate: "2025-02-28".into(),
            status: Status::InProgress,
            priority: Priority::Critical,
            pic: "12".into(),
        };
        let caps = Capabilities { bod: false, hod: true };
        let form = TaskForm::from_draft(&draft, caps);
        assert_eq!(form.to_draft(), draft);
    }

    #[test]
    fn staff_form_drops_pic_from_draft() {
        let mut form = TaskForm::new(Capabilities::default());
        form.pic = InputField::with_value("99");
        assert_eq!(form.to_draft().pic, "");
    }

    #[test]
    fn selector_cycling_wraps() {
        let mut form = TaskForm::new(Capabilities::default());
        form.current_field = STATUS_FIELD;
        form.handle_left_right(false);
        assert_eq!(form.status, Status::ALL.len() - 1);
        form.handle_left_right(true);
        assert_eq!(form.status, 0);
    }

    #[test]
    fn bucket_form_field_counts() {
        assert_eq!(BucketForm::new(NavLevel::Annual).field_count(), 2);
        assert_eq!(BucketForm::new(NavLevel::Semester).field_count(), 3);
        assert_eq!(BucketForm::new(NavLevel::Monthly).field_count(), 3);
    }
}
