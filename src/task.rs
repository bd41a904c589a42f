//! Wire data model for the task board.
//!
//! Everything the backend sends is validated once here, at the
//! deserialization boundary, so the rest of the crate works with typed
//! records instead of loosely shaped JSON. Fields the backend has been
//! inconsistent about (id spellings, date formats) are normalised on the
//! way in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};

/// A unit of work inside a monthly bucket. The backend is the system of
/// record; this copy is ephemeral and replaced wholesale on every reload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default, deserialize_with = "de::date_opt")]
    pub startdate: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::date_opt")]
    pub enddate: Option<NaiveDate>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub owner_employee_id: Option<i64>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub pic_employee_id: Option<i64>,
    #[serde(default)]
    pub pic_name: Option<String>,
    #[serde(default)]
    pub pic_email: Option<String>,
    #[serde(default, deserialize_with = "de::datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub evidence_files: Vec<Evidence>,
}

/// A month-scoped bucket of tasks under a semester.
#[derive(Debug, Clone, Deserialize)]
pub struct Monthly {
    /// The backend has shipped several spellings of this column.
    #[serde(alias = "monthly_id", alias = "id_monthly", alias = "id_montlhy")]
    pub id: i64,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// A half-year grouping under an annual project.
#[derive(Debug, Clone, Deserialize)]
pub struct Semester {
    pub id: i64,
    /// 1 (Jan–Jun) or 2 (Jul–Dec).
    #[serde(default)]
    pub semester: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// A top-level annual project.
#[derive(Debug, Clone, Deserialize)]
pub struct Annual {
    #[serde(
        alias = "project_id",
        alias = "id_project",
        alias = "pm_project_id",
        alias = "tr_pm_project_id"
    )]
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// A file attached to a task as proof of work.
#[derive(Debug, Clone, Deserialize)]
pub struct Evidence {
    pub id: i64,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Relative storage path; resolve against the API base before use.
    #[serde(default)]
    pub file_path: Option<String>,
}

/// An append-only remark on a task.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default, deserialize_with = "de::datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The cached employee record. Read from the session file and treated as a
/// capability token, not a live entity; the task board never writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub job_level_id: Option<i64>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl Employee {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("User")
    }
}

/// The authenticated user blob returned by the login endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub employee: Option<Employee>,
}

// ---- request payloads -------------------------------------------------

/// Body for creating a task in a monthly bucket.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub desc: Option<String>,
    pub startdate: Option<NaiveDate>,
    pub enddate: Option<NaiveDate>,
    pub status: Status,
    pub priority: Priority,
    pub pic_employee_id: Option<i64>,
}

/// Full-field task update. `pic_employee_id` is omitted entirely (not sent
/// as null) when the actor lacks the HoD capability, so the backend keeps
/// the existing assignment.
#[derive(Debug, Clone, Serialize)]
pub struct TaskPatch {
    pub title: String,
    pub desc: Option<String>,
    pub startdate: Option<NaiveDate>,
    pub enddate: Option<NaiveDate>,
    pub status: Status,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pic_employee_id: Option<Option<i64>>,
}

/// Reduced payload for inline status changes from the list view.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPatch {
    pub status: Status,
}

/// Body for creating an annual project.
#[derive(Debug, Clone, Serialize)]
pub struct NewAnnual {
    pub title: String,
    pub desc: Option<String>,
}

/// Body for creating a semester under an annual project.
#[derive(Debug, Clone, Serialize)]
pub struct NewSemester {
    pub semester: u32,
    pub title: String,
    pub desc: Option<String>,
}

/// Body for creating a monthly bucket under a semester.
#[derive(Debug, Clone, Serialize)]
pub struct NewMonthly {
    #[serde(rename = "projectId")]
    pub project_id: i64,
    pub month: u32,
    pub title: String,
    pub desc: Option<String>,
}

/// Body for posting a comment.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub comment: String,
}

// ---- response envelopes -----------------------------------------------

/// Generic `{ "data": [...] }` list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `GET /monthlies/{id}` response: bucket metadata plus its tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthDetail {
    #[serde(default)]
    pub monthly: Option<Monthly>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// `GET /projects/{id}` response: the project plus its semesters.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnualDetail {
    #[serde(default)]
    pub data: Option<Annual>,
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

/// `GET /semesters/{id}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SemesterDetail {
    #[serde(default)]
    pub data: Option<Semester>,
}

/// `POST /api/auth/login` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub user: User,
}

mod de {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer};

    /// Calendar dates arrive either bare (`2025-03-01`) or with a time
    /// suffix; keep the first ten characters and parse those. Anything
    /// unparseable degrades to `None` instead of failing the payload.
    pub fn date_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(|s| {
            let head = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
        }))
    }

    pub fn datetime_opt<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }
}

/// Two-letter initials for an avatar chip.
pub fn initials(name: &str) -> String {
    let mut parts = name.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(a), Some(b)) => {
            let mut out = String::new();
            out.extend(a.chars().next().map(|c| c.to_ascii_uppercase()));
            out.extend(b.chars().next().map(|c| c.to_ascii_uppercase()));
            out
        }
        (Some(a), None) => a.chars().take(2).collect::<String>().to_uppercase(),
        _ => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn task_dates_take_date_prefix() {
        let t: Task = serde_json::from_str(
            r#"{"id":7,"title":"Site survey","startdate":"2025-02-01T00:00:00.000Z",
                "enddate":"2025-02-28","status":"in_progress","priority":"critical"}"#,
        )
        .unwrap();
        assert_eq!(t.startdate, NaiveDate::from_ymd_opt(2025, 2, 1));
        assert_eq!(t.enddate, NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(t.status, Status::InProgress);
        assert_eq!(t.priority, Priority::Critical);
    }

    #[test]
    fn unknown_status_defaults_at_boundary() {
        let t: Task =
            serde_json::from_str(r#"{"id":1,"title":"X","status":"archived"}"#).unwrap();
        assert_eq!(t.status, Status::Assigned);
        assert_eq!(t.priority, Priority::Medium);
    }

    #[test]
    fn monthly_id_spellings_accepted() {
        for body in [
            r#"{"id":4,"month":3}"#,
            r#"{"monthly_id":4,"month":3}"#,
            r#"{"id_monthly":4,"month":3}"#,
            r#"{"id_montlhy":4,"month":3}"#,
        ] {
            let m: Monthly = serde_json::from_str(body).unwrap();
            assert_eq!(m.id, 4);
        }
    }

    #[test]
    fn patch_omits_pic_without_capability() {
        let patch = TaskPatch {
            title: "T".into(),
            desc: None,
            startdate: None,
            enddate: None,
            status: Status::Assigned,
            priority: Priority::Medium,
            pic_employee_id: None,
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert!(json.get("pic_employee_id").is_none());

        let assign = TaskPatch {
            pic_employee_id: Some(Some(12)),
            ..patch.clone()
        };
        assert_eq!(
            serde_json::to_value(&assign).unwrap()["pic_employee_id"],
            serde_json::json!(12)
        );

        let clear = TaskPatch {
            pic_employee_id: Some(None),
            ..patch
        };
        assert!(serde_json::to_value(&clear).unwrap()["pic_employee_id"].is_null());
    }

    #[test]
    fn initials_of_names() {
        assert_eq!(initials("Rina Wijaya"), "RW");
        assert_eq!(initials("budi"), "BU");
        assert_eq!(initials("  "), "?");
    }

    #[test]
    fn employee_display_name_prefers_full_name() {
        let e = Employee {
            name: Some("budi".into()),
            full_name: Some("Budi Santoso".into()),
            ..Employee::default()
        };
        assert_eq!(e.display_name(), "Budi Santoso");
        let bare = Employee::default();
        assert_eq!(bare.display_name(), "User");
    }
}
