//! HTTP client for the project-management backend.
//!
//! The backend is the system of record for everything on the board; this
//! client only moves typed payloads in and out. Non-2xx responses are
//! parsed for a `message` field and surfaced as that text, with a generic
//! fallback when the error body is not JSON. Nothing here retries or
//! cancels; each call runs to completion and the caller decides what to do
//! with the result.

use std::path::Path;

use log::debug;
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::task::{
    Annual, AnnualDetail, Comment, DataList, Evidence, LoginResponse, MonthDetail, Monthly,
    NewAnnual, NewComment, NewMonthly, NewSemester, NewTask, Semester, SemesterDetail,
    StatusPatch, TaskPatch, User,
};

/// Backend base URL used when neither `--api-url` nor `PMB_API_URL` is set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "PMB_API_URL";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status; holds its message.
    #[error("{0}")]
    Backend(String),
    /// The request never completed (connection, TLS, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A 2xx response whose body did not match the expected shape.
    #[error("unexpected response from backend: {0}")]
    Decode(#[from] serde_json::Error),
    /// A local file for an evidence upload could not be read.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Client for the board API. Cheap to clone per reqwest's own semantics.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    cookie: Option<String>,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, cookie: Option<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        ApiClient {
            http: reqwest::Client::new(),
            base,
            cookie,
        }
    }

    /// Resolve a relative storage path from the backend into a full URL.
    /// Relative paths are never rendered or downloaded directly.
    pub fn resolve_file_url(&self, file_path: &str) -> String {
        resolve_file_url(&self.base, file_path)
    }

    fn pm_url(&self, path: &str) -> String {
        format!("{}/api/pm{}", self.base, path)
    }

    /// Attach the session cookie, send, and decode. All endpoints except
    /// login and multipart upload funnel through here.
    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let req = match &self.cookie {
            Some(cookie) => req.header(COOKIE, cookie),
            None => req,
        };
        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ApiError::Backend(error_message(&body, status)));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.pm_url(path);
        debug!("GET {url}");
        self.send(self.http.get(&url)).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.pm_url(path);
        debug!("POST {url}");
        self.send(self.http.post(&url).json(body)).await
    }

    // ---- auth ----------------------------------------------------------

    /// Authenticate and return the session cookie plus the user blob. The
    /// caller persists both in the session file; this client itself stays
    /// stateless.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Option<String>, User), ApiError> {
        let url = format!("{}/api/auth/login", self.base);
        debug!("POST {url}");
        let res = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let status = res.status();
        let cookie = cookie_from_headers(res.headers());
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ApiError::Backend(error_message(&body, status)));
        }
        let parsed: LoginResponse = serde_json::from_str(&body)?;
        Ok((cookie, parsed.user))
    }

    // ---- annual --------------------------------------------------------

    pub async fn list_annuals(&self) -> Result<Vec<Annual>, ApiError> {
        let res: DataList<Annual> = self.get_json("/projects").await?;
        Ok(res.data)
    }

    pub async fn create_annual(&self, payload: &NewAnnual) -> Result<(), ApiError> {
        self.post_json::<serde_json::Value, _>("/projects", payload)
            .await?;
        Ok(())
    }

    pub async fn annual_detail(&self, project_id: i64) -> Result<AnnualDetail, ApiError> {
        self.get_json(&format!("/projects/{project_id}")).await
    }

    // ---- semester ------------------------------------------------------

    pub async fn list_semesters(&self, project_id: i64) -> Result<Vec<Semester>, ApiError> {
        let res: DataList<Semester> = self
            .get_json(&format!("/projects/{project_id}/semesters"))
            .await?;
        Ok(res.data)
    }

    pub async fn create_semester(
        &self,
        project_id: i64,
        payload: &NewSemester,
    ) -> Result<(), ApiError> {
        self.post_json::<serde_json::Value, _>(
            &format!("/projects/{project_id}/semesters"),
            payload,
        )
        .await?;
        Ok(())
    }

    pub async fn semester_detail(&self, semester_id: i64) -> Result<SemesterDetail, ApiError> {
        self.get_json(&format!("/semesters/{semester_id}")).await
    }

    // ---- monthly -------------------------------------------------------

    pub async fn list_monthlies(&self, semester_id: i64) -> Result<Vec<Monthly>, ApiError> {
        let res: DataList<Monthly> = self
            .get_json(&format!("/semesters/{semester_id}/monthlies"))
            .await?;
        Ok(res.data)
    }

    pub async fn create_monthly(
        &self,
        semester_id: i64,
        payload: &NewMonthly,
    ) -> Result<(), ApiError> {
        self.post_json::<serde_json::Value, _>(
            &format!("/semesters/{semester_id}/monthlies"),
            payload,
        )
        .await?;
        Ok(())
    }

    pub async fn month_detail(&self, monthly_id: i64) -> Result<MonthDetail, ApiError> {
        self.get_json(&format!("/monthlies/{monthly_id}")).await
    }

    // ---- tasks ---------------------------------------------------------

    pub async fn create_task(&self, monthly_id: i64, payload: &NewTask) -> Result<(), ApiError> {
        self.post_json::<serde_json::Value, _>(&format!("/monthlies/{monthly_id}/tasks"), payload)
            .await?;
        Ok(())
    }

    pub async fn update_task(&self, task_id: i64, payload: &TaskPatch) -> Result<(), ApiError> {
        let url = self.pm_url(&format!("/tasks/{task_id}"));
        debug!("PUT {url}");
        self.send::<serde_json::Value>(self.http.put(&url).json(payload))
            .await?;
        Ok(())
    }

    /// Reduced-payload variant for inline status changes from the list view.
    pub async fn update_task_status(
        &self,
        task_id: i64,
        payload: &StatusPatch,
    ) -> Result<(), ApiError> {
        let url = self.pm_url(&format!("/tasks/{task_id}"));
        debug!("PUT {url} (status only)");
        self.send::<serde_json::Value>(self.http.put(&url).json(payload))
            .await?;
        Ok(())
    }

    // ---- comments ------------------------------------------------------

    pub async fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, ApiError> {
        let res: DataList<Comment> = self.get_json(&format!("/tasks/{task_id}/comments")).await?;
        Ok(res.data)
    }

    pub async fn add_comment(&self, task_id: i64, payload: &NewComment) -> Result<(), ApiError> {
        self.post_json::<serde_json::Value, _>(&format!("/tasks/{task_id}/comments"), payload)
            .await?;
        Ok(())
    }

    // ---- evidence ------------------------------------------------------

    pub async fn list_evidence(&self, task_id: i64) -> Result<Vec<Evidence>, ApiError> {
        let res: DataList<Evidence> = self.get_json(&format!("/tasks/{task_id}/evidence")).await?;
        Ok(res.data)
    }

    /// Upload one or more files in a single multipart call. Returns the
    /// created attachment records so the caller can append them locally
    /// without a full task reload.
    pub async fn upload_evidence(
        &self,
        task_id: i64,
        files: &[impl AsRef<Path>],
    ) -> Result<Vec<Evidence>, ApiError> {
        let mut form = Form::new();
        for path in files {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string());
            form = form.part("files", Part::bytes(bytes).file_name(file_name));
        }
        let url = self.pm_url(&format!("/tasks/{task_id}/evidence"));
        debug!("POST {url} (multipart, {} file(s))", files.len());
        let res: DataList<Evidence> = self.send(self.http.post(&url).multipart(form)).await?;
        Ok(res.data)
    }

    pub async fn delete_evidence(&self, task_id: i64, evidence_id: i64) -> Result<(), ApiError> {
        let url = self.pm_url(&format!("/tasks/{task_id}/evidence/{evidence_id}"));
        debug!("DELETE {url}");
        self.send::<serde_json::Value>(self.http.delete(&url))
            .await?;
        Ok(())
    }
}

/// Extract the human-readable message from an error body, falling back to
/// a generic line when the body is not the expected JSON shape.
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()))
}

/// Collapse `Set-Cookie` headers into the string sent back on every
/// subsequent request. Attributes after the first `;` are dropped; this
/// client does not implement cookie expiry or scoping.
fn cookie_from_headers(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// See [`ApiClient::resolve_file_url`].
pub fn resolve_file_url(base: &str, file_path: &str) -> String {
    if file_path.starts_with("http://") || file_path.starts_with("https://") {
        return file_path.to_string();
    }
    let base = base.trim_end_matches('/');
    if file_path.starts_with('/') {
        format!("{base}{file_path}")
    } else {
        format!("{base}/{file_path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn error_message_prefers_backend_text() {
        assert_eq!(
            error_message(r#"{"message":"Title wajib diisi"}"#, StatusCode::BAD_REQUEST),
            "Title wajib diisi"
        );
    }

    #[test]
    fn error_message_falls_back_on_junk_bodies() {
        assert_eq!(
            error_message("<html>gateway timeout</html>", StatusCode::BAD_GATEWAY),
            "Request failed (502)"
        );
        assert_eq!(
            error_message(r#"{"error":"no message field"}"#, StatusCode::FORBIDDEN),
            "Request failed (403)"
        );
    }

    #[test]
    fn cookies_collapse_to_name_value_pairs() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("sid=abc; Path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("csrf=xyz; Path=/"));
        assert_eq!(cookie_from_headers(&headers).as_deref(), Some("sid=abc; csrf=xyz"));
        assert_eq!(cookie_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn file_urls_resolve_against_base() {
        assert_eq!(
            resolve_file_url("http://localhost:3001", "/uploads/evidence/a.png"),
            "http://localhost:3001/uploads/evidence/a.png"
        );
        assert_eq!(
            resolve_file_url("http://localhost:3001/", "uploads/b.pdf"),
            "http://localhost:3001/uploads/b.pdf"
        );
        // Absolute URLs pass through untouched.
        assert_eq!(
            resolve_file_url("http://localhost:3001", "https://cdn.example.com/c.png"),
            "https://cdn.example.com/c.png"
        );
    }
}
