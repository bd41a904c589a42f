//! Evidence attachments for the selected task.
//!
//! Evidence is independent of task fields, so a successful upload appends
//! the returned records to the local list without a full board reload, and
//! a delete splices the record out only after the backend confirms. The
//! list held here belongs to exactly one task at a time.

use std::path::Path;

use crate::api::{ApiClient, ApiError};
use crate::task::Evidence;

/// Preview classification for an attachment. Images and PDFs get an
/// in-client preview affordance; everything else is download-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Other,
}

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"];

fn extension_of(file_name: &str) -> Option<String> {
    file_name.rsplit('.').next().map(str::to_lowercase)
}

/// Classify by MIME type first, falling back to the filename extension;
/// the backend does not always report a type.
pub fn classify(file_type: Option<&str>, file_name: Option<&str>) -> FileKind {
    if let Some(mime) = file_type {
        if mime.starts_with("image/") {
            return FileKind::Image;
        }
        if mime == "application/pdf" {
            return FileKind::Pdf;
        }
    }
    if let Some(name) = file_name {
        if let Some(ext) = extension_of(name) {
            if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                return FileKind::Image;
            }
            if ext == "pdf" {
                return FileKind::Pdf;
            }
        }
    }
    FileKind::Other
}

/// Short badge text for the attachment row.
pub fn file_badge(file_type: Option<&str>, file_name: Option<&str>) -> &'static str {
    match classify(file_type, file_name) {
        FileKind::Image => "IMG",
        FileKind::Pdf => "PDF",
        FileKind::Other => {
            let mime = file_type.unwrap_or("");
            let ext = file_name.and_then(extension_of).unwrap_or_default();
            if mime.contains("spreadsheet") || ext == "xls" || ext == "xlsx" {
                "XLS"
            } else if mime.contains("word") || ext == "doc" || ext == "docx" {
                "DOC"
            } else if mime.contains("zip") || ["zip", "rar", "7z"].contains(&ext.as_str()) {
                "ZIP"
            } else {
                "FILE"
            }
        }
    }
}

/// Human-readable byte size.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

/// Attachment list for the currently selected task.
pub struct EvidencePanel {
    client: ApiClient,
    pub task_id: i64,
    pub files: Vec<Evidence>,
    pub error: Option<String>,
}

impl EvidencePanel {
    /// Seed from the files already embedded in the loaded task record.
    pub fn new(client: ApiClient, task_id: i64, initial: Vec<Evidence>) -> Self {
        EvidencePanel {
            client,
            task_id,
            files: initial,
            error: None,
        }
    }

    /// Re-fetch the attachment list wholesale.
    pub async fn refresh(&mut self) {
        self.error = None;
        match self.client.list_evidence(self.task_id).await {
            Ok(files) => self.files = files,
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Upload one or more files in a single call. On success the returned
    /// records are appended; on failure the displayed list is untouched.
    pub async fn upload(&mut self, paths: &[impl AsRef<Path>]) -> bool {
        if paths.is_empty() {
            return false;
        }
        self.error = None;
        match self.client.upload_evidence(self.task_id, paths).await {
            Ok(created) => {
                self.apply_uploaded(created);
                true
            }
            Err(e) => {
                self.apply_upload_failed(e);
                false
            }
        }
    }

    /// Delete one attachment. The caller must have obtained interactive
    /// confirmation before invoking this; the record leaves the local list
    /// only after the backend accepts the delete.
    pub async fn remove(&mut self, evidence_id: i64) -> bool {
        self.error = None;
        match self.client.delete_evidence(self.task_id, evidence_id).await {
            Ok(()) => {
                self.apply_removed(evidence_id);
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub fn apply_uploaded(&mut self, created: Vec<Evidence>) {
        self.files.extend(created);
    }

    pub fn apply_upload_failed(&mut self, error: ApiError) {
        self.error = Some(error.to_string());
    }

    pub fn apply_removed(&mut self, evidence_id: i64) {
        self.files.retain(|f| f.id != evidence_id);
    }

    /// Full URL for download or preview; relative storage paths are always
    /// joined with the API base first.
    pub fn resolved_url(&self, evidence: &Evidence) -> Option<String> {
        evidence
            .file_path
            .as_deref()
            .map(|p| self.client.resolve_file_url(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(id: i64, name: &str, mime: Option<&str>) -> Evidence {
        Evidence {
            id,
            file_name: Some(name.to_string()),
            file_type: mime.map(str::to_string),
            file_size: Some(2048),
            file_path: Some(format!("/uploads/{name}")),
        }
    }

    fn panel_with(files: Vec<Evidence>) -> EvidencePanel {
        EvidencePanel::new(ApiClient::new("http://localhost:3001", None), 9, files)
    }

    #[test]
    fn classification_by_mime_then_extension() {
        assert_eq!(classify(Some("image/png"), None), FileKind::Image);
        assert_eq!(classify(Some("application/pdf"), None), FileKind::Pdf);
        assert_eq!(classify(None, Some("photo.JPG")), FileKind::Image);
        assert_eq!(classify(None, Some("report.pdf")), FileKind::Pdf);
        assert_eq!(classify(None, Some("notes.txt")), FileKind::Other);
        assert_eq!(classify(None, None), FileKind::Other);
    }

    #[test]
    fn badges_for_office_and_archive_files() {
        assert_eq!(file_badge(None, Some("sheet.xlsx")), "XLS");
        assert_eq!(file_badge(None, Some("letter.docx")), "DOC");
        assert_eq!(file_badge(None, Some("bundle.zip")), "ZIP");
        assert_eq!(file_badge(None, Some("data.bin")), "FILE");
        assert_eq!(file_badge(Some("image/webp"), Some("x.webp")), "IMG");
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn successful_upload_appends_exactly_the_returned_records() {
        let mut panel = panel_with(vec![evidence(1, "before.png", None)]);
        panel.apply_uploaded(vec![
            evidence(2, "site-a.png", Some("image/png")),
            evidence(3, "site-b.pdf", Some("application/pdf")),
        ]);
        assert_eq!(panel.files.len(), 3);
        assert_eq!(panel.files[1].id, 2);
        assert_eq!(panel.files[2].id, 3);
    }

    #[test]
    fn failed_upload_leaves_list_unchanged_and_surfaces_error() {
        let mut panel = panel_with(vec![evidence(1, "before.png", None)]);
        panel.apply_upload_failed(ApiError::Backend("Upload failed".into()));
        assert_eq!(panel.files.len(), 1);
        assert_eq!(panel.error.as_deref(), Some("Upload failed"));
    }

    #[test]
    fn removal_splices_one_record() {
        let mut panel = panel_with(vec![
            evidence(1, "a.png", None),
            evidence(2, "b.png", None),
        ]);
        panel.apply_removed(1);
        assert_eq!(panel.files.len(), 1);
        assert_eq!(panel.files[0].id, 2);
    }

    #[test]
    fn urls_resolve_against_the_api_base() {
        let panel = panel_with(vec![]);
        let ev = evidence(1, "a.png", None);
        assert_eq!(
            panel.resolved_url(&ev).as_deref(),
            Some("http://localhost:3001/uploads/a.png")
        );
        let pathless = Evidence {
            file_path: None,
            ..ev
        };
        assert_eq!(panel.resolved_url(&pathless), None);
    }
}
