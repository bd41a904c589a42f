//! Append-only comment thread for the selected task.
//!
//! Comments are supplementary: a failed fetch degrades to an empty list
//! instead of blocking the board. Adding a comment refetches the whole
//! thread rather than splicing locally, so server-assigned id, timestamp
//! and author fields always come from the source of record.

use crate::api::ApiClient;
use crate::task::{Comment, NewComment};

/// Reject empty or whitespace-only comment text before any network call.
pub fn validate_comment(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub struct CommentThread {
    client: ApiClient,
    pub task_id: i64,
    pub comments: Vec<Comment>,
    pub error: Option<String>,
}

impl CommentThread {
    pub fn new(client: ApiClient, task_id: i64) -> Self {
        CommentThread {
            client,
            task_id,
            comments: Vec::new(),
            error: None,
        }
    }

    /// Replace the held list wholesale; on failure show an empty thread.
    pub async fn load(&mut self) {
        match self.client.list_comments(self.task_id).await {
            Ok(comments) => self.comments = comments,
            Err(e) => {
                log::debug!("comment fetch for task {} failed: {e}", self.task_id);
                self.comments.clear();
            }
        }
    }

    /// Post a remark, then refetch the thread. Blank text is rejected
    /// locally and reported via the return value.
    pub async fn add(&mut self, text: &str) -> bool {
        let Some(comment) = validate_comment(text) else {
            return false;
        };
        self.error = None;
        match self
            .client
            .add_comment(self.task_id, &NewComment { comment })
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(validate_comment(""), None);
        assert_eq!(validate_comment("   \t "), None);
        assert_eq!(
            validate_comment("  progress blocked on permit  ").as_deref(),
            Some("progress blocked on permit")
        );
    }
}
