use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a task.
///
/// A task only moves forward through `Processing`, `Generating`, `Deploying`
/// and `Completed`. `Failed` is reachable from every non-terminal state.
/// Nothing leaves `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Generating,
    Deploying,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether a task currently in `self` may move to `next`.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            TaskStatus::Failed => true,
            _ => next.rank() > self.rank(),
        }
    }

    fn rank(self) -> u8 {
        match self {
            TaskStatus::Processing => 0,
            TaskStatus::Generating => 1,
            TaskStatus::Deploying => 2,
            TaskStatus::Completed | TaskStatus::Failed => 3,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Generating => write!(f, "generating"),
            TaskStatus::Deploying => write!(f, "deploying"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A file handed to the model alongside the brief.
/// `url` is usually a data URI; it is never fetched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Body of `POST /ready`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskSubmission {
    /// Task identifier. Also the source of the repository name.
    pub task: String,
    pub email: String,
    pub secret: String,
    #[serde(default = "default_round")]
    pub round: u32,
    pub nonce: String,
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub evaluation_url: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

fn default_round() -> u32 {
    1
}

/// Immediate answer to a submission.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskAccepted {
    pub id: String,
    pub status: TaskStatus,
    pub repo_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub round: u32,
    pub repo_name: String,
    pub nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// A fresh `processing` record for an accepted submission.
    pub fn accepted(submission: TaskSubmission, repo_name: String) -> Self {
        let now = Utc::now();
        let evaluation_url = Some(submission.evaluation_url)
            .filter(|url| !url.trim().is_empty());
        Self {
            id: submission.task,
            status: TaskStatus::Processing,
            brief: submission.brief,
            checks: submission.checks,
            evaluation_url,
            attachments: submission.attachments,
            round: submission.round,
            repo_name,
            nonce: submission.nonce,
            live_url: None,
            repo_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body POSTed to the caller's evaluation URL once a task completes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CallbackPayload {
    pub nonce: String,
    pub repo_url: String,
    pub live_url: String,
    pub task_id: String,
}
