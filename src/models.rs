//! Data models for image-to-text captcha resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client identifier sent with every task submission.
const SOFT_ID: u32 = 4706;

/// Expected answer length for the printed codes this client targets.
const DEFAULT_CODE_LENGTH: u32 = 6;

/// Numeric-hint strength level: digits and letters both allowed.
const DEFAULT_NUMERIC_HINT: u8 = 4;

/// Free-form instruction forwarded to the human/ML worker.
const DEFAULT_COMMENT: &str = "Pay close attention to the letter case.";

/// A captcha image plus the constraints forwarded to the solving service.
///
/// Defaults match the printed account-registration codes this client was
/// built for: exactly 6 case-sensitive alphanumeric characters. The
/// refinement methods consume `self`; once a request is handed to a solver
/// it is never mutated.
///
/// # Example
/// ```ignore
/// let request = SolveRequest::new(image_base64)
///     .length(4, 8)
///     .comment("Digits only, ignore the strike-through line.");
/// ```
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub(crate) image: String,
    pub(crate) min_length: u32,
    pub(crate) max_length: u32,
    pub(crate) numeric: u8,
    pub(crate) case_sensitive: bool,
    pub(crate) comment: String,
}

impl SolveRequest {
    /// Create a request for a base64-encoded captcha image with the
    /// default constraints.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            min_length: DEFAULT_CODE_LENGTH,
            max_length: DEFAULT_CODE_LENGTH,
            numeric: DEFAULT_NUMERIC_HINT,
            case_sensitive: true,
            comment: DEFAULT_COMMENT.to_string(),
        }
    }

    /// Set the expected answer length bounds.
    pub fn length(mut self, min: u32, max: u32) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// Set the numeric-hint strength level.
    pub fn numeric(mut self, level: u8) -> Self {
        self.numeric = level;
        self
    }

    /// Set whether the answer is case-sensitive.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set the free-form instruction shown to the solver.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Opaque server-assigned identifier for a solving task.
///
/// The service returns it as either a JSON integer or a string depending on
/// the endpoint version; both forms are accepted and the numeric form is
/// restored on the wire when the identifier is all-digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskId(String);

impl TaskId {
    /// View the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.0.parse::<u64>() {
            Ok(n) => serializer.serialize_u64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct TaskIdVisitor;

        impl<'de> Visitor<'de> for TaskIdVisitor {
            type Value = TaskId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or integer task identifier")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(TaskId(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(TaskId(v))
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(TaskId(v.to_string()))
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(TaskId(v.to_string()))
            }
        }

        deserializer.deserialize_any(TaskIdVisitor)
    }
}

/// Server-side handle for an in-flight remote solve.
///
/// Created only by a successful submission; the client never mutates it,
/// it only queries the remote resource it names.
#[derive(Debug, Clone)]
pub struct Task {
    /// Identifier assigned by the solving service.
    pub id: TaskId,
    /// When the submission call completed.
    pub submitted_at: DateTime<Utc>,
}

impl Task {
    pub(crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            submitted_at: Utc::now(),
        }
    }
}

/// Uniform result of a remote resolution attempt.
///
/// When `success` is false, `text` holds a human-readable failure
/// description rather than a captcha answer. The task identifier is carried
/// on every branch where a task existed, so a wrong answer can later be
/// reported via [`RemoteSolver::report_bad`](crate::client::RemoteSolver::report_bad).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// Recognized text, or a failure description when `success` is false.
    pub text: String,
    /// Whether the attempt produced a captcha answer.
    pub success: bool,
    /// Identifier of the originating task, when one was created.
    pub task_id: Option<TaskId>,
}

impl SolveOutcome {
    pub(crate) fn solved(text: impl Into<String>, task_id: TaskId) -> Self {
        Self {
            text: text.into(),
            success: true,
            task_id: Some(task_id),
        }
    }

    pub(crate) fn failed(description: impl Into<String>, task_id: Option<TaskId>) -> Self {
        Self {
            text: description.into(),
            success: false,
            task_id,
        }
    }
}

/// Result of a fire-and-forget bad-solution report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    /// Whether the notification reached the service.
    pub success: bool,
    /// Raw service response on success, failure description otherwise.
    pub detail: String,
}

// --- Wire shapes for the solving service API ---

/// Body of `POST /createTask`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskRequest<'a> {
    pub client_key: &'a str,
    pub soft_id: u32,
    pub task: ImageToTextTask<'a>,
}

impl<'a> CreateTaskRequest<'a> {
    pub(crate) fn new(client_key: &'a str, request: &'a SolveRequest) -> Self {
        Self {
            client_key,
            soft_id: SOFT_ID,
            task: ImageToTextTask {
                kind: "ImageToTextTask",
                body: &request.image,
                phrase: false,
                case: request.case_sensitive,
                numeric: request.numeric,
                math: false,
                min_length: request.min_length,
                max_length: request.max_length,
                comment: &request.comment,
            },
        }
    }
}

/// Task payload embedded in [`CreateTaskRequest`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageToTextTask<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub body: &'a str,
    pub phrase: bool,
    pub case: bool,
    pub numeric: u8,
    pub math: bool,
    pub min_length: u32,
    pub max_length: u32,
    pub comment: &'a str,
}

/// Response of `POST /createTask`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskResponse {
    pub error_id: i64,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Body of `POST /getTaskResult` and `POST /reportIncorrect`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskQuery<'a> {
    pub client_key: &'a str,
    pub task_id: &'a TaskId,
}

/// Response of `POST /getTaskResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskResultResponse {
    pub error_id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub solution: Option<Solution>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Solution payload of a ready task.
#[derive(Debug, Deserialize)]
pub(crate) struct Solution {
    #[serde(default)]
    pub text: Option<String>,
}
