#![warn(clippy::unwrap_in_result)]
#![warn(clippy::unwrap_used)]

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A named node of the folder hierarchy.
///
/// Folders reference their parent by id only. `parent_id == None` means the
/// folder lives at the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    /// Time based identifier with a random suffix
    pub id: String,
    /// Display name, trimmed on creation and rename
    pub name: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// Parent folder id or `null` for the root
    pub parent_id: Option<String>,
    /// Display color as `#RRGGBB`
    pub color: String,
}

/// An uploaded PDF file.
///
/// The id is the name assigned by the storage backend. `folder_id` is joined
/// from the association records at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    /// Backend assigned key of the stored file
    pub id: String,
    /// Stored (timestamp prefixed) name
    pub name: String,
    /// Name the file was uploaded with
    pub original_name: String,
    /// Size of the file in bytes
    pub size: u64,
    /// RFC 3339 upload timestamp
    pub uploaded_at: String,
    /// Location the file can be fetched from
    pub url: String,
    /// Folder the file is associated with or `null` for the root
    pub folder_id: Option<String>,
}

/// Aggregated numbers for files directly inside one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderStats {
    pub folder_id: Option<String>,
    pub file_count: usize,
    pub total_size: u64,
}

/// One step of the path from the root to a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BreadcrumbItem {
    /// Folder id or `null` for the root
    pub id: Option<String>,
    pub name: String,
}

/// Multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    /// Index of the correct option
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Outcome of a finished quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub total_questions: usize,
    pub correct_answers: usize,
    /// Percentage of correct answers rounded to the nearest integer
    pub score: u32,
    /// Chosen option index per question id
    pub answers: BTreeMap<u32, usize>,
    /// Seconds spent on the quiz
    pub time_taken: u64,
}

/// Deserializes a field that distinguishes "absent" from explicit `null`.
///
/// Use together with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FilesQuery {
    /// Folder id, empty for the root, `all` for every file
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilesResponse {
    pub files: Vec<FileItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub file: FileItem,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileActionRequest {
    pub file_id: Option<String>,
    pub new_name: Option<String>,
    /// Absent leaves the folder unchanged, `null` moves the file to the root
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub new_folder_id: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FoldersQuery {
    /// Parent folder id, empty for the root, `all` for every folder
    pub parent_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FolderQuery {
    /// Folder id, empty for the root
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FoldersResponse {
    pub folders: Vec<FolderItem>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FolderResponse {
    pub folder: FolderItem,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolderRequest {
    pub folder_id: Option<String>,
    pub new_name: Option<String>,
    /// Absent leaves the parent unchanged, `null` moves the folder to the root
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub new_parent_id: Option<Option<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolderRequest {
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BreadcrumbsResponse {
    pub path: Vec<BreadcrumbItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    /// Number of association records removed
    pub removed: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatus {
    /// `local` or `s3`
    pub backend: String,
    pub file_count: usize,
    pub sample_files: Vec<FileItem>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuestionsQuery {
    /// Number of questions to draw, 15 when omitted
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub question_ids: Vec<u32>,
    #[serde(default)]
    pub answers: BTreeMap<u32, usize>,
    #[serde(default)]
    pub time_taken: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedTestResult {
    #[serde(flatten)]
    pub result: TestResult,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveResultResponse {
    pub success: bool,
    pub message: String,
    pub result: SavedTestResult,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocxQuizResponse {
    pub success: bool,
    pub filename: String,
    pub questions: Vec<Question>,
    pub message: String,
}
