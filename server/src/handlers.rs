#![allow(clippy::unused_async)]
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use futures::{Stream, TryStreamExt};
use kernel::{
    BreadcrumbsResponse, CleanupResponse, CreateFolderRequest, DeleteFolderRequest,
    DocxQuizResponse, ErrorResponse, FileActionRequest, FilesQuery, FilesResponse, FolderQuery,
    FolderResponse, FolderStats, FoldersQuery, FoldersResponse, MessageResponse,
    QuestionsQuery, QuestionsResponse, SaveResultResponse, SavedTestResult, ScoreRequest,
    StorageStatus, SuccessResponse, TestResult, UpdateFolderRequest, UploadResponse,
};
use serde::Serialize;
use tokio_util::io::StreamReader;

use crate::docx;
use crate::error::StoreError;
use crate::file_reply::FileReply;
use crate::files::{Scope, PDF_CONTENT_TYPE};
use crate::folders::MoveOutcome;
use crate::quiz::{self, DEFAULT_QUESTION_COUNT};
use crate::AppState;

const ALL: &str = "all";
const FILE_FIELD: &str = "file";
const CUSTOM_NAME_FIELD: &str = "customName";
const FOLDER_ID_FIELD: &str = "folderId";
const STATUS_SAMPLE_SIZE: usize = 3;

type Reply = (StatusCode, Response);

/// Lists files of a folder
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(FilesQuery),
    responses(
        (status = 200, description = "Files of the folder, newest first", body = FilesResponse),
    ),
)]
pub async fn get_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilesQuery>,
) -> impl IntoResponse {
    let folder = non_empty(query.folder_id);
    let scope = match folder.as_deref() {
        Some(ALL) => Scope::All,
        other => Scope::Folder(other),
    };
    let files = state.files.list(scope).await;
    ok(FilesResponse { files })
}

/// Uploads a PDF file, optionally renamed and placed into a folder
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "files",
    request_body(content_type = "multipart/form-data", description = "`file`, optional `customName` and `folderId`"),
    responses(
        (status = 200, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "No file or not a PDF", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
)]
pub async fn upload_file(State(state): State<Arc<AppState>>, multipart: Multipart) -> Reply {
    let mut form = match read_form(multipart).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("{e}");
            return bad_request(&e);
        }
    };
    let Some(file) = form.file else {
        return bad_request("No file uploaded");
    };

    let is_pdf_by_mime = file.content_type.as_deref() == Some(PDF_CONTENT_TYPE);
    let is_pdf_by_ext = file.name.to_lowercase().ends_with(".pdf");
    if !is_pdf_by_mime && !is_pdf_by_ext {
        return bad_request("Only PDF files are allowed");
    }

    let custom_name = form.fields.remove(CUSTOM_NAME_FIELD);
    let folder_id = non_empty(form.fields.remove(FOLDER_ID_FIELD));
    match state
        .files
        .upload(
            file.data,
            &file.name,
            custom_name.as_deref(),
            folder_id.as_deref(),
        )
        .await
    {
        Ok(file) => ok(UploadResponse {
            message: "Uploaded successfully".to_owned(),
            file,
        }),
        Err(_) => internal_server_error("Upload failed"),
    }
}

/// Renames a file and/or moves it into another folder
#[utoipa::path(
    put,
    path = "/api/files/actions",
    tag = "files",
    request_body = FileActionRequest,
    responses(
        (status = 200, description = "File updated", body = MessageResponse),
        (status = 400, description = "Missing file id or change", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
)]
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FileActionRequest>, JsonRejection>,
) -> Reply {
    let request = match parse(payload) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    let file_id = non_empty(request.file_id);
    let new_name = non_empty(request.new_name);
    let (Some(file_id), true) = (file_id, new_name.is_some() || request.new_folder_id.is_some())
    else {
        return bad_request("File ID and new name or folder are required");
    };

    // The move goes first: a rename re-points the association to the new id.
    if let Some(folder) = request.new_folder_id {
        let folder = non_empty(folder);
        if !state.files.move_to(&file_id, folder.as_deref()).await {
            return internal_server_error("Failed to move file");
        }
    }
    if let Some(name) = &new_name {
        if !state.files.rename(&file_id, name).await {
            return internal_server_error("Failed to rename file");
        }
    }

    let message = if new_name.is_some() {
        "File renamed successfully"
    } else {
        "File moved successfully"
    };
    ok(MessageResponse {
        message: message.to_owned(),
    })
}

/// Deletes a file
#[utoipa::path(
    delete,
    path = "/api/files/actions",
    tag = "files",
    request_body = FileActionRequest,
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 400, description = "Missing file id", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FileActionRequest>, JsonRejection>,
) -> Reply {
    let request = match parse(payload) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    let Some(file_id) = non_empty(request.file_id) else {
        return bad_request("File ID is required");
    };
    if state.files.delete(&file_id).await {
        ok(MessageResponse {
            message: "File deleted successfully".to_owned(),
        })
    } else {
        internal_server_error("Failed to delete file")
    }
}

/// Lists folders of a parent folder or all folders
#[utoipa::path(
    get,
    path = "/api/folders",
    tag = "folders",
    params(FoldersQuery),
    responses(
        (status = 200, description = "Folders", body = FoldersResponse),
    ),
)]
pub async fn get_folders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FoldersQuery>,
) -> impl IntoResponse {
    let folders = match non_empty(query.parent_id).as_deref() {
        Some(ALL) => state.folders.list_all().await,
        parent => state.folders.list(parent).await,
    };
    ok(FoldersResponse { folders })
}

/// Creates a folder
#[utoipa::path(
    post,
    path = "/api/folders",
    tag = "folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 200, description = "Folder created", body = FolderResponse),
        (status = 400, description = "Missing name", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
)]
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Reply {
    let request = match parse(payload) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    let Some(name) = non_empty(request.name) else {
        return bad_request("Folder name is required");
    };
    let parent_id = non_empty(request.parent_id);
    match state.folders.create(&name, parent_id.as_deref()).await {
        Ok(folder) => ok(FolderResponse { folder }),
        Err(_) => internal_server_error("Failed to create folder"),
    }
}

/// Renames a folder and/or moves it under another parent
#[utoipa::path(
    put,
    path = "/api/folders",
    tag = "folders",
    request_body = UpdateFolderRequest,
    responses(
        (status = 200, description = "Folder updated", body = SuccessResponse),
        (status = 400, description = "Missing id, blank name or cyclic move", body = ErrorResponse),
        (status = 500, description = "Storage failure or unknown folder", body = ErrorResponse)
    ),
)]
pub async fn update_folder(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateFolderRequest>, JsonRejection>,
) -> Reply {
    let request = match parse(payload) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    let Some(folder_id) = non_empty(request.folder_id) else {
        return bad_request("Folder ID is required");
    };

    if let Some(name) = request.new_name {
        if name.trim().is_empty() {
            return bad_request("Folder name is required");
        }
        if !state.folders.rename(&folder_id, &name).await {
            return internal_server_error("Failed to rename folder");
        }
    }

    if let Some(parent) = request.new_parent_id {
        let parent = non_empty(parent);
        match state.folders.move_to(&folder_id, parent.as_deref()).await {
            MoveOutcome::Moved => {}
            MoveOutcome::Cycle => {
                return bad_request("Folder cannot be moved into itself or its subfolders")
            }
            MoveOutcome::Failed => return internal_server_error("Failed to move folder"),
        }
    }

    ok(SuccessResponse { success: true })
}

/// Deletes a folder and its direct subfolders
#[utoipa::path(
    delete,
    path = "/api/folders",
    tag = "folders",
    request_body = DeleteFolderRequest,
    responses(
        (status = 200, description = "Folder deleted", body = SuccessResponse),
        (status = 400, description = "Missing id", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
)]
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteFolderRequest>, JsonRejection>,
) -> Reply {
    let request = match parse(payload) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    let Some(folder_id) = non_empty(request.folder_id) else {
        return bad_request("Folder ID is required");
    };
    if state.folders.delete(&folder_id).await {
        ok(SuccessResponse { success: true })
    } else {
        internal_server_error("Failed to delete folder")
    }
}

/// Path from the root to a folder
#[utoipa::path(
    get,
    path = "/api/folders/breadcrumbs",
    tag = "folders",
    params(FolderQuery),
    responses(
        (status = 200, description = "Root first path", body = BreadcrumbsResponse),
    ),
)]
pub async fn get_breadcrumbs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FolderQuery>,
) -> impl IntoResponse {
    let folder = non_empty(query.folder_id);
    let path = state.folders.path(folder.as_deref()).await;
    ok(BreadcrumbsResponse { path })
}

/// Number and total size of files directly inside a folder
#[utoipa::path(
    get,
    path = "/api/folders/stats",
    tag = "folders",
    params(FolderQuery),
    responses(
        (status = 200, description = "Folder statistics", body = FolderStats),
    ),
)]
pub async fn get_folder_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FolderQuery>,
) -> impl IntoResponse {
    let folder = non_empty(query.folder_id);
    ok(state.files.stats(folder.as_deref()).await)
}

/// Serves a stored file inline
#[utoipa::path(
    get,
    path = "/uploads/{path}",
    tag = "files",
    responses(
        (status = 200, response = FileReply),
        (status = 307, description = "Redirect to the object storage location"),
        (status = 404, description = "File not found", body = String)
    ),
    params(
        ("path" = String, Path, description = "Stored file name")
    ),
)]
pub async fn serve_upload(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    if let Some(url) = state.files.public_url(&path) {
        return match state.files.exists(&path).await {
            Ok(true) => Redirect::temporary(&url).into_response(),
            Ok(false) => (StatusCode::NOT_FOUND, "File not found").into_response(),
            Err(e) => {
                tracing::error!("file '{path}' not checked. Error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        };
    }

    match state.files.read(&path).await {
        Ok(Some(data)) => {
            tracing::info!("File size {}", data.len());
            FileReply::new(data, path).into_response()
        }
        Ok(None) | Err(StoreError::InvalidKey(_)) => {
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
        Err(e) => {
            tracing::error!("file '{path}' not read. Error: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Drops folder associations of files that no longer exist
#[utoipa::path(
    post,
    path = "/api/maintenance/cleanup",
    tag = "maintenance",
    responses(
        (status = 200, description = "Stale associations removed", body = CleanupResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
)]
pub async fn cleanup_metadata(State(state): State<Arc<AppState>>) -> Reply {
    match state.files.cleanup().await {
        Ok(removed) => ok(CleanupResponse { removed }),
        Err(e) => {
            tracing::error!("metadata cleanup failed. Error: {e}");
            internal_server_error("Failed to clean up metadata")
        }
    }
}

/// Reports the active storage backend
#[utoipa::path(
    get,
    path = "/api/storage",
    tag = "maintenance",
    responses(
        (status = 200, description = "Backend in use and a few files", body = StorageStatus),
    ),
)]
pub async fn get_storage_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let files = state.files.list(Scope::All).await;
    ok(StorageStatus {
        backend: state.files.backend().to_string(),
        file_count: files.len(),
        sample_files: files.into_iter().take(STATUS_SAMPLE_SIZE).collect(),
    })
}

/// Draws random questions from the built-in pool
#[utoipa::path(
    get,
    path = "/api/quiz/questions",
    tag = "quiz",
    params(QuestionsQuery),
    responses(
        (status = 200, description = "Shuffled questions", body = QuestionsResponse),
    ),
)]
pub async fn get_questions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionsQuery>,
) -> impl IntoResponse {
    let count = query.count.unwrap_or(DEFAULT_QUESTION_COUNT);
    ok(QuestionsResponse {
        questions: state.quiz.select(count),
    })
}

/// Scores answers against the built-in pool
#[utoipa::path(
    post,
    path = "/api/quiz/score",
    tag = "quiz",
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Quiz result", body = TestResult),
        (status = 400, description = "Unknown question id", body = ErrorResponse)
    ),
)]
pub async fn score_quiz(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Reply {
    let request = match parse(payload) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    match state.quiz.resolve(&request.question_ids) {
        Ok(questions) => ok(quiz::score(
            &questions,
            &request.answers,
            request.time_taken,
        )),
        Err(id) => bad_request(&format!("Unknown question id {id}")),
    }
}

/// Acknowledges a finished quiz result
#[utoipa::path(
    post,
    path = "/api/test-results",
    tag = "quiz",
    request_body = TestResult,
    responses(
        (status = 200, description = "Result stamped with the server time", body = SaveResultResponse),
        (status = 400, description = "Malformed result", body = ErrorResponse)
    ),
)]
pub async fn save_test_result(payload: Result<Json<TestResult>, JsonRejection>) -> Reply {
    let result = match parse(payload) {
        Ok(r) => r,
        Err(reply) => return reply,
    };
    tracing::info!(
        "test result: {}/{} correct, score {}",
        result.correct_answers,
        result.total_questions,
        result.score
    );
    ok(SaveResultResponse {
        success: true,
        message: "Test results saved successfully".to_owned(),
        result: SavedTestResult {
            result,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        },
    })
}

/// Accepts a Word document and returns placeholder quiz questions for it
#[utoipa::path(
    post,
    path = "/api/upload-docx",
    tag = "quiz",
    request_body(content_type = "multipart/form-data", description = "`file` with a .docx document"),
    responses(
        (status = 200, description = "Document stored", body = DocxQuizResponse),
        (status = 400, description = "No file or not a Word document", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
)]
pub async fn upload_docx(State(state): State<Arc<AppState>>, multipart: Multipart) -> Reply {
    let form = match read_form(multipart).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("{e}");
            return bad_request(&e);
        }
    };
    let Some(file) = form.file else {
        return bad_request("No file uploaded");
    };
    if !file.name.ends_with(docx::DOCX_EXTENSION) {
        return bad_request("Please upload a .docx file");
    }
    if !docx::is_word_document(&file.data) {
        return bad_request("The file is not a valid Word document");
    }

    match state
        .files
        .store_document(file.data, &file.name, docx::DOCX_CONTENT_TYPE)
        .await
    {
        Ok(filename) => ok(DocxQuizResponse {
            success: true,
            filename,
            questions: docx::placeholder_questions(&file.name),
            message: "File uploaded successfully. Questions extracted from document.".to_owned(),
        }),
        Err(e) => {
            tracing::error!("document '{}' not stored. Error: {e}", file.name);
            internal_server_error("Failed to process file")
        }
    }
}

struct FormFile {
    name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    file: Option<FormFile>,
    fields: HashMap<String, String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field_name == FILE_FIELD {
            let name = field.file_name().unwrap_or_default().to_owned();
            let content_type = field.content_type().map(str::to_owned);
            let (data, read_bytes) = read_from_stream(field).await.map_err(|e| e.to_string())?;
            tracing::info!("file: {name} read: {read_bytes}");
            form.file = Some(FormFile {
                name,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(|e| e.to_string())?;
            form.fields.insert(field_name, value);
        }
    }
    Ok(form)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Reply> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(e) => {
            tracing::warn!("rejected body: {e}");
            Err(bad_request(&e.body_text()))
        }
    }
}

fn ok<S: Serialize>(body: S) -> Reply {
    (StatusCode::OK, Json(body).into_response())
}

fn bad_request(message: &str) -> Reply {
    error_reply(StatusCode::BAD_REQUEST, message)
}

fn internal_server_error(message: &str) -> Reply {
    error_reply(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn error_reply(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(ErrorResponse {
            error: message.to_owned(),
        })
        .into_response(),
    )
}

async fn read_from_stream<S, E>(stream: S) -> io::Result<(Vec<u8>, usize)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Sync + std::error::Error + Send + 'static,
{
    // Convert the stream into an `AsyncRead`.
    let body_with_io_error = stream.map_err(io::Error::other);
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);
    let mut buffer = Vec::new();

    let copied_bytes = tokio::io::copy(&mut body_reader, &mut buffer).await?;
    let copied_bytes = usize::try_from(copied_bytes).unwrap_or(usize::MAX);
    Ok((buffer, copied_bytes))
}
