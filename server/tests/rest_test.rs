use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use futures::channel::oneshot;
use futures::channel::oneshot::Sender;
use futures::future::join_all;
use kernel::{
    BreadcrumbsResponse, CleanupResponse, DocxQuizResponse, ErrorResponse, FileItem,
    FilesResponse, FolderItem, FolderResponse, FolderStats, FoldersResponse, QuestionsResponse,
    SaveResultResponse, StorageStatus, TestResult, UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::json;
use serial_test::serial;
use server::config::Config;
use server::AppState;
use tempfile::TempDir;
use test_context::{test_context, AsyncTestContext};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use zip::write::SimpleFileOptions;

const PDF_CONTENT: &[u8] = b"%PDF-1.4 study notes";
const BODY_LIMIT: usize = 16 * 1024 * 1024;

struct StudyDeskContext {
    root: TempDir,
    base: String,
    client: Client,
    shutdown: Sender<()>,
    join: JoinHandle<()>,
}

struct SqliteStudyDeskContext(StudyDeskContext);

impl StudyDeskContext {
    async fn start(metadata: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let data_dir = root.path().to_string_lossy().into_owned();
        let config = Config::from_lookup(|name| match name {
            "STUDYDESK_DATA_DIR" => Some(data_dir.clone()),
            "STUDYDESK_METADATA" => Some(metadata.to_owned()),
            _ => None,
        })
        .unwrap();
        let state = AppState::from_config(&config).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        println!("port `{port}` is used");

        let (send, recv) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let app = server::create_routes(state, BODY_LIMIT);
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    recv.await.unwrap_or_default();
                })
                .await
                .unwrap();
        });

        StudyDeskContext {
            root,
            base: format!("http://127.0.0.1:{port}"),
            client: Client::new(),
            shutdown: send,
            join: task,
        }
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap_or_default();
        self.join.await.unwrap_or_default();
    }

    fn uri(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn data_dir(&self) -> &Path {
        self.root.path()
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> FolderItem {
        let response = self
            .client
            .post(self.uri("/api/folders"))
            .json(&json!({ "name": name, "parentId": parent_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: FolderResponse = response.json().await.unwrap();
        body.folder
    }

    async fn upload(&self, file_name: &str, folder_id: Option<&str>) -> FileItem {
        let mut form = Form::new().part("file", pdf_part(file_name));
        if let Some(folder) = folder_id {
            form = form.text("folderId", folder.to_owned());
        }
        let response = self
            .client
            .post(self.uri("/api/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: UploadResponse = response.json().await.unwrap();
        body.file
    }

    async fn files(&self, folder_id: &str) -> Vec<FileItem> {
        let body: FilesResponse = self
            .client
            .get(self.uri("/api/files"))
            .query(&[("folderId", folder_id)])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body.files
    }

    async fn folders(&self, parent_id: &str) -> Vec<FolderItem> {
        let body: FoldersResponse = self
            .client
            .get(self.uri("/api/folders"))
            .query(&[("parentId", parent_id)])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body.folders
    }
}

impl AsyncTestContext for StudyDeskContext {
    async fn setup() -> StudyDeskContext {
        StudyDeskContext::start("json").await
    }

    async fn teardown(self) {
        self.stop().await;
    }
}

impl AsyncTestContext for SqliteStudyDeskContext {
    async fn setup() -> SqliteStudyDeskContext {
        SqliteStudyDeskContext(StudyDeskContext::start("sqlite").await)
    }

    async fn teardown(self) {
        self.0.stop().await;
    }
}

fn pdf_part(file_name: &str) -> Part {
    Part::bytes(PDF_CONTENT.to_vec())
        .file_name(file_name.to_owned())
        .mime_str("application/pdf")
        .unwrap()
}

fn docx_bytes() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:document/>").unwrap();
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn upload_into_folder_and_list(ctx: &mut StudyDeskContext) {
    // Arrange
    let chemistry = ctx.create_folder("Chemistry", None).await;

    // Act
    let file = ctx.upload("notes.pdf", Some(&chemistry.id)).await;

    // Assert
    assert_eq!(file.folder_id.as_deref(), Some(chemistry.id.as_str()));
    assert_eq!(file.original_name, "notes.pdf");
    assert!(file.name.ends_with("_notes.pdf"));
    assert_eq!(file.size, PDF_CONTENT.len() as u64);

    let in_folder = ctx.files(&chemistry.id).await;
    assert_eq!(in_folder.len(), 1);
    assert_eq!(in_folder[0].id, file.id);
    assert!(ctx.files("").await.is_empty());
    assert_eq!(ctx.files("all").await.len(), 1);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn upload_with_custom_name(ctx: &mut StudyDeskContext) {
    // Arrange
    let form = Form::new()
        .part("file", pdf_part("scan 01.pdf"))
        .text("customName", "Lecture 1");

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: UploadResponse = response.json().await.unwrap();
    assert!(body.file.name.ends_with("_Lecture_1.pdf"));
    assert_eq!(body.file.folder_id, None);
    assert_eq!(ctx.files("").await.len(), 1);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn upload_without_file(ctx: &mut StudyDeskContext) {
    // Arrange
    let form = Form::new().text("customName", "x");

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "No file uploaded");
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn upload_rejects_non_pdf(ctx: &mut StudyDeskContext) {
    // Arrange
    let part = Part::bytes(b"plain".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = Form::new().part("file", part);

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "Only PDF files are allowed");
    assert!(ctx.files("all").await.is_empty());
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn upload_accepts_pdf_extension_with_generic_type(ctx: &mut StudyDeskContext) {
    // Arrange
    let part = Part::bytes(PDF_CONTENT.to_vec())
        .file_name("Notes.PDF")
        .mime_str("application/octet-stream")
        .unwrap();
    let form = Form::new().part("file", part);

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn move_file_between_folders(ctx: &mut StudyDeskContext) {
    // Arrange
    let chemistry = ctx.create_folder("Chemistry", None).await;
    let file = ctx.upload("notes.pdf", None).await;

    // Act
    let response = ctx
        .client
        .put(ctx.uri("/api/files/actions"))
        .json(&json!({ "fileId": file.id, "newFolderId": chemistry.id }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert!(ctx.files("").await.is_empty());
    assert_eq!(ctx.files(&chemistry.id).await.len(), 1);

    // Back to the root with an explicit null
    let response = ctx
        .client
        .put(ctx.uri("/api/files/actions"))
        .json(&json!({ "fileId": file.id, "newFolderId": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.files("").await.len(), 1);
    assert!(ctx.files(&chemistry.id).await.is_empty());
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn rename_keeps_folder(ctx: &mut StudyDeskContext) {
    // Arrange
    let chemistry = ctx.create_folder("Chemistry", None).await;
    let file = ctx.upload("notes.pdf", Some(&chemistry.id)).await;

    // Act
    let response = ctx
        .client
        .put(ctx.uri("/api/files/actions"))
        .json(&json!({ "fileId": file.id, "newName": "acids" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let files = ctx.files(&chemistry.id).await;
    assert_eq!(files.len(), 1);
    assert_ne!(files[0].id, file.id);
    assert!(files[0].name.ends_with("_acids.pdf"));
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn file_action_without_id(ctx: &mut StudyDeskContext) {
    // Act
    let response = ctx
        .client
        .put(ctx.uri("/api/files/actions"))
        .json(&json!({ "newName": "x" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn file_action_with_malformed_body(ctx: &mut StudyDeskContext) {
    // Act
    let response = ctx
        .client
        .put(ctx.uri("/api/files/actions"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(!body.error.is_empty());
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn delete_file_then_cleanup(ctx: &mut StudyDeskContext) {
    // Arrange
    let chemistry = ctx.create_folder("Chemistry", None).await;
    let file = ctx.upload("notes.pdf", Some(&chemistry.id)).await;

    // Act
    let response = ctx
        .client
        .delete(ctx.uri("/api/files/actions"))
        .json(&json!({ "fileId": file.id }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert!(ctx.files("all").await.is_empty());

    let cleanup: CleanupResponse = ctx
        .client
        .post(ctx.uri("/api/maintenance/cleanup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleanup.removed, 1);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn delete_missing_file(ctx: &mut StudyDeskContext) {
    // Act
    let response = ctx
        .client
        .delete(ctx.uri("/api/files/actions"))
        .json(&json!({ "fileId": "2024-01-01_00-00-00-000_missing.pdf" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn serve_uploaded_file(ctx: &mut StudyDeskContext) {
    // Arrange
    let file = ctx.upload("notes.pdf", None).await;

    // Act
    let response = ctx.client.get(ctx.uri(&file.url)).send().await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "application/pdf");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(headers["content-disposition"]
        .to_str()
        .unwrap()
        .starts_with("inline"));
    let body = response.bytes().await.unwrap();
    assert_eq!(body.as_ref(), PDF_CONTENT);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn serve_missing_file(ctx: &mut StudyDeskContext) {
    // Act
    let response = ctx
        .client
        .get(ctx.uri("/uploads/missing.pdf"))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn files_stored_under_data_dir(ctx: &mut StudyDeskContext) {
    // Act
    let file = ctx.upload("notes.pdf", None).await;

    // Assert
    let stored = ctx.data_dir().join("uploads").join(&file.id);
    assert!(stored.exists());
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn concurrent_uploads_keep_every_association(ctx: &mut StudyDeskContext) {
    // Arrange
    let chemistry = ctx.create_folder("Chemistry", None).await;

    // Act
    let shared: &StudyDeskContext = ctx;
    let uploads = (0..10).map(|n| {
        let name = format!("notes{n}.pdf");
        let folder = chemistry.id.clone();
        async move { shared.upload(&name, Some(&folder)).await }
    });
    join_all(uploads).await;

    // Assert
    assert_eq!(ctx.files(&chemistry.id).await.len(), 10);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn create_folder_requires_name(ctx: &mut StudyDeskContext) {
    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/folders"))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "Folder name is required");
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn list_folders_by_parent(ctx: &mut StudyDeskContext) {
    // Arrange
    let a = ctx.create_folder("A", None).await;
    let b = ctx.create_folder("B", Some(&a.id)).await;
    ctx.create_folder("C", None).await;

    // Act
    let root = ctx.folders("").await;
    let children = ctx.folders(&a.id).await;
    let all = ctx.folders("all").await;

    // Assert
    assert_eq!(root.len(), 2);
    assert_eq!(children, vec![b]);
    assert_eq!(all.len(), 3);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn rename_and_move_folder(ctx: &mut StudyDeskContext) {
    // Arrange
    let a = ctx.create_folder("A", None).await;
    let b = ctx.create_folder("B", None).await;

    // Act
    let response = ctx
        .client
        .put(ctx.uri("/api/folders"))
        .json(&json!({ "folderId": b.id, "newName": "Bases", "newParentId": a.id }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let children = ctx.folders(&a.id).await;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "Bases");
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn move_folder_into_descendant(ctx: &mut StudyDeskContext) {
    // Arrange
    let a = ctx.create_folder("A", None).await;
    let b = ctx.create_folder("B", Some(&a.id)).await;

    // Act
    let response = ctx
        .client
        .put(ctx.uri("/api/folders"))
        .json(&json!({ "folderId": a.id, "newParentId": b.id }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.folders("").await, vec![a]);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn delete_folder_removes_one_level(ctx: &mut StudyDeskContext) {
    // Arrange
    let a = ctx.create_folder("A", None).await;
    let b = ctx.create_folder("B", Some(&a.id)).await;
    let c = ctx.create_folder("C", Some(&b.id)).await;

    // Act
    let response = ctx
        .client
        .delete(ctx.uri("/api/folders"))
        .json(&json!({ "folderId": a.id }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.folders("all").await, vec![c]);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn deleted_folder_files_stay_under_prior_folder(ctx: &mut StudyDeskContext) {
    // Arrange
    let a = ctx.create_folder("A", None).await;
    let b = ctx.create_folder("B", Some(&a.id)).await;
    let in_a = ctx.upload("a.pdf", Some(&a.id)).await;
    let in_b = ctx.upload("b.pdf", Some(&b.id)).await;

    // Act
    let response = ctx
        .client
        .delete(ctx.uri("/api/folders"))
        .json(&json!({ "folderId": a.id }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert!(ctx.folders("all").await.is_empty());
    let under_a = ctx.files(&a.id).await;
    assert_eq!(under_a.len(), 1);
    assert_eq!(under_a[0].id, in_a.id);
    let under_b = ctx.files(&b.id).await;
    assert_eq!(under_b.len(), 1);
    assert_eq!(under_b[0].id, in_b.id);
    assert!(ctx.files("").await.is_empty());
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn breadcrumbs_and_stats(ctx: &mut StudyDeskContext) {
    // Arrange
    let a = ctx.create_folder("A", None).await;
    let b = ctx.create_folder("B", Some(&a.id)).await;
    ctx.upload("one.pdf", Some(&b.id)).await;
    ctx.upload("two.pdf", Some(&b.id)).await;

    // Act
    let crumbs: BreadcrumbsResponse = ctx
        .client
        .get(ctx.uri("/api/folders/breadcrumbs"))
        .query(&[("folderId", b.id.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let stats: FolderStats = ctx
        .client
        .get(ctx.uri("/api/folders/stats"))
        .query(&[("folderId", b.id.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    let names: Vec<&str> = crumbs.path.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Home", "A", "B"]);
    assert_eq!(crumbs.path[0].id, None);
    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.total_size, 2 * PDF_CONTENT.len() as u64);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn storage_status(ctx: &mut StudyDeskContext) {
    // Arrange
    ctx.upload("notes.pdf", None).await;

    // Act
    let status: StorageStatus = ctx
        .client
        .get(ctx.uri("/api/storage"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(status.backend, "local");
    assert_eq!(status.file_count, 1);
    assert_eq!(status.sample_files.len(), 1);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn quiz_round(ctx: &mut StudyDeskContext) {
    // Arrange
    let body: QuestionsResponse = ctx
        .client
        .get(ctx.uri("/api/quiz/questions"))
        .query(&[("count", "4")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.questions.len(), 4);
    let ids: Vec<u32> = body.questions.iter().map(|q| q.id).collect();
    let first = &body.questions[0];
    let second = &body.questions[1];
    let wrong = (second.correct_answer + 1) % second.options.len();
    let answers = BTreeMap::from([(first.id, first.correct_answer), (second.id, wrong)]);

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/quiz/score"))
        .json(&json!({
            "questionIds": ids,
            "answers": answers,
            "timeTaken": 42
        }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let result: TestResult = response.json().await.unwrap();
    assert_eq!(result.total_questions, 4);
    assert_eq!(result.correct_answers, 1);
    assert_eq!(result.score, 25);
    assert_eq!(result.time_taken, 42);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn default_question_count(ctx: &mut StudyDeskContext) {
    // Act
    let body: QuestionsResponse = ctx
        .client
        .get(ctx.uri("/api/quiz/questions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(body.questions.len(), 15);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn score_unknown_question(ctx: &mut StudyDeskContext) {
    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/quiz/score"))
        .json(&json!({ "questionIds": [999_999], "answers": {} }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn save_test_result(ctx: &mut StudyDeskContext) {
    // Arrange
    let result = json!({
        "totalQuestions": 2,
        "correctAnswers": 1,
        "score": 50,
        "answers": { "1": 0, "2": 3 },
        "timeTaken": 30
    });

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/test-results"))
        .json(&result)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: SaveResultResponse = response.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.result.result.score, 50);
    assert!(!body.result.timestamp.is_empty());
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn upload_word_document(ctx: &mut StudyDeskContext) {
    // Arrange
    let part = Part::bytes(docx_bytes()).file_name("lesson.docx");
    let form = Form::new().part("file", part);

    // Act
    let response = ctx
        .client
        .post(ctx.uri("/api/upload-docx"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: DocxQuizResponse = response.json().await.unwrap();
    assert!(body.success);
    assert!(body.filename.ends_with("_lesson.docx"));
    assert_eq!(body.questions.len(), 2);
    // Word documents never show up among the PDFs
    assert!(ctx.files("all").await.is_empty());
}

#[test_context(StudyDeskContext)]
#[tokio::test]
#[serial]
async fn upload_word_document_rejects_other_files(ctx: &mut StudyDeskContext) {
    // Arrange
    let wrong_extension = Form::new().part("file", Part::bytes(docx_bytes()).file_name("a.zip"));
    let not_a_zip = Form::new().part("file", Part::bytes(b"text".to_vec()).file_name("a.docx"));

    // Act
    let extension = ctx
        .client
        .post(ctx.uri("/api/upload-docx"))
        .multipart(wrong_extension)
        .send()
        .await
        .unwrap();
    let content = ctx
        .client
        .post(ctx.uri("/api/upload-docx"))
        .multipart(not_a_zip)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(extension.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content.status(), StatusCode::BAD_REQUEST);
}

#[test_context(SqliteStudyDeskContext)]
#[tokio::test]
#[serial]
async fn sqlite_metadata_round(ctx: &mut SqliteStudyDeskContext) {
    // Arrange
    let ctx = &ctx.0;
    let chemistry = ctx.create_folder("Chemistry", None).await;
    let file = ctx.upload("notes.pdf", None).await;

    // Act
    let response = ctx
        .client
        .put(ctx.uri("/api/files/actions"))
        .json(&json!({ "fileId": file.id, "newFolderId": chemistry.id, "newName": "moved" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let files = ctx.files(&chemistry.id).await;
    assert_eq!(files.len(), 1);
    assert!(files[0].name.ends_with("_moved.pdf"));
    assert!(ctx.data_dir().join("studydesk.db").exists());
}
