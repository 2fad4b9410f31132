use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    classify::ServerErrorsFailureClass, limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod backend;
pub mod config;
pub mod docx;
pub mod domain;
pub mod error;
pub mod file_reply;
pub mod files;
pub mod folders;
mod handlers;
pub mod metadata;
pub mod quiz;
pub mod sqlite;

#[cfg(test)] // <-- not needed in integration tests
extern crate rstest;

use crate::backend::Backends;
use crate::config::{Config, MetadataKind};
use crate::domain::MetadataStore;
use crate::error::Result;
use crate::files::FileStorage;
use crate::folders::FolderService;
use crate::metadata::DocumentMetadata;
use crate::quiz::QuestionBank;
use crate::sqlite::SqliteMetadata;

const DB_FILE: &str = "studydesk.db";
const DEFAULT_LOG_FILTER: &str = "studydesk=debug,server=debug,tower_http=debug";

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_files,
        handlers::upload_file,
        handlers::update_file,
        handlers::delete_file,
        handlers::serve_upload,
        handlers::get_folders,
        handlers::create_folder,
        handlers::update_folder,
        handlers::delete_folder,
        handlers::get_breadcrumbs,
        handlers::get_folder_stats,
        handlers::cleanup_metadata,
        handlers::get_storage_status,
        handlers::get_questions,
        handlers::score_quiz,
        handlers::save_test_result,
        handlers::upload_docx,
    ),
    components(
        schemas(
            kernel::FileItem,
            kernel::FolderItem,
            kernel::FolderStats,
            kernel::BreadcrumbItem,
            kernel::Question,
            kernel::TestResult,
            kernel::ErrorResponse,
        ),
        responses(file_reply::FileReply),
    ),
    tags(
        (name = "files", description = "Uploaded PDF files"),
        (name = "folders", description = "Virtual folder tree"),
        (name = "maintenance", description = "Storage housekeeping"),
        (name = "quiz", description = "Built-in acid-base quiz"),
    )
)]
struct ApiDoc;

/// Services shared by every request.
pub struct AppState {
    pub folders: FolderService,
    pub files: FileStorage,
    pub quiz: QuestionBank,
}

impl AppState {
    /// Builds backends and metadata once from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backends = Backends::from_config(config)?;
        let metadata: Arc<dyn MetadataStore> = match config.metadata {
            MetadataKind::Json => Arc::new(DocumentMetadata::new(backends.metadata)),
            MetadataKind::Sqlite => Arc::new(SqliteMetadata::open(config.data_dir.join(DB_FILE))?),
        };
        tracing::debug!(
            "storage backend: {}, metadata: {:?}",
            backends.files.kind(),
            config.metadata
        );
        Ok(Self {
            folders: FolderService::new(metadata.clone()),
            files: FileStorage::new(backends.files, metadata),
            quiz: QuestionBank::acid_base()?,
        })
    }
}

pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    let socket = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(socket).await?;
    tracing::debug!("listening on {}", listener.local_addr()?);

    let app = create_routes(state, config.body_limit);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn create_routes(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/files", get(handlers::get_files))
        .route("/api/upload", post(handlers::upload_file))
        .route(
            "/api/files/actions",
            put(handlers::update_file).delete(handlers::delete_file),
        )
        .route(
            "/api/folders",
            get(handlers::get_folders)
                .post(handlers::create_folder)
                .put(handlers::update_folder)
                .delete(handlers::delete_folder),
        )
        .route("/api/folders/breadcrumbs", get(handlers::get_breadcrumbs))
        .route("/api/folders/stats", get(handlers::get_folder_stats))
        .route("/api/maintenance/cleanup", post(handlers::cleanup_metadata))
        .route("/api/storage", get(handlers::get_storage_status))
        .route("/api/quiz/questions", get(handlers::get_questions))
        .route("/api/quiz/score", post(handlers::score_quiz))
        .route("/api/test-results", post(handlers::save_test_result))
        .route("/api/upload-docx", post(handlers::upload_docx))
        .route("/uploads/*path", get(handlers::serve_upload))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().on_failure(
                    |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        tracing::error!("Server error: {error}");
                    },
                ))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit))
                .into_inner(),
        )
        .with_state(Arc::new(state))
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}
