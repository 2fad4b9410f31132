use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use utoipa::{
    openapi::{self, content, schema::Type, ObjectBuilder, RefOr, ResponseBuilder},
    ToResponse,
};

const LONG_CACHE: &str = "public, max-age=31536000";
const SAME_ORIGIN: &str = "SAMEORIGIN";

/// Stored file returned inline so browsers can display it.
pub struct FileReply {
    data: Vec<u8>,
    path: String,
}

impl FileReply {
    #[must_use]
    pub fn new(data: Vec<u8>, path: String) -> Self {
        Self { data, path }
    }

    fn name_from_path(&self) -> &str {
        let path = &self.path;
        if let Some(ix) = path.rfind(['\\', '/']) {
            &path[ix + 1..]
        } else {
            path
        }
    }

    fn content_type(&self) -> String {
        mime_guess::from_path(self.name_from_path())
            .first_or_octet_stream()
            .essence_str()
            .to_owned()
    }
}

impl IntoResponse for FileReply {
    fn into_response(self) -> Response {
        let file_name = self.name_from_path().to_owned();
        let content_type = self.content_type();
        let etag = format!(r#""{}""#, blake3::hash(&self.data).to_hex());
        let len = self.data.len().to_string();

        let mut res = Body::from(self.data).into_response();
        let headers = res.headers_mut();
        if let Ok(val) = HeaderValue::from_str(&content_type) {
            headers.insert(header::CONTENT_TYPE, val);
        }
        let inline = format!(r#"inline; filename="{file_name}""#);
        if let Ok(val) = HeaderValue::from_str(&inline) {
            headers.insert(header::CONTENT_DISPOSITION, val);
        }
        if let Ok(val) = HeaderValue::from_str(&len) {
            headers.insert(header::CONTENT_LENGTH, val);
        }
        if let Ok(val) = HeaderValue::from_str(&etag) {
            headers.insert(header::ETAG, val);
        }
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(LONG_CACHE));
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static(SAME_ORIGIN));

        res
    }
}

impl ToResponse<'static> for FileReply {
    fn response() -> (&'static str, RefOr<openapi::Response>) {
        let object = ObjectBuilder::new()
            .schema_type(Type::String)
            .format(Some(openapi::SchemaFormat::KnownFormat(
                openapi::KnownFormat::Binary,
            )))
            .build();
        let content = content::Content::new(Some(object));
        (
            "FileReply",
            ResponseBuilder::new()
                .description("Stored file content")
                .content("application/pdf", content)
                .build()
                .into(),
        )
    }
}
