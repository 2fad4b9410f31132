use std::path::Path;

use comfy_table::{presets::UTF8_HORIZONTAL_ONLY, Attribute, Cell, ContentArrangement, Table};
use kernel::{
    CleanupResponse, ErrorResponse, FileItem, FilesResponse, FolderItem, FolderResponse,
    FoldersResponse, MessageResponse, StorageStatus, UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use resource::Resource;
use serde_json::json;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

pub mod resource;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const TABLE_WIDTH: u16 = 120;

pub struct UploadParams {
    pub uri: String,
    pub file: String,
    pub folder: Option<String>,
    pub name: Option<String>,
}

pub async fn upload_file(params: UploadParams) {
    let Some(resource) = endpoint(&params.uri, "api/upload") else {
        return;
    };
    let Some(file_name) = Path::new(&params.file)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
    else {
        println!("invalid file path {}", params.file);
        return;
    };

    let f = match File::open(&params.file).await {
        Ok(f) => f,
        Err(e) => {
            println!("no such file {}: {e}", params.file);
            return;
        }
    };
    let len = match f.metadata().await {
        Ok(m) => m.len(),
        Err(e) => {
            println!("file {} metadata not read: {e}", params.file);
            return;
        }
    };
    let stream = reqwest::Body::wrap_stream(ReaderStream::new(f));
    let part = match Part::stream_with_length(stream, len)
        .file_name(file_name)
        .mime_str(PDF_CONTENT_TYPE)
    {
        Ok(p) => p,
        Err(e) => {
            println!("error: {e}");
            return;
        }
    };

    let mut form = Form::new().part("file", part);
    if let Some(name) = params.name {
        form = form.text("customName", name);
    }
    if let Some(folder) = params.folder {
        form = form.text("folderId", folder);
    }

    let client = Client::new();
    let result = client.post(resource.to_string()).multipart(form).send().await;
    if let Some(uploaded) = decode::<UploadResponse>(result).await {
        println!(
            "file {} uploaded as {}. Size: {}",
            params.file, uploaded.file.id, uploaded.file.size
        );
    }
}

/// Prints files of a folder; `None` is the root, `all` every file.
pub async fn list_files(uri: &str, folder: Option<&str>) {
    let Some(mut resource) = endpoint(uri, "api/files") else {
        return;
    };
    resource.append_query("folderId", folder.unwrap_or_default());

    let client = Client::new();
    let result = client.get(resource.to_string()).send().await;
    if let Some(r) = decode::<FilesResponse>(result).await {
        println!("{}", files_table(&r.files));
    }
}

/// Prints folders under a parent; `None` is the root, `all` every folder.
pub async fn list_folders(uri: &str, parent: Option<&str>) {
    let Some(mut resource) = endpoint(uri, "api/folders") else {
        return;
    };
    resource.append_query("parentId", parent.unwrap_or_default());

    let client = Client::new();
    let result = client.get(resource.to_string()).send().await;
    if let Some(r) = decode::<FoldersResponse>(result).await {
        println!("{}", folders_table(&r.folders));
    }
}

pub async fn create_folder(uri: &str, name: &str, parent: Option<&str>) {
    let Some(resource) = endpoint(uri, "api/folders") else {
        return;
    };
    let client = Client::new();
    let result = client
        .post(resource.to_string())
        .json(&json!({ "name": name, "parentId": parent }))
        .send()
        .await;
    if let Some(r) = decode::<FolderResponse>(result).await {
        println!("folder {} created with id {}", r.folder.name, r.folder.id);
    }
}

/// Moves files one at a time, reporting the outcome of each.
pub async fn move_files(uri: &str, files: &[String], folder: Option<&str>) {
    let Some(resource) = endpoint(uri, "api/files/actions") else {
        return;
    };
    let client = Client::new();
    for id in files {
        let result = client
            .put(resource.to_string())
            .json(&json!({ "fileId": id, "newFolderId": folder }))
            .send()
            .await;
        if let Some(r) = decode::<MessageResponse>(result).await {
            println!("{id}: {}", r.message);
        }
    }
}

pub async fn rename_file(uri: &str, id: &str, new_name: &str) {
    let Some(resource) = endpoint(uri, "api/files/actions") else {
        return;
    };
    let client = Client::new();
    let result = client
        .put(resource.to_string())
        .json(&json!({ "fileId": id, "newName": new_name }))
        .send()
        .await;
    if let Some(r) = decode::<MessageResponse>(result).await {
        println!("{id}: {}", r.message);
    }
}

pub async fn delete_file(uri: &str, id: &str) {
    let Some(resource) = endpoint(uri, "api/files/actions") else {
        return;
    };
    let client = Client::new();
    let result = client
        .delete(resource.to_string())
        .json(&json!({ "fileId": id }))
        .send()
        .await;
    if let Some(r) = decode::<MessageResponse>(result).await {
        println!("{id}: {}", r.message);
    }
}

pub async fn cleanup(uri: &str) {
    let Some(resource) = endpoint(uri, "api/maintenance/cleanup") else {
        return;
    };
    let client = Client::new();
    let result = client.post(resource.to_string()).send().await;
    if let Some(r) = decode::<CleanupResponse>(result).await {
        println!("{} stale association(s) removed", r.removed);
    }
}

pub async fn storage_status(uri: &str) {
    let Some(resource) = endpoint(uri, "api/storage") else {
        return;
    };
    let client = Client::new();
    let result = client.get(resource.to_string()).send().await;
    if let Some(r) = decode::<StorageStatus>(result).await {
        println!("backend: {}, files: {}", r.backend, r.file_count);
        if !r.sample_files.is_empty() {
            println!("{}", files_table(&r.sample_files));
        }
    }
}

fn endpoint(uri: &str, path: &str) -> Option<Resource> {
    let Some(mut resource) = Resource::new(uri) else {
        println!("invalid server uri {uri}");
        return None;
    };
    resource.append_path(path);
    Some(resource)
}

async fn decode<T: serde::de::DeserializeOwned>(
    result: reqwest::Result<Response>,
) -> Option<T> {
    let response = match result {
        Ok(r) => r,
        Err(e) => {
            println!("error: {e}");
            return None;
        }
    };
    let status = response.status();
    if !status.is_success() {
        match response.json::<ErrorResponse>().await {
            Ok(e) => println!("request failed. Status: {status} Error: {}", e.error),
            Err(_) => println!("request failed. Status: {status}"),
        }
        return None;
    }
    match response.json().await {
        Ok(r) => Some(r),
        Err(e) => {
            println!("JSON decode error: {e}");
            None
        }
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(TABLE_WIDTH)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

fn files_table(files: &[FileItem]) -> Table {
    let mut table = new_table(&["Id", "Size", "Uploaded", "Folder"]);
    for f in files {
        table.add_row(vec![
            Cell::new(&f.id),
            Cell::new(f.size),
            Cell::new(&f.uploaded_at),
            Cell::new(f.folder_id.as_deref().unwrap_or_default()),
        ]);
    }
    table
}

fn folders_table(folders: &[FolderItem]) -> Table {
    let mut table = new_table(&["Id", "Name", "Parent", "Created"]);
    for f in folders {
        table.add_row(vec![
            Cell::new(&f.id),
            Cell::new(&f.name),
            Cell::new(f.parent_id.as_deref().unwrap_or_default()),
            Cell::new(&f.created_at),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn file(id: &str, folder_id: Option<&str>) -> FileItem {
        FileItem {
            id: id.to_owned(),
            name: id.to_owned(),
            original_name: id.to_owned(),
            size: 10,
            uploaded_at: "2024-05-01T10:20:30.123Z".to_owned(),
            url: format!("/uploads/{id}"),
            folder_id: folder_id.map(str::to_owned),
        }
    }

    #[rstest]
    #[case(None, "")]
    #[case(Some("folder_1"), "folder_1")]
    #[trace]
    fn files_table_rows(#[case] folder_id: Option<&str>, #[case] expected_folder: &str) {
        // Arrange
        let files = vec![file("2024-05-01_10-20-30-123_a.pdf", folder_id)];

        // Act
        let table = files_table(&files);

        // Assert
        let rendered = table.to_string();
        assert!(rendered.contains("2024-05-01_10-20-30-123_a.pdf"));
        assert!(rendered.contains(expected_folder));
        assert_eq!(table.row_iter().count(), 1);
    }

    #[test]
    fn folders_table_rows() {
        // Arrange
        let folders = vec![FolderItem {
            id: "folder_1".to_owned(),
            name: "Chemistry".to_owned(),
            created_at: "2024-05-01T10:20:30.123Z".to_owned(),
            parent_id: None,
            color: "#3B82F6".to_owned(),
        }];

        // Act
        let table = folders_table(&folders);

        // Assert
        assert!(table.to_string().contains("Chemistry"));
        assert_eq!(table.row_iter().count(), 1);
    }

    #[rstest]
    #[case("http://localhost:5000", Some("http://localhost:5000/api/files"))]
    #[case("localhost", None)]
    #[trace]
    fn endpoint_from_uri(#[case] uri: &str, #[case] expected: Option<&str>) {
        // Act
        let resource = endpoint(uri, "api/files");

        // Assert
        assert_eq!(resource.map(|r| r.to_string()).as_deref(), expected);
    }
}
