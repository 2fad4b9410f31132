use clap::ArgMatches;
use client::UploadParams;

use super::{DEFAULT_URI, FILES_SUBCOMMAND, FOLDERS_SUBCOMMAND};

fn uri(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("uri")
        .map_or(DEFAULT_URI, String::as_str)
}

fn optional<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches.get_one::<String>(id).map(String::as_str)
}

pub async fn upload(matches: &ArgMatches) {
    let Some(file) = optional(matches, "file") else {
        return;
    };
    let params = UploadParams {
        uri: uri(matches).to_owned(),
        file: file.to_owned(),
        folder: optional(matches, "folder").map(str::to_owned),
        name: optional(matches, "name").map(str::to_owned),
    };
    client::upload_file(params).await;
}

pub async fn list(matches: &ArgMatches) {
    let uri = uri(matches);
    if let Some(files) = matches.subcommand_matches(FILES_SUBCOMMAND) {
        client::list_files(uri, optional(files, "folder")).await;
    } else if let Some(folders) = matches.subcommand_matches(FOLDERS_SUBCOMMAND) {
        client::list_folders(uri, optional(folders, "parent")).await;
    }
}

pub async fn mkdir(matches: &ArgMatches) {
    if let Some(name) = optional(matches, "name") {
        client::create_folder(uri(matches), name, optional(matches, "parent")).await;
    }
}

pub async fn move_files(matches: &ArgMatches) {
    let files: Vec<String> = matches
        .get_many::<String>("files")
        .map(|ids| ids.cloned().collect())
        .unwrap_or_default();
    client::move_files(uri(matches), &files, optional(matches, "folder")).await;
}

pub async fn rename(matches: &ArgMatches) {
    if let (Some(id), Some(name)) = (optional(matches, "id"), optional(matches, "name")) {
        client::rename_file(uri(matches), id, name).await;
    }
}

pub async fn delete(matches: &ArgMatches) {
    if let Some(id) = optional(matches, "id") {
        client::delete_file(uri(matches), id).await;
    }
}

pub async fn cleanup(matches: &ArgMatches) {
    client::cleanup(uri(matches)).await;
}

pub async fn storage(matches: &ArgMatches) {
    client::storage_status(uri(matches)).await;
}
