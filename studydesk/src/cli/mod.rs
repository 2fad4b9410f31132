pub mod bugreport;
pub mod client;
pub mod server;
pub mod version;

pub const DEFAULT_URI: &str = "http://localhost:5000";

pub const SERVER_SUBCOMMAND: &str = "server";
pub const SERVER_DESCRIPTION: &str = "Run the server";

pub const VERSION_SUBCOMMAND: &str = "version";
pub const VERSION_DESCRIPTION: &str = "Display the version and build information";

pub const BUGREPORT_SUBCOMMAND: &str = "bugreport";
pub const BUGREPORT_DESCRIPTION: &str = "Collect information about the system and the environment that users can send along with a bug report";

pub const UPLOAD_SUBCOMMAND: &str = "upload";
pub const UPLOAD_DESCRIPTION: &str = "Upload a PDF file";

pub const LIST_SUBCOMMAND: &str = "list";
pub const LIST_DESCRIPTION: &str = "List files or folders";

pub const FILES_SUBCOMMAND: &str = "files";
pub const FILES_LIST_DESCRIPTION: &str = "List files of a folder, the root by default";

pub const FOLDERS_SUBCOMMAND: &str = "folders";
pub const FOLDERS_LIST_DESCRIPTION: &str = "List folders under a parent, the root by default";

pub const MKDIR_SUBCOMMAND: &str = "mkdir";
pub const MKDIR_DESCRIPTION: &str = "Create a folder";

pub const MOVE_SUBCOMMAND: &str = "move";
pub const MOVE_DESCRIPTION: &str = "Move files into a folder, the root when no folder given";

pub const RENAME_SUBCOMMAND: &str = "rename";
pub const RENAME_DESCRIPTION: &str = "Rename a file";

pub const DELETE_SUBCOMMAND: &str = "delete";
pub const DELETE_DESCRIPTION: &str = "Delete a file";

pub const CLEANUP_SUBCOMMAND: &str = "cleanup";
pub const CLEANUP_DESCRIPTION: &str = "Remove folder associations of files that no longer exist";

pub const STORAGE_SUBCOMMAND: &str = "storage";
pub const STORAGE_DESCRIPTION: &str = "Show the storage backend in use";
