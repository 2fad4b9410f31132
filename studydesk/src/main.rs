use clap::{arg, command, crate_name, Arg, ArgAction, Command};

mod cli;

#[tokio::main]
async fn main() {
    let cli = build_cli().get_matches();

    match cli.subcommand() {
        Some((cli::VERSION_SUBCOMMAND, _)) => cli::version::run(),
        Some((cli::BUGREPORT_SUBCOMMAND, _)) => cli::bugreport::run(),
        Some((cli::SERVER_SUBCOMMAND, _)) => cli::server::run().await,
        Some((cli::UPLOAD_SUBCOMMAND, m)) => cli::client::upload(m).await,
        Some((cli::LIST_SUBCOMMAND, m)) => cli::client::list(m).await,
        Some((cli::MKDIR_SUBCOMMAND, m)) => cli::client::mkdir(m).await,
        Some((cli::MOVE_SUBCOMMAND, m)) => cli::client::move_files(m).await,
        Some((cli::RENAME_SUBCOMMAND, m)) => cli::client::rename(m).await,
        Some((cli::DELETE_SUBCOMMAND, m)) => cli::client::delete(m).await,
        Some((cli::CLEANUP_SUBCOMMAND, m)) => cli::client::cleanup(m).await,
        Some((cli::STORAGE_SUBCOMMAND, m)) => cli::client::storage(m).await,
        _ => {}
    }
}

fn uri_arg() -> Arg {
    arg!(-u --uri <URI>)
        .default_value(cli::DEFAULT_URI)
        .help("Study desk server URI")
}

fn build_cli() -> Command {
    command!(crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand(Command::new(cli::VERSION_SUBCOMMAND).about(cli::VERSION_DESCRIPTION))
        .subcommand(Command::new(cli::BUGREPORT_SUBCOMMAND).about(cli::BUGREPORT_DESCRIPTION))
        .subcommand(Command::new(cli::SERVER_SUBCOMMAND).about(cli::SERVER_DESCRIPTION))
        .subcommand(
            Command::new(cli::UPLOAD_SUBCOMMAND)
                .about(cli::UPLOAD_DESCRIPTION)
                .arg(uri_arg())
                .arg(
                    arg!(-f --file <FILE>)
                        .required(true)
                        .help("Path to the PDF file to upload"),
                )
                .arg(arg!(--folder <FOLDER>).help("Folder id to place the file into"))
                .arg(arg!(-n --name <NAME>).help("Name to store the file under")),
        )
        .subcommand(
            Command::new(cli::LIST_SUBCOMMAND)
                .about(cli::LIST_DESCRIPTION)
                .arg(uri_arg())
                .subcommand_required(true)
                .subcommand(
                    Command::new(cli::FILES_SUBCOMMAND)
                        .about(cli::FILES_LIST_DESCRIPTION)
                        .arg(arg!(--folder <FOLDER>).help("Folder id or `all`")),
                )
                .subcommand(
                    Command::new(cli::FOLDERS_SUBCOMMAND)
                        .about(cli::FOLDERS_LIST_DESCRIPTION)
                        .arg(arg!(--parent <PARENT>).help("Parent folder id or `all`")),
                ),
        )
        .subcommand(
            Command::new(cli::MKDIR_SUBCOMMAND)
                .about(cli::MKDIR_DESCRIPTION)
                .arg(uri_arg())
                .arg(arg!(-n --name <NAME>).required(true).help("Folder name"))
                .arg(arg!(--parent <PARENT>).help("Parent folder id")),
        )
        .subcommand(
            Command::new(cli::MOVE_SUBCOMMAND)
                .about(cli::MOVE_DESCRIPTION)
                .arg(uri_arg())
                .arg(arg!(--folder <FOLDER>).help("Target folder id"))
                .arg(
                    Arg::new("files")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Ids of the files to move"),
                ),
        )
        .subcommand(
            Command::new(cli::RENAME_SUBCOMMAND)
                .about(cli::RENAME_DESCRIPTION)
                .arg(uri_arg())
                .arg(arg!(--id <ID>).required(true).help("File id"))
                .arg(arg!(-n --name <NAME>).required(true).help("New file name")),
        )
        .subcommand(
            Command::new(cli::DELETE_SUBCOMMAND)
                .about(cli::DELETE_DESCRIPTION)
                .arg(uri_arg())
                .arg(arg!(--id <ID>).required(true).help("File id")),
        )
        .subcommand(
            Command::new(cli::CLEANUP_SUBCOMMAND)
                .about(cli::CLEANUP_DESCRIPTION)
                .arg(uri_arg()),
        )
        .subcommand(
            Command::new(cli::STORAGE_SUBCOMMAND)
                .about(cli::STORAGE_DESCRIPTION)
                .arg(uri_arg()),
        )
        .arg_required_else_help(true)
        .disable_version_flag(true)
}
