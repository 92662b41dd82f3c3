mod config;
mod file_hash;
mod ibroadcast_rs;
mod library;
mod logging;
mod matcher;
mod ports;
mod scan;
mod selection;
mod services;
mod upload;

#[cfg(test)]
mod test_utils;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context, eyre::eyre};
use tracing_subscriber::filter::LevelFilter;

use crate::{
    config::Config,
    logging::init_tracing,
    services::ibroadcast::{IBroadcastService, client::IBroadcastHttpAdapter},
};

type Service = IBroadcastService<IBroadcastHttpAdapter>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "IBROADCAST_MANAGER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level or filter directives (default: warn)
    #[arg(long, default_value = "warn", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: LevelFilter,

    /// Path to log file
    #[arg(long, env = "IBROADCAST_MANAGER_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct AccountArgs {
    /// Username (email address) of the iBroadcast account
    #[arg(short, long, env = "IBROADCAST_USERNAME")]
    username: Option<String>,

    /// Password of the iBroadcast account
    #[arg(short, long, env = "IBROADCAST_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a playlist from a library folder and/or album filters.
    /// An existing playlist with the same name is replaced.
    #[command(visible_alias = "cp")]
    CreatePlaylist {
        #[command(flatten)]
        account: AccountArgs,

        /// Playlist name
        #[arg(short, long)]
        name: String,

        /// Playlist description
        #[arg(short = 'D', long, default_value = "")]
        description: String,

        /// Add every track whose path starts with this folder
        #[arg(short, long, required_unless_present = "album_filter")]
        folder: Option<String>,

        /// Add every album whose name matches this wildcard filter (`*`, `?`)
        #[arg(short = 'F', long)]
        album_filter: Vec<String>,

        /// Create a public playlist
        #[arg(long, overrides_with = "private")]
        public: bool,

        /// Create a private playlist (default)
        #[arg(long, overrides_with = "public")]
        private: bool,
    },
    /// List the albums matching a wildcard filter (`*`, `?`)
    #[command(visible_alias = "sa")]
    SelectAlbum {
        #[command(flatten)]
        account: AccountArgs,

        /// Filter to apply
        #[arg(short = 'F', long)]
        filter: String,
    },
    /// List the tracks below a library folder
    #[command(visible_alias = "sf")]
    SelectFolder {
        #[command(flatten)]
        account: AccountArgs,

        /// Folder to select from
        #[arg(short, long)]
        folder: String,
    },
    /// Upload a file or folder, skipping content the server already has
    Upload {
        #[command(flatten)]
        account: AccountArgs,

        /// The folder/file to upload
        #[arg(short, long)]
        input: PathBuf,

        /// Upload even if the server already has the same content
        #[arg(long)]
        force: bool,

        /// How deep to descend into the folder (1 = only its direct children)
        #[arg(long)]
        max_depth: Option<usize>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

/// Use the password from the command line, the environment or the config file,
/// and ask for it on the terminal when none of them has one.
fn resolve_password(
    given: Option<String>,
    config: &Config,
    prompt: impl FnOnce() -> Result<String>,
) -> Result<String> {
    match given.or_else(|| config.password.clone()) {
        Some(password) => Ok(password),
        None => prompt(),
    }
}

fn prompt_password(username: &str) -> Result<String> {
    inquire::Password::new(&format!("iBroadcast password for {username}:"))
        .without_confirmation()
        .prompt()
        .wrap_err("No password given. Pass --password, set IBROADCAST_PASSWORD or add it to the config file")
}

/// Log in with the credentials from the command line, the environment or the config file.
async fn connect(config: &Config, account: AccountArgs) -> Result<Service> {
    let username = account
        .username
        .or_else(|| config.username.clone())
        .ok_or_else(|| {
            eyre!("No username given. Pass --username, set IBROADCAST_USERNAME or add it to the config file")
        })?;
    let password = resolve_password(account.password, config, || prompt_password(&username))?;

    let adapter = IBroadcastHttpAdapter::new(config.api_config()?)?;
    let mut service = IBroadcastService::new(adapter, config.session_options());
    service
        .login(&username, &password)
        .await
        .wrap_err("Failed to log in to iBroadcast")?;
    Ok(service)
}

async fn create_playlist(
    service: &mut Service,
    name: &str,
    description: &str,
    folder: Option<&str>,
    album_filters: &[String],
    public: bool,
) -> Result<()> {
    if let Some(folder) = folder {
        let count = service.select_tracks_by_folder(folder, true).await?;
        tracing::info!("Selected {} tracks from {}", count, folder);
    }
    for filter in album_filters {
        let count = service.select_albums_by_name(filter, true).await?;
        tracing::info!("{} albums selected after filter {}", count, filter);
    }

    let selection = service.selection();
    if selection.albums().is_empty() && selection.tracks().is_empty() {
        return Err(eyre!("Nothing matched; not creating playlist {name}"));
    }

    service.create_playlist(name, description, public).await?;
    println!("Created playlist {name}");
    Ok(())
}

async fn select_albums(service: &mut Service, filter: &str) -> Result<()> {
    let count = service.select_albums_by_name(filter, true).await?;
    println!("{count} albums selected");

    let album_ids = service.selection().albums().to_vec();
    let library = service.library().await?;
    for album in album_ids.iter().filter_map(|id| library.album(id)) {
        println!("  {} ({} tracks)", album.name, album.track_ids.len());
    }
    Ok(())
}

async fn select_folder(service: &mut Service, folder: &str) -> Result<()> {
    let count = service.select_tracks_by_folder(folder, true).await?;
    println!("{count} tracks selected");

    let track_ids = service.selection().tracks().to_vec();
    let library = service.library().await?;
    for track in track_ids.iter().filter_map(|id| library.track(id)) {
        match &track.title {
            Some(title) => println!("  {} ({})", track.path, title),
            None => println!("  {}", track.path),
        }
    }
    Ok(())
}

async fn upload(
    service: &mut Service,
    config: &Config,
    input: &Path,
    force: bool,
    max_depth: Option<usize>,
) -> Result<()> {
    let extensions = match &config.upload_extensions {
        Some(extensions) => extensions.clone(),
        None => service.supported_filetypes().await?,
    };
    tracing::debug!("Uploading files with extensions: {:?}", extensions);

    let files = scan::collect_audio_files(input, &extensions, max_depth);
    if files.is_empty() {
        println!("No files to upload in {}", input.display());
        return Ok(());
    }

    let summary = service.upload_files(&files, force).await?;
    if let Some(known) = service.known_checksums() {
        tracing::debug!("{} checksums known after the batch", known);
    }
    println!(
        "{} uploaded, {} already present, {} failed",
        summary.uploaded, summary.skipped, summary.failed
    );

    if summary.failed > 0 {
        return Err(eyre!("{} of {} uploads failed", summary.failed, summary.total()));
    }
    Ok(())
}

/// A command that runs against a logged-in session.
enum Command {
    CreatePlaylist {
        name: String,
        description: String,
        folder: Option<String>,
        album_filter: Vec<String>,
        public: bool,
    },
    SelectAlbum {
        filter: String,
    },
    SelectFolder {
        folder: String,
    },
    Upload {
        input: PathBuf,
        force: bool,
        max_depth: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_file.as_deref(), args.log_file_level)?;

    tracing::debug!("iBroadcast manager starting");
    tracing::debug!("Loading configuration");

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load ibroadcast-manager config")?;

    let (account, run) = match args.command {
        Commands::Config(config_commands) => {
            match config_commands {
                ConfigCommands::CreateDefault => {
                    tracing::debug!("Creating default config");
                    let path = Config::create_default()?;
                    println!("{}", path.display());
                }
                ConfigCommands::Path => match Config::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No default config path found"),
                },
            }
            return Ok(());
        }
        Commands::CreatePlaylist {
            account,
            name,
            description,
            folder,
            album_filter,
            public,
            private: _,
        } => (
            account,
            Command::CreatePlaylist {
                name,
                description,
                folder,
                album_filter,
                public,
            },
        ),
        Commands::SelectAlbum { account, filter } => (account, Command::SelectAlbum { filter }),
        Commands::SelectFolder { account, folder } => (account, Command::SelectFolder { folder }),
        Commands::Upload {
            account,
            input,
            force,
            max_depth,
        } => (
            account,
            Command::Upload {
                input,
                force,
                max_depth,
            },
        ),
    };

    let mut service = connect(&config, account).await?;

    let result = match run {
        Command::CreatePlaylist {
            name,
            description,
            folder,
            album_filter,
            public,
        } => {
            create_playlist(
                &mut service,
                &name,
                &description,
                folder.as_deref(),
                &album_filter,
                public,
            )
            .await
        }
        Command::SelectAlbum { filter } => select_albums(&mut service, &filter).await,
        Command::SelectFolder { folder } => select_folder(&mut service, &folder).await,
        Command::Upload {
            input,
            force,
            max_depth,
        } => upload(&mut service, &config, &input, force, max_depth).await,
    };

    if let Err(e) = service.logout().await {
        tracing::warn!("Failed to log out: {:#}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_flag_wins_over_config() {
        let config = Config {
            password: Some("from-config".to_string()),
            ..Config::default()
        };
        let password = resolve_password(Some("from-flag".to_string()), &config, || {
            panic!("should not prompt")
        })
        .unwrap();
        assert_eq!(password, "from-flag");
    }

    #[test]
    fn test_password_from_config() {
        let config = Config {
            password: Some("from-config".to_string()),
            ..Config::default()
        };
        let password = resolve_password(None, &config, || panic!("should not prompt")).unwrap();
        assert_eq!(password, "from-config");
    }

    #[test]
    fn test_password_prompted_when_missing() {
        let mut prompted = false;
        let password = resolve_password(None, &Config::default(), || {
            prompted = true;
            Ok("typed".to_string())
        })
        .unwrap();
        assert!(prompted);
        assert_eq!(password, "typed");
    }

    #[test]
    fn test_cancelled_prompt_is_an_error() {
        let result = resolve_password(None, &Config::default(), || Err(eyre!("cancelled")));
        assert!(result.is_err());
    }
}
