use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    draft::encode_image, CatalogController, CatalogError, FileTokenStore, HttpCatalogApi,
    Notification, NotificationLevel, WineDraft,
};
use shared::{domain::SortField, protocol::CatalogEntry};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

mod config;

const IMAGE_FILE_FAILED: &str = "Could not add wine";

use config::{load_settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "cellar", version, about = "Keep track of your wine collection")]
struct Cli {
    /// Path to an optional TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Catalog API base url (overrides config and environment)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// File the access token is persisted in
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account. Log in separately afterwards.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CELLAR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and show the collection
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CELLAR_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = SortField::Title)]
        sort: SortField,
    },
    /// Show the collection
    List {
        #[arg(long, default_value_t = SortField::Title)]
        sort: SortField,
    },
    /// Add a wine and show the updated collection
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, allow_hyphen_values = true)]
        year: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Base64 image payload (a data: url is accepted too)
        #[arg(long, conflicts_with = "image_file")]
        image: Option<String>,
        /// Image file to encode as base64
        #[arg(long)]
        image_file: Option<PathBuf>,
        #[arg(long, default_value_t = SortField::Title)]
        sort: SortField,
    },
    /// Forget the stored access token
    Logout,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let mut cli = Cli::parse();

    if let Err(notification) = load_image_file(&mut cli.command).await {
        eprintln!("{}", render_notification(&notification));
        return Ok(ExitCode::FAILURE);
    }

    let mut settings = load_settings(&cli.config)?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(token_file) = cli.token_file {
        settings.token_file = Some(token_file);
    }

    let api = HttpCatalogApi::with_timeout(
        &settings.api_url,
        Duration::from_secs(settings.request_timeout_seconds),
    )?;
    let tokens = FileTokenStore::new(settings.token_path()?);
    tracing::debug!(
        api_url = %api.base_url(),
        token_file = %tokens.path().display(),
        "cellar: starting"
    );

    let mut controller = CatalogController::restore(Arc::new(api), Arc::new(tokens))
        .await
        .context("failed to read stored session")?;
    let mut notifications = controller.subscribe();

    let outcome = run(&mut controller, cli.command).await;
    print_notifications(&mut notifications);
    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CatalogError::TokenStore(err)) => Err(err.context("session storage failed")),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

async fn run(controller: &mut CatalogController, command: Command) -> Result<(), CatalogError> {
    match command {
        Command::Signup { email, password } => controller.register(&email, &password).await,
        Command::Login {
            email,
            password,
            sort,
        } => {
            controller.authenticate(&email, &password).await?;
            print_catalog(&controller.sorted(sort));
            Ok(())
        }
        Command::List { sort } => {
            require_session(controller)?;
            controller.refresh_catalog().await?;
            print_catalog(&controller.sorted(sort));
            Ok(())
        }
        Command::Add {
            title,
            year,
            description,
            image,
            sort,
            ..
        } => {
            require_session(controller)?;
            let mut draft = WineDraft {
                title,
                year,
                description,
                image: image.unwrap_or_default(),
            };
            controller.add_entry(&mut draft).await?;
            print_catalog(&controller.sorted(sort));
            Ok(())
        }
        Command::Logout => {
            controller.logout().await?;
            println!("Logged out.");
            Ok(())
        }
    }
}

/// Replaces `add --image-file` with the file's base64 contents so the draft only
/// ever sees an inline image.
async fn load_image_file(command: &mut Command) -> Result<(), Notification> {
    let Command::Add {
        image,
        image_file: Some(path),
        ..
    } = command
    else {
        return Ok(());
    };
    let bytes = read_image_file(path).await?;
    *image = Some(encode_image(&bytes));
    Ok(())
}

async fn read_image_file(path: &Path) -> Result<Vec<u8>, Notification> {
    tokio::fs::read(path).await.map_err(|err| {
        tracing::warn!(path = %path.display(), error = %err, "cellar: image file unreadable");
        Notification::error(
            IMAGE_FILE_FAILED,
            format!("could not read '{}': {err}", path.display()),
        )
    })
}

fn require_session(controller: &CatalogController) -> Result<(), CatalogError> {
    if controller.is_logged_in() {
        Ok(())
    } else {
        eprintln!("Not logged in; run `cellar login` first.");
        Err(CatalogError::NotLoggedIn)
    }
}

fn print_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        let line = render_notification(&notification);
        match notification.level {
            NotificationLevel::Error => eprintln!("{line}"),
            NotificationLevel::Success | NotificationLevel::Info => println!("{line}"),
        }
    }
}

fn render_notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Info => "info",
        NotificationLevel::Error => "error",
    };
    format!(
        "[{tag}] {}: {}",
        notification.title, notification.description
    )
}

fn print_catalog(entries: &[CatalogEntry]) {
    if entries.is_empty() {
        println!("Your collection is empty.");
        return;
    }
    for entry in entries {
        println!("{}", render_entry(entry));
    }
}

fn render_entry(entry: &CatalogEntry) -> String {
    let year = match entry.year {
        Some(year) => year.to_string(),
        None => "year unknown".to_string(),
    };
    let mut out = format!("#{}  {} ({year})", entry.id, entry.title);
    if !entry.description.is_empty() {
        out.push_str(&format!("\n    {}", entry.description));
    }
    if !entry.image.is_empty() {
        out.push_str(&format!("\n    image: {} base64 chars", entry.image.len()));
    }
    out
}
