//! Frankly CLI - a small command-line client for the Frankly chat platform.
//!
//! Reads the app host, key and secret from the environment (or a `.env`
//! file), opens a signed session and runs one command, printing results as
//! JSON on stdout.

use std::io;

use anyhow::{bail, Context, Result};
use futures::{StreamExt, TryStreamExt};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use frankly_core::api::Upload;
use frankly_core::models::{NewAnnouncement, NewFile, NewMessage, NewRoom};
use frankly_core::{Client, ClientConfig};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_HOST: &str = "https://app.franklychat.com";

const HOST_VAR: &str = "FRANKLY_HOST";
const APP_KEY_VAR: &str = "FRANKLY_APP_KEY";
const APP_SECRET_VAR: &str = "FRANKLY_APP_SECRET";

/// Records fetched per request when listing.
const DEFAULT_PAGE_SIZE: u32 = 50;

const USAGE: &str = "\
usage: frankly <command> [args]

commands:
  session                     authenticate and print the session
  rooms                       list rooms
  room <id>                   show one room
  create-room <title>         create a room
  delete-room <id>            delete a room
  messages <room-id> [limit]  list messages in a room
  post <room-id> <text>       post a text message
  users                       list users
  announcements               list announcements
  announce <text>             create an announcement
  publish <id> <room-id>      publish an announcement to a room
  upload <path> <mime-type> [category]
                              create a file and upload its content

environment:
  FRANKLY_HOST, FRANKLY_APP_KEY, FRANKLY_APP_SECRET";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=frankly_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn config_from_env() -> Result<ClientConfig> {
    let host = std::env::var(HOST_VAR).unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let app_key = std::env::var(APP_KEY_VAR).with_context(|| format!("{APP_KEY_VAR} is not set"))?;
    let app_secret = match std::env::var(APP_SECRET_VAR) {
        Ok(secret) => secret,
        Err(_) => rpassword::prompt_password("App secret: ").context("Failed to read app secret")?,
    };
    Ok(ClientConfig::new(host, app_key, app_secret))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_id(arg: Option<&String>, what: &str) -> Result<i64> {
    let Some(arg) = arg else {
        bail!("missing {what}\n\n{USAGE}");
    };
    arg.parse()
        .with_context(|| format!("{what} must be a number, got {arg:?}"))
}

async fn run(client: &Client, args: &[String]) -> Result<()> {
    let command = args.first().map(String::as_str).unwrap_or("help");
    match command {
        "session" => {
            let session = client.session_data();
            if let Some(ref session) = session {
                eprintln!("session expires in {} minutes", session.minutes_until_expiry());
            }
            print_json(&session)
        }
        "rooms" => {
            let rooms = client.rooms().list(DEFAULT_PAGE_SIZE).collect_all().await?;
            print_json(&rooms)
        }
        "room" => {
            let id = parse_id(args.get(1), "room id")?;
            print_json(&client.rooms().get(id).await?)
        }
        "create-room" => {
            let Some(title) = args.get(1) else {
                bail!("missing room title\n\n{USAGE}");
            };
            print_json(&client.rooms().create(&NewRoom::new(title.as_str())).await?)
        }
        "delete-room" => {
            let id = parse_id(args.get(1), "room id")?;
            client.rooms().delete(id).await?;
            info!(room = id, "Room deleted");
            Ok(())
        }
        "messages" => {
            let room_id = parse_id(args.get(1), "room id")?;
            let limit = match args.get(2) {
                Some(limit) => limit.parse().context("limit must be a number")?,
                None => DEFAULT_PAGE_SIZE as usize,
            };
            let messages: Vec<_> = client
                .messages(room_id)
                .list(DEFAULT_PAGE_SIZE)
                .into_stream()
                .take(limit)
                .try_collect()
                .await?;
            print_json(&messages)
        }
        "post" => {
            let room_id = parse_id(args.get(1), "room id")?;
            let text = args[2..].join(" ");
            if text.is_empty() {
                bail!("missing message text\n\n{USAGE}");
            }
            print_json(&client.messages(room_id).create(&NewMessage::text(text)).await?)
        }
        "users" => {
            let users = client.users().list(DEFAULT_PAGE_SIZE).collect_all().await?;
            print_json(&users)
        }
        "announcements" => {
            let announcements = client
                .announcements()
                .list(DEFAULT_PAGE_SIZE)
                .collect_all()
                .await?;
            print_json(&announcements)
        }
        "announce" => {
            let text = args[1..].join(" ");
            if text.is_empty() {
                bail!("missing announcement text\n\n{USAGE}");
            }
            print_json(&client.announcements().create(&NewAnnouncement::text(text)).await?)
        }
        "publish" => {
            let id = parse_id(args.get(1), "announcement id")?;
            let room_id = parse_id(args.get(2), "room id")?;
            client.announcements().publish(id, room_id).await?;
            info!(announcement = id, room = room_id, "Announcement published");
            Ok(())
        }
        "upload" => {
            let (Some(path), Some(mime_type)) = (args.get(1), args.get(2)) else {
                bail!("missing file path or mime type\n\n{USAGE}");
            };
            let content = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
            let file = match args.get(3) {
                Some(category) => NewFile::new(category.as_str()),
                None => NewFile::default(),
            };
            let created = client
                .files()
                .upload(&file, Upload::new(content, mime_type.as_str()))
                .await?;
            print_json(&created)
        }
        _ => {
            eprintln!("{USAGE}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || matches!(args[0].as_str(), "help" | "-h" | "--help") {
        eprintln!("{USAGE}");
        return Ok(());
    }

    let config = config_from_env()?;
    let client = Client::open(config)
        .await
        .context("Failed to authenticate with Frankly")?;
    info!("Session opened");

    let result = run(&client, &args).await;
    client.close();
    result
}
