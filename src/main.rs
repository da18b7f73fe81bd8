use anyhow::{Context, Result};
use hookchat::audio::{default_capture_source, RecordingController};
use hookchat::chat::{ChatSession, ClientConfig, TurnResult};
use hookchat::messages::{Artifact, Role};
use hookchat::settings::{FileStore, KeyValueStore, MemoryStore, Settings};
use hookchat::webhook::HttpTransport;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Type a message and press enter to send it.
  /url [value]    show or set the webhook URL
  /reset-url      restore the default webhook URL
  /image <path>   attach an image to the next message
  /record         start a voice recording
  /stop           stop recording and send it
  /history        print the conversation
  /session        print the session id
  /help           show this help
  /quit           exit";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookchat=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting hookchat");

    let config = ClientConfig::default();
    config.validate()?;

    let settings = Settings::load(open_store(&config));
    let transport = HttpTransport::new(&config).context("Failed to create HTTP client")?;
    let mut session = ChatSession::new(&config, settings, Arc::new(transport));
    let mut recorder = RecordingController::new(default_capture_source(config.enable_audio_input));

    println!("hookchat: session {}", session.session_id());
    println!("webhook: {}", display_url(session.webhook_url()));
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/session" => println!("{}", session.session_id()),
            "/url" if arg.is_empty() => println!("{}", display_url(session.webhook_url())),
            "/url" => report_storage(session.set_webhook_url(arg)),
            "/reset-url" => {
                report_storage(session.reset_webhook_url());
                println!("webhook: {}", session.webhook_url());
            }
            "/image" => match Artifact::from_path(arg) {
                Ok(image) => {
                    println!("Attached {} ({} bytes)", image.file_name, image.len());
                    session.attach_image(image);
                }
                Err(e) => println!("{}", e.user_message()),
            },
            "/record" => match recorder.start() {
                Ok(()) => println!("Recording... type /stop to send."),
                Err(e) => {
                    warn!("Could not start recording: {}", e);
                    println!("{}", e.user_message());
                }
            },
            "/stop" => match recorder.stop() {
                Ok(Some(audio)) => {
                    session.attach_audio(audio);
                    dispatch(&mut session);
                }
                Ok(None) => println!("Not recording."),
                Err(e) => println!("{}", e.user_message()),
            },
            "/history" => {
                for message in session.messages() {
                    let who = match message.role {
                        Role::User => "you",
                        Role::Assistant => "bot",
                    };
                    println!("{}> {}", who, message.content);
                }
            }
            _ if command.starts_with('/') => println!("Unknown command. Type /help."),
            _ => {
                session.set_text(line);
                dispatch(&mut session);
            }
        }
    }

    recorder.cancel();
    info!("Goodbye");
    Ok(())
}

fn open_store(config: &ClientConfig) -> Box<dyn KeyValueStore> {
    match config.settings_file() {
        Some(path) => match FileStore::open(&path) {
            Ok(store) => {
                info!("Settings stored in {}", store.path().display());
                return Box::new(store);
            }
            Err(e) => warn!("Falling back to in-memory settings: {}", e),
        },
        None => warn!("No config directory, settings will not be saved"),
    }
    Box::new(MemoryStore::new())
}

/// Send the draft in the background and print the reply when it lands
fn dispatch(session: &mut ChatSession) {
    if let Some(handle) = session.spawn_send() {
        tokio::spawn(print_reply(handle));
    }
}

async fn print_reply(handle: JoinHandle<TurnResult>) {
    match handle.await {
        Ok(result) => println!("bot> {}", result.content),
        Err(e) => warn!("Reply task failed: {}", e),
    }
}

fn report_storage(result: hookchat::Result<()>) {
    if let Err(e) = result {
        warn!("{}", e);
        println!("{}", e.user_message());
    }
}

fn display_url(url: &str) -> &str {
    if url.trim().is_empty() {
        "(not configured, replies are demo text)"
    } else {
        url
    }
}
