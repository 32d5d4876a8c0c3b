use std::time::Instant;

use anyhow::Result;
use deepchat::api::{ChatSession, HttpChatApi, SessionError};
use deepchat::clipboard::{ClipboardSink, CopyButton, SystemClipboard};
use deepchat::config::{ClientConfig, OutputMode};
use deepchat::format::{Formatter, HtmlRenderer, Segment, reasoning_paragraphs, render_plain};
use deepchat::store::{ChatStore, FilePersistence};
use deepchat::types::ChatMessage;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: /new, /list, /sync, /use <id>, /model <name>, /key <api key>, /copy <n>, /quit";

const CREATED_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

fn format_created(created_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(created_ms) * 1_000_000)
        .ok()
        .and_then(|at| at.format(CREATED_FORMAT).ok())
        .unwrap_or_else(|| "?".to_string())
}

/// Prints messages and returns copy buttons for the code blocks of the last one.
fn render(config: &ClientConfig, formatter: &Formatter, messages: &[ChatMessage]) -> Vec<CopyButton> {
    let renderer = HtmlRenderer::new(config.highlight);
    let mut buttons = Vec::new();
    for message in messages {
        let formatted = formatter.format_message(message);
        let who = if message.is_assistant() { "assistant" } else { "you" };
        let body = match config.output {
            OutputMode::Html => renderer.render(&formatted.segments),
            OutputMode::Text => render_plain(&formatted.segments),
        };
        println!("[{who}]");
        if let Some(reasoning) = &formatted.side_reasoning {
            for line in reasoning_paragraphs(reasoning) {
                println!("> {line}");
            }
        }
        println!("{body}\n");

        buttons = formatted
            .segments
            .iter()
            .filter_map(Segment::as_code)
            .map(|block| CopyButton::new(block.code.clone()))
            .collect();
    }
    buttons
}

fn copy_block(buttons: &mut [CopyButton], arg: &str) {
    let Some(button) = arg
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| buttons.get_mut(idx))
    else {
        eprintln!("no code block {arg:?} in the last message");
        return;
    };
    let now = Instant::now();
    let copied = SystemClipboard::new().and_then(|mut clipboard| {
        let sink: &mut dyn ClipboardSink = &mut clipboard;
        button.trigger(sink, now)
    });
    match copied {
        Ok(true) => println!("[{}]", button.label(now)),
        Ok(false) => println!("[{}] already copied", button.label(now)),
        Err(err) => eprintln!("error: {err}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables take precedence
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = ClientConfig::from_env();
    let persistence = match &config.store_path {
        Some(path) => FilePersistence::new(path),
        None => FilePersistence::default_location(),
    };
    tracing::info!("chat state at {}", persistence.path().display());

    let mut store = ChatStore::open(persistence).with_policy(config.eviction);
    store.evict_stale()?;
    if let Some(key) = &config.api_key {
        store.set_api_key(key.clone())?;
    }

    let api = HttpChatApi::new(&config.api_url)?;
    let mut session = ChatSession::new(api, store, config.model.clone());
    let formatter = Formatter::new(config.format);
    let mut buttons: Vec<CopyButton> = Vec::new();

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();

        let outcome: Result<(), SessionError> = match command {
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{HELP}");
                Ok(())
            }
            "/new" => session.new_chat().await.map(|id| println!("chat {id}")),
            "/list" => {
                let store = session.store();
                for id in store.list_chats() {
                    let marker = if store.selected() == Some(id.as_str()) { "*" } else { " " };
                    let created = store
                        .record(id)
                        .map(|record| format_created(record.created))
                        .unwrap_or_default();
                    println!("{marker} {id}  {created}");
                }
                Ok(())
            }
            "/sync" => session
                .import_remote_chats()
                .await
                .map(|ids| println!("imported {} chat(s)", ids.len())),
            "/use" => session
                .store_mut()
                .select(arg)
                .map_err(SessionError::from)
                .map(|_| {
                    if let Some(messages) = session.current_messages() {
                        buttons = render(&config, &formatter, messages);
                    }
                }),
            "/model" => session.store_mut().set_model_name(arg).map_err(SessionError::from),
            "/key" => session.store_mut().set_api_key(arg).map_err(SessionError::from),
            "/copy" => {
                copy_block(&mut buttons, arg);
                Ok(())
            }
            _ => session.send(line).await.map(|_| {
                if let Some(last) = session.current_messages().and_then(|m| m.last()) {
                    buttons = render(&config, &formatter, std::slice::from_ref(last));
                }
            }),
        };

        if let Err(err) = outcome {
            eprintln!("error: {err}");
        }
    }

    Ok(())
}
