use std::io::{self, Write};
use std::sync::atomic::Ordering;

use agent_stream::{cancellation_signal, ChatStreamClient, StreamError};
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use trip_chat::commands::HELP_TEXT;
use trip_chat::logging::init_logging;
use trip_chat::{
    parse_slash_command, AppConfig, ChatSession, SlashCommand, Transcript, TranscriptObserver,
    TurnHandle, TurnOutcome,
};

/// Writes reply text to stdout as it arrives.
struct StdoutPrinter;

impl TranscriptObserver for StdoutPrinter {
    fn on_fragment(&mut self, _transcript: &Transcript, _handle: &TurnHandle, fragment: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(fragment.as_bytes());
        let _ = stdout.flush();
    }

    fn on_failure(&mut self, transcript: &Transcript, _error: &StreamError) {
        if let Some(message) = transcript.last() {
            println!("{}", message.content);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let client =
        ChatStreamClient::new(config.api_config()).context("failed to build HTTP client")?;
    let mut session =
        ChatSession::new(client, config.session_id.clone()).with_auth_token(config.access_token);
    info!(
        endpoint = %session.opener().normalized_endpoint(),
        session_id = session.session_id(),
        "chat session ready"
    );

    println!("{HELP_TEXT}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        if let Some(command) = parse_slash_command(&line) {
            match command {
                SlashCommand::Help => println!("{HELP_TEXT}"),
                SlashCommand::Clear => {
                    session.clear();
                    println!("Transcript cleared.");
                }
                SlashCommand::New => println!("New session: {}", session.reset_session()),
                SlashCommand::Quit => break,
                SlashCommand::Unknown(command) => println!("Unknown command: {command}"),
            }
            continue;
        }

        run_turn(&mut session, &line).await;
    }

    Ok(())
}

async fn run_turn(session: &mut ChatSession<ChatStreamClient>, line: &str) {
    let cancel = cancellation_signal();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Release);
            }
        }
    });

    let result = session
        .send_turn(line, Some(&cancel), &mut StdoutPrinter)
        .await;
    watcher.abort();

    match result {
        Ok(TurnOutcome::Ignored | TurnOutcome::Completed(_)) => {}
        Err(error) if error.is_cancelled() => println!("\n[cancelled]"),
        Err(error) => eprintln!("error: {error}"),
    }
}

fn prompt() {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(b"> ");
    let _ = stdout.flush();
}
