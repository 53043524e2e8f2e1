//! WebSocket client session management.

use clubchat_server::infrastructure::dto::WireMessage;
use futures_util::{SinkExt, StreamExt};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use crate::{domain::connect_url, error::ClientError};

use super::{
    formatter::MessageFormatter,
    ui::{prompt_for, redisplay_prompt},
};

/// How a read loop ended
enum ReadOutcome {
    /// The server answered the join with an error frame
    Rejected(String),
    /// The server closed the connection or the transport failed
    Lost,
}

fn join_frame(chat_id: &str, user_id: &str) -> WireMessage {
    WireMessage {
        kind: "join".to_string(),
        user_id: Some(user_id.to_string()),
        chat_id: Some(chat_id.to_string()),
        ..Default::default()
    }
}

fn chat_frame(chat_id: &str, user_id: &str, text: String) -> WireMessage {
    WireMessage {
        kind: "chat".to_string(),
        text: Some(text),
        user_id: Some(user_id.to_string()),
        chat_id: Some(chat_id.to_string()),
        ..Default::default()
    }
}

/// Run the WebSocket client session
pub async fn run_client_session(url: &str, chat_id: &str, user_id: &str) -> Result<(), ClientError> {
    let url = connect_url(url, chat_id);

    let (ws_stream, _response) = match connect_async(&url).await {
        Ok(result) => result,
        Err(WsError::Http(response)) if response.status().is_client_error() => {
            let body = response
                .body()
                .as_ref()
                .map(|body| String::from_utf8_lossy(body).into_owned())
                .unwrap_or_else(|| response.status().to_string());
            return Err(ClientError::BadRequest(body));
        }
        Err(e) => return Err(ClientError::ConnectionError(e.to_string())),
    };

    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are user {}. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        user_id
    );

    let (mut write, mut read) = ws_stream.split();

    let join = serde_json::to_string(&join_frame(chat_id, user_id))
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    write
        .send(Message::Text(join.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    let prompt = prompt_for(user_id);

    // Spawn a task to handle incoming messages
    let prompt_for_read = prompt.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<WireMessage>(text.as_str()) {
                        Ok(message) => {
                            print!("{}", MessageFormatter::format_incoming(&message));
                            redisplay_prompt(&prompt_for_read);
                            if message.kind == "error" {
                                return ReadOutcome::Rejected(message.text.unwrap_or_default());
                            }
                        }
                        Err(_) => {
                            print!("{}", MessageFormatter::format_raw_message(text.as_str()));
                            redisplay_prompt(&prompt_for_read);
                        }
                    }
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&prompt_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        ReadOutcome::Lost
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_for_input = prompt.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt_for_input) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to send typed lines as chat messages
    let chat_id = chat_id.to_string();
    let user_id = user_id.to_string();
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let json = match serde_json::to_string(&chat_frame(&chat_id, &user_id, line)) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                return false;
            }
        }

        write.close().await.ok();
        true
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            match read_result {
                Ok(ReadOutcome::Rejected(text)) => Err(ClientError::JoinRejected(text)),
                _ => Err(ClientError::ConnectionError("Connection lost".to_string())),
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            match write_result {
                Ok(true) => Ok(()),
                _ => Err(ClientError::ConnectionError("Connection lost".to_string())),
            }
        }
    }
}
