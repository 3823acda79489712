//! WebSocket mock of the recognize channel
//!
//! Acknowledges `start` with `{"state":"listening"}`, counts binary audio and
//! answers `stop` with a final result followed by another `listening`.

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

/// How the mock reacts to a connection.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Recognize `transcript`. The first word is sent as an interim result
    /// when the start message asked for interim results.
    Transcribe { transcript: String },
    /// Answer `start` with an error message and close.
    FailStart { code: u16, error: String },
    /// Close the channel after the first audio frame.
    CloseAfterAudio,
    /// Refuse the upgrade with this HTTP status.
    RejectHandshake(u16),
}

/// What the client presented during the upgrade.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// WebSocket Mock Server State
pub struct WatsonMockState {
    pub behavior: MockBehavior,
    pub connections: AtomicU64,
    pub audio_bytes: AtomicUsize,
    pub stops: AtomicU64,
    pub handshakes: Mutex<Vec<Handshake>>,
    pub start_messages: Mutex<Vec<Value>>,
}

impl WatsonMockState {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            connections: AtomicU64::new(0),
            audio_bytes: AtomicUsize::new(0),
            stops: AtomicU64::new(0),
            handshakes: Mutex::new(Vec::new()),
            start_messages: Mutex::new(Vec::new()),
        })
    }

    pub fn transcribing(transcript: &str) -> Arc<Self> {
        Self::new(MockBehavior::Transcribe {
            transcript: transcript.to_string(),
        })
    }

    pub fn last_handshake(&self) -> Option<Handshake> {
        self.handshakes.lock().last().cloned()
    }
}

fn listening() -> Message {
    Message::Text(json!({ "state": "listening" }).to_string().into())
}

fn results(transcript: &str, is_final: bool) -> Message {
    let mut alternative = json!({ "transcript": transcript });
    if is_final {
        alternative["confidence"] = json!(0.91);
    }
    let body = json!({
        "result_index": 0,
        "results": [{ "final": is_final, "alternatives": [alternative] }]
    });
    Message::Text(body.to_string().into())
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<WatsonMockState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let handshake_state = Arc::clone(&state);
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let uri = request.uri();
        handshake_state.handshakes.lock().push(Handshake {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            authorization: request
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });

        if let MockBehavior::RejectHandshake(status) = handshake_state.behavior {
            let mut error = ErrorResponse::new(Some(r#"{"error":"Unauthorized"}"#.to_string()));
            *error.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::UNAUTHORIZED);
            return Err(error);
        }
        Ok(response)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();
    state.connections.fetch_add(1, Ordering::Relaxed);

    let mut interim = false;
    let mut received = 0usize;

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let Ok(msg) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                match msg.get("action").and_then(Value::as_str) {
                    Some("start") => {
                        interim = msg
                            .get("interim_results")
                            .and_then(Value::as_bool)
                            .unwrap_or(false);
                        state.start_messages.lock().push(msg.clone());

                        if let MockBehavior::FailStart { code, error } = &state.behavior {
                            let body = json!({ "error": error, "code": code });
                            write.send(Message::Text(body.to_string().into())).await?;
                            write.send(Message::Close(None)).await?;
                            break;
                        }
                        write.send(listening()).await?;
                    }
                    Some("stop") => {
                        state.stops.fetch_add(1, Ordering::Relaxed);
                        if let MockBehavior::Transcribe { transcript } = &state.behavior {
                            write.send(results(transcript, true)).await?;
                        }
                        write.send(listening()).await?;
                    }
                    _ => {}
                }
            }
            Ok(Message::Binary(audio)) => {
                let first = received == 0;
                received += audio.len();
                state.audio_bytes.fetch_add(audio.len(), Ordering::Relaxed);

                match &state.behavior {
                    MockBehavior::CloseAfterAudio => {
                        write.send(Message::Close(None)).await?;
                        break;
                    }
                    MockBehavior::Transcribe { transcript } if interim && first => {
                        let first_word = transcript.split_whitespace().next().unwrap_or_default();
                        write.send(results(first_word, false)).await?;
                    }
                    _ => {}
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(data)) => {
                write.send(Message::Pong(data)).await?;
            }
            Err(e) => {
                eprintln!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

/// Start the mock on an ephemeral port.
pub async fn spawn_watson_mock(state: Arc<WatsonMockState>) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, state).await {
                    eprintln!("Mock connection error: {}", e);
                }
            });
        }
    });

    (addr, handle)
}
