//! Integration tests for draftwire-client over a real WebSocket.
//!
//! Each test runs a scripted backend on a loopback listener that answers
//! every request frame with a fixed list of frames.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use draftwire_client::protocol::{DocumentMode, RequestFrame};
use draftwire_client::{
    Callbacks, ConnectionState, DocumentClient, DraftwireError, GenerateRequest, Outcome,
};

/// What the scripted backend does after replying.
#[derive(Clone, Copy)]
enum Ending {
    /// Keep the socket open for further requests.
    StayOpen,
    /// Send a close frame.
    Close,
}

/// Start a backend that serves `connections` sockets, answering every
/// request with the same script. Returns the endpoint URL and a receiver of
/// the request frames it read.
async fn scripted_backend(
    replies: Vec<Message>,
    ending: Ending,
    connections: usize,
) -> (String, tokio::sync::mpsc::UnboundedReceiver<RequestFrame>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/lexer/api/ws/document", listener.local_addr().unwrap());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        for _ in 0..connections {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            while let Some(Ok(message)) = ws.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let request: RequestFrame = serde_json::from_str(text.as_str()).unwrap();
                let _ = tx.send(request);

                for reply in replies.clone() {
                    ws.send(reply).await.unwrap();
                }
                if let Ending::Close = ending {
                    let _ = ws.close(None).await;
                    // Drain until the client completes the close handshake.
                    while let Some(Ok(_)) = ws.next().await {}
                    break;
                }
            }
        }
    });

    (url, rx)
}

fn text(value: Value) -> Message {
    Message::text(value.to_string())
}

#[tokio::test]
async fn test_nda_generation_over_websocket() {
    let (url, mut requests) = scripted_backend(
        vec![
            text(json!({"streaming": true})),
            text(json!({"chunk": "Mutual "})),
            text(json!({"chunk": "NDA"})),
            text(json!({"update": "drafting"})),
            text(json!({"draftContent": "<h1>NDA</h1>"})),
            text(json!({"streaming": false})),
        ],
        Ending::StayOpen,
        1,
    )
    .await;

    let client = DocumentClient::new(url);
    let log = Arc::new(Mutex::new(Vec::new()));

    let (l1, l2, l3, l4, l5) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
    let callbacks = Callbacks::new()
        .on_streaming_start(move || l1.lock().unwrap().push("start".to_string()))
        .on_chunk(move |chunk| l2.lock().unwrap().push(format!("chunk:{chunk}")))
        .on_update(move |node| l3.lock().unwrap().push(format!("update:{node}")))
        .on_draft_content(move |html| {
            let l4 = l4.clone();
            async move { l4.lock().unwrap().push(format!("draft:{html}")) }
        })
        .on_streaming_end(move || l5.lock().unwrap().push("end".to_string()));

    let resolution = client
        .generate(GenerateRequest::create("doc-1", "Draft an NDA"), callbacks)
        .await
        .unwrap();

    assert_eq!(resolution.outcome, Outcome::Completed);
    assert_eq!(resolution.chunks, 2);
    assert_eq!(resolution.draft.as_deref(), Some("<h1>NDA</h1>"));
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "start",
            "chunk:Mutual ",
            "chunk:NDA",
            "update:drafting",
            "draft:<h1>NDA</h1>",
            "end",
        ]
    );

    let request = requests.recv().await.unwrap();
    assert_eq!(request.document_id, "doc-1");
    assert_eq!(request.message, "Draft an NDA");
    assert_eq!(request.mode(), DocumentMode::Create);

    assert!(client.is_connected().await);
    client.disconnect().await;
    assert_eq!(client.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_binary_frames_are_decoded() {
    let (url, _requests) = scripted_backend(
        vec![
            Message::binary(json!({"chunk": "bin"}).to_string().into_bytes()),
            text(json!({"streaming": false})),
        ],
        Ending::StayOpen,
        1,
    )
    .await;

    let client = DocumentClient::new(url);
    let chunks = Arc::new(Mutex::new(Vec::new()));
    let c = chunks.clone();
    let resolution = client
        .generate(
            GenerateRequest::update("doc-2", "Shorten it"),
            Callbacks::new().on_chunk(move |chunk| c.lock().unwrap().push(chunk)),
        )
        .await
        .unwrap();

    assert!(resolution.is_completed());
    assert_eq!(*chunks.lock().unwrap(), vec!["bin"]);
}

#[tokio::test]
async fn test_server_close_resolves_closed_early() {
    let (url, _requests) = scripted_backend(
        vec![text(json!({"chunk": "partial"}))],
        Ending::Close,
        2,
    )
    .await;

    let client = DocumentClient::new(url);
    let resolution = client
        .generate(GenerateRequest::create("doc-3", "Go"), Callbacks::new())
        .await
        .unwrap();

    assert_eq!(resolution.outcome, Outcome::ClosedEarly);
    assert_eq!(resolution.chunks, 1);
    assert_eq!(client.state().await, ConnectionState::Closed);

    // The next request reconnects.
    let resolution = client
        .generate(GenerateRequest::update("doc-3", "Again"), Callbacks::new())
        .await
        .unwrap();
    assert_eq!(resolution.outcome, Outcome::ClosedEarly);
}

#[tokio::test]
async fn test_interrupt_then_follow_up_request() {
    let (url, mut requests) = scripted_backend(
        vec![
            text(json!({"interrupt": "Which jurisdiction?"})),
            text(json!({"streaming": false})),
        ],
        Ending::StayOpen,
        1,
    )
    .await;

    let client = DocumentClient::new(url);
    let resolution = client
        .generate(
            GenerateRequest::create("doc-4", "Draft a lease"),
            Callbacks::new().on_interrupt(|_payload| async {}),
        )
        .await
        .unwrap();

    assert_eq!(resolution.interrupt.as_deref(), Some("Which jurisdiction?"));
    assert!(resolution.is_interrupted());
    assert_eq!(requests.recv().await.unwrap().document_id, "doc-4");

    // The caller answers with a new logical request on the same socket.
    let resolution = client
        .generate(
            GenerateRequest::update("doc-4", "California"),
            Callbacks::new(),
        )
        .await
        .unwrap();
    assert!(resolution.is_completed());

    let follow_up = requests.recv().await.unwrap();
    assert_eq!(follow_up.message, "California");
    assert_eq!(follow_up.mode(), DocumentMode::Update);
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = DocumentClient::builder()
        .base_url(&format!("ws://127.0.0.1:{port}"))
        .connect_timeout(Duration::from_secs(2))
        .build();

    let err = client
        .generate(GenerateRequest::create("doc-5", "Hi"), Callbacks::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DraftwireError::Connect(_)));
    assert_eq!(client.state().await, ConnectionState::Disconnected);
}
