//! Draft - send one instruction to a live backend and stream the result.
//!
//! This example demonstrates:
//! - Building a client from `DRAFTWIRE_WS_BASE_URL`
//! - Streaming chunks to stdout as they arrive
//! - Telling an interrupt-carrying resolution from a finished draft
//!
//! # Running
//!
//! ```sh
//! DRAFTWIRE_WS_BASE_URL=ws://127.0.0.1:8000 RUST_LOG=draftwire_client=debug \
//!     cargo run --example draft -- doc-42 "Draft a mutual NDA"
//! ```
//!
//! Pass `--update` as the first argument to revise an existing document.

use std::io::Write;

use draftwire_client::{Callbacks, ClientConfig, DocumentClient, DocumentMode, Outcome};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mode = if args.first().map(String::as_str) == Some("--update") {
        args.remove(0);
        DocumentMode::Update
    } else {
        DocumentMode::Create
    };
    if args.len() < 2 {
        eprintln!("usage: draft [--update] <document-id> <instruction>");
        std::process::exit(2);
    }
    let document_id = args.remove(0);
    let instruction = args.join(" ");

    let client = DocumentClient::builder()
        .config(ClientConfig::from_env())
        .build();

    let callbacks = Callbacks::new()
        .on_streaming_start(|| eprintln!("[streaming]"))
        .on_chunk(|chunk| {
            print!("{chunk}");
            let _ = std::io::stdout().flush();
        })
        .on_update(|node| eprintln!("\n[node: {node}]"))
        .on_draft_content(|html| async move {
            eprintln!("\n[draft checkpoint: {} bytes]", html.len());
        })
        .on_interrupt(|payload| async move {
            eprintln!("\n[backend needs more information] {payload}");
        })
        .on_error(|message| eprintln!("\n[backend error] {message}"))
        .on_streaming_end(|| eprintln!("\n[done]"));

    let resolution = client
        .generate_document(document_id, mode, instruction, callbacks)
        .await?;

    match (&resolution.interrupt, resolution.outcome) {
        (Some(question), _) => println!("\nAnswer and re-run with --update: {question}"),
        (None, Outcome::ClosedEarly) => eprintln!("connection closed before the stream ended"),
        (None, Outcome::Completed) => {
            if let Some(draft) = &resolution.draft {
                println!("\n{draft}");
            }
        }
    }

    client.disconnect().await;
    Ok(())
}
