//! Terminal front end for the chat widget.
//!
//! `/open` and `/close` toggle the widget, `/quit` exits; any other line is
//! submitted as a message while the widget is open.

use anyhow::Context;
use civic_chat::{
    config::{WidgetConfig, storage_dir_from_env},
    logging,
    message::{Message, Sender},
    services::transcript::{FileStore, TRANSCRIPT_KEY},
    widget::{ChatWidget, SubmitOutcome, Visibility, transport::HttpTransport},
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = WidgetConfig::from_env().context("failed to load widget configuration")?;
    let store = FileStore::new(storage_dir_from_env(), TRANSCRIPT_KEY);
    tracing::info!(endpoint = %config.endpoint_url, transcript = %store.path().display(), "starting chat");

    let mut widget = ChatWidget::mount(HttpTransport::new(config), store);
    println!("💬 type /open to start chatting, /quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/open" => {
                widget.open();
                println!("── Chatbot ──");
                for message in widget.messages() {
                    print_message(message);
                }
            }
            "/close" => {
                widget.close();
                println!("── closed ──");
            }
            _ if widget.visibility() == Visibility::Collapsed => {
                println!("(chat is closed, type /open)");
            }
            _ if !widget.can_submit(&line) => {}
            _ => {
                widget.set_input(line.as_str());
                println!("Typing...");
                if widget.submit_input().await != SubmitOutcome::Rejected
                    && let Some(reply) = widget.messages().last()
                {
                    print_message(reply);
                }
            }
        }
    }

    Ok(())
}

fn print_message(message: &Message) {
    match message.sender {
        Sender::User => println!("you> {}", message.text),
        Sender::Bot => println!("bot> {}", message.text),
    }
}
