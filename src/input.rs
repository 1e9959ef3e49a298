//! Terminal input binding: one keypress starts one discovery.

use std::io::BufRead;

use log::{debug, info, warn};
use tokio::sync::broadcast::Sender;

use crate::protocol::{DiscoveryMessage, Message};

fn is_quit_command(line: &str) -> bool {
    matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "q" | "quit" | "exit"
    )
}

/// Reads lines until quit or end of input. Every other line, including an
/// empty one, publishes a discovery trigger. Publishes `Shutdown` on return.
pub fn run_input_binding<R: BufRead>(input: R, bus_sender: &Sender<Message>) {
    info!("Press Enter to discover a random artist, or type q to quit");
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("Failed to read terminal input: {}", err);
                break;
            }
        };
        if is_quit_command(&line) {
            break;
        }
        debug!("Discovery control activated");
        let _ = bus_sender.send(Message::Discovery(DiscoveryMessage::Start));
    }
    let _ = bus_sender.send(Message::Shutdown);
}
