//! Handle all the raw input directly from the end user.

use std::io::Read as _;

use color_eyre::eyre::Result;
use termwiz::input::{InputEvent, KeyCode, Modifiers};

use crate::run::Protocol;

/// Bytes from STDIN
pub type BytesFromSTDIN = [u8; 128];

/// The control character sent by `Ctrl-C` when the terminal is in raw mode.
const END_OF_TEXT: char = '\u{3}';

/// Handle input from the user
#[derive(Debug)]
pub struct RawInput {
    /// The main protocol channel.
    protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
}

impl RawInput {
    /// Start a thread to listen to and parse the end user's STDIN and forward anything
    /// meaningful to the rest of the application.
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> std::thread::JoinHandle<Result<()>> {
        // The Tokio docs suggest using `std::thread` to listen on STDIN for interactive
        // applications.
        std::thread::spawn(move || -> Result<()> {
            let protocol_for_shutdown = protocol_tx.clone();
            let input = Self { protocol_tx };
            let result = input.consume_stdin();
            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_for_shutdown);
                return Err(error);
            }
            Ok(())
        })
    }

    /// Listen to the end user's STDIN and parse all the bytes into events.
    fn consume_stdin(&self) -> Result<()> {
        tracing::debug!("Starting to listen on STDIN");

        let stdin = std::io::stdin();
        let mut reader = std::io::BufReader::new(stdin);
        let mut parser = termwiz::input::InputParser::new();

        loop {
            let mut buffer: BytesFromSTDIN = [0; 128];
            match reader.read(&mut buffer[..]) {
                Ok(0) => {
                    tracing::debug!("STDIN closed");
                    crate::run::broadcast_protocol_end(&self.protocol_tx);
                    return Ok(());
                }
                Ok(n) => {
                    if let Some(bytes) = buffer.get(0..n) {
                        tracing::trace!("Received STDIN input: {bytes:x?}");
                        parser.parse(bytes, |event| self.parsed_event_callback(&event), false);
                    } else {
                        tracing::warn!("Couldn't get bytes from STDIN input buffer");
                    }
                }
                Err(err) => {
                    return Err(color_eyre::eyre::Error::new(err));
                }
            }
        }
    }

    /// The callback for when the input parser detects known keyboard/mouse events.
    fn parsed_event_callback(&self, event: &InputEvent) {
        tracing::trace!("Parsed input event: {event:?}");
        let Some(message) = protocol_for_event(event) else {
            return;
        };

        let result = self.protocol_tx.send(message);
        if let Err(error) = result {
            tracing::error!("Error sending input event from thread to task: {error:?}");
        }
    }
}

/// Translate a terminal input event into something the rest of the app cares about.
///
/// Terminals report mouse positions starting from 1.
#[must_use]
#[expect(clippy::wildcard_enum_match_arm, reason = "Most input is ignored")]
pub fn protocol_for_event(event: &InputEvent) -> Option<Protocol> {
    match event {
        InputEvent::Mouse(mouse) => Some(Protocol::Pointer {
            column: mouse.x.saturating_sub(1),
            row: mouse.y.saturating_sub(1),
        }),
        InputEvent::Key(key) => is_quit_key(key.key, key.modifiers).then_some(Protocol::End),
        _ => None,
    }
}

/// `q`, `Esc` or `Ctrl-C`
#[expect(clippy::wildcard_enum_match_arm, reason = "Most keys don't quit")]
fn is_quit_key(key: KeyCode, modifiers: Modifiers) -> bool {
    match key {
        KeyCode::Escape | KeyCode::Char('q' | END_OF_TEXT) => true,
        KeyCode::Char('c' | 'C') => modifiers.contains(Modifiers::CTRL),
        _ => false,
    }
}
