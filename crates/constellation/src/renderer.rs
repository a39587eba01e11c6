//! Render frames of the particle field to the user's terminal

use color_eyre::eyre::Result;
use tokio::sync::mpsc;

use termwiz::surface::Change as TermwizChange;
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{ScreenSize, Terminal as TermwizTerminal};

use crate::run::Protocol;
use crate::surface::Surface;

/// Reset colours and bring back the cursor.
pub const RESET_SCREEN: &str = "\x1b[0m\x1b[?25h";

/// `Render`
#[derive(Debug)]
pub struct Renderer {
    /// The terminal's width
    pub width: u16,
    /// The terminal's height
    pub height: u16,
}

impl Renderer {
    /// Create a renderer to render to a user's terminal
    pub fn new() -> Result<Self> {
        let size = Self::get_users_tty_size()?;
        Ok(Self {
            width: size.cols.try_into()?,
            height: size.rows.try_into()?,
        })
    }

    /// Instantiate and run
    pub fn start(
        frames_rx: mpsc::Receiver<Surface>,
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            let result = match Self::new() {
                Ok(mut renderer) => renderer.run(frames_rx, protocol_rx, &protocol_tx).await,
                Err(error) => Err(error),
            };

            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_tx);
                return Err(error);
            }

            Ok(())
        })
    }

    /// We need this because `BufferedTerminal::new()` won't take a `Box<dyn Terminal>`.
    fn get_termwiz_terminal() -> Result<impl TermwizTerminal> {
        let capabilities = termwiz::caps::Capabilities::new_from_env()?;
        Ok(termwiz::terminal::new_terminal(capabilities)?)
    }

    /// Just for initialisation
    pub fn get_users_tty_size() -> Result<ScreenSize> {
        let mut terminal = Self::get_termwiz_terminal()?;
        Ok(terminal.get_screen_size()?)
    }

    /// Get the user's current terminal size and propagate it.
    fn handle_resize<T: TermwizTerminal>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<()> {
        let is_resized = terminal.check_for_resize()?;
        if !is_resized {
            return Ok(());
        }

        terminal.repaint()?;

        let (width, height) = terminal.dimensions();
        self.width = width.try_into()?;
        self.height = height.try_into()?;
        tracing::debug!("User's terminal resized to {}x{}", self.width, self.height);
        protocol_tx.send(Protocol::Resize {
            width: self.width,
            height: self.height,
        })?;

        Ok(())
    }

    /// Listen for frames from the animation. It lives in its own method so that any errors are
    /// caught and the user's terminal is always returned to cooked mode.
    async fn run(
        &mut self,
        mut frames: mpsc::Receiver<Surface>,
        mut protocol_rx: tokio::sync::broadcast::Receiver<Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<()> {
        tracing::debug!("Putting user's terminal into raw mode");
        let mut users_terminal = Self::get_termwiz_terminal()?;
        users_terminal.set_raw_mode()?;
        users_terminal.enter_alternate_screen()?;
        let mut terminal = BufferedTerminal::new(users_terminal)?;
        terminal.add_change(TermwizChange::CursorVisibility(
            termwiz::surface::CursorVisibility::Hidden,
        ));
        terminal.add_change(TermwizChange::ClearScreen(
            termwiz::color::ColorAttribute::Default,
        ));
        terminal.flush()?;

        let result = self
            .render_loop(&mut frames, &mut protocol_rx, protocol_tx, &mut terminal)
            .await;

        tracing::debug!("Setting user's terminal to cooked mode");
        terminal.add_change(TermwizChange::CursorVisibility(
            termwiz::surface::CursorVisibility::Visible,
        ));
        terminal.flush()?;
        terminal.terminal().exit_alternate_screen()?;
        terminal.terminal().set_cooked_mode()?;

        result
    }

    /// Draw every frame that arrives until the application ends.
    async fn render_loop<T: TermwizTerminal + Send>(
        &mut self,
        frames: &mut mpsc::Receiver<Surface>,
        protocol_rx: &mut tokio::sync::broadcast::Receiver<Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
        terminal: &mut BufferedTerminal<T>,
    ) -> Result<()> {
        tracing::debug!("Starting render loop");
        #[expect(
            clippy::integer_division_remainder_used,
            reason = "`tokio::select! generates this.`"
        )]
        loop {
            tokio::select! {
                maybe_frame = frames.recv() => {
                    let Some(frame) = maybe_frame else {
                        break;
                    };
                    self.handle_resize(terminal, protocol_tx)?;
                    self.render(&frame, terminal)?;
                }
                Ok(message) = protocol_rx.recv() => {
                    if matches!(message, Protocol::End) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Exited render loop");

        Ok(())
    }

    /// Is the frame the same size as the user's terminal?
    fn fits(&self, frame: &Surface) -> bool {
        frame.width == usize::from(self.width) && frame.height == usize::from(self.height)
    }

    /// Do a single render to the user's actual terminal. It uses a diffing algorithm to make
    /// the minimum number of changes.
    fn render(
        &self,
        frame: &Surface,
        terminal: &mut BufferedTerminal<impl TermwizTerminal>,
    ) -> Result<()> {
        if !self.fits(frame) {
            tracing::trace!(
                "Skipping {}x{} frame while waiting for the resize to propagate",
                frame.width,
                frame.height
            );
            return Ok(());
        }

        terminal.draw_from_screen(&frame.to_termwiz(), 0, 0);

        // This is where we actually render to the user's real terminal.
        terminal.flush()?;

        Ok(())
    }
}
