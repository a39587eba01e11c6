//! The entrypoint for hosting a particle field: attach it to a surface and it animates itself
//! until it's told to stop.

use color_eyre::eyre::Result;
use rand::Rng;

use crate::canvas::Canvas as _;
use crate::field::ParticleField;
use crate::frame_loop::{FrameLoop, StopHandle};
use crate::run::Protocol;
use crate::surface::Surface;

/// `Animation`
#[derive(Debug)]
pub struct Animation {
    /// All the particles.
    field: ParticleField,
    /// What the field draws on.
    surface: Surface,
    /// Schedules each frame after the last.
    frame_loop: FrameLoop,
    /// How long the pointer can stay still before it's considered to have left.
    pointer_timeout: Option<std::time::Duration>,
    /// When the pointer last moved.
    last_pointer_movement: Option<tokio::time::Instant>,
}

impl Animation {
    /// Bind a new particle field to a surface and populate it. Without a surface there's nothing
    /// to do, so nothing is created.
    pub fn attach<R: Rng + ?Sized>(
        maybe_surface: Option<Surface>,
        config: &crate::config::Config,
        rng: &mut R,
    ) -> Option<Self> {
        let Some(surface) = maybe_surface else {
            tracing::debug!("No surface to attach the animation to");
            return None;
        };

        let mut field = ParticleField::new(config.field.clone());
        let size = surface.dimensions();
        field.initialize(size.x, size.y, rng);

        Some(Self {
            field,
            surface,
            frame_loop: FrameLoop::new(config.frame_rate),
            pointer_timeout: config.pointer_timeout(),
            last_pointer_movement: None,
        })
    }

    /// The particle field.
    #[must_use]
    pub const fn field(&self) -> &ParticleField {
        &self.field
    }

    /// The surface, as drawn by the most recent frame.
    #[must_use]
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Get a handle that stops the animation from anywhere.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.frame_loop.stop_handle()
    }

    /// Draw a single frame.
    pub fn frame(&mut self) {
        self.expire_idle_pointer();
        self.field.tick(&mut self.surface);
    }

    /// Forget the pointer if it hasn't moved for a while.
    fn expire_idle_pointer(&mut self) {
        let (Some(timeout), Some(last_movement)) =
            (self.pointer_timeout, self.last_pointer_movement)
        else {
            return;
        };

        if last_movement.elapsed() >= timeout {
            tracing::trace!("Pointer idle for {timeout:?}, treating it as having left");
            self.field.set_pointer(None);
            self.last_pointer_movement = None;
        }
    }

    /// Handle an event from the host.
    pub fn handle_message(&mut self, message: &Protocol) {
        match message {
            Protocol::Resize { width, height } => {
                self.surface.resize(usize::from(*width), usize::from(*height));
                let size = self.surface.dimensions();
                self.field.resize(size.x, size.y);
            }
            Protocol::Pointer { column, row } => {
                let position = self.surface.cell_centre(*column, *row);
                self.field.set_pointer(Some(position));
                self.last_pointer_movement = Some(tokio::time::Instant::now());
            }
            Protocol::PointerLeave => {
                self.field.set_pointer(None);
                self.last_pointer_movement = None;
            }
            Protocol::End => self.frame_loop.stop_handle().stop(),
        }
    }

    /// Draw frames, one after the other, sending each finished one to the renderer. Host events
    /// are handled in between frames, never during one.
    pub async fn run(
        mut self,
        mut protocol_rx: tokio::sync::broadcast::Receiver<Protocol>,
        frames_tx: tokio::sync::mpsc::Sender<Surface>,
    ) -> Result<()> {
        tracing::debug!(
            "Starting animation with {} particles",
            self.field.particles().len()
        );

        #[expect(
            clippy::integer_division_remainder_used,
            reason = "This is caused by the `tokio::select!`"
        )]
        loop {
            tokio::select! {
                is_running = self.frame_loop.next_frame() => {
                    if !is_running {
                        break;
                    }
                    self.frame();
                    if frames_tx.send(self.surface.clone()).await.is_err() {
                        tracing::debug!("Renderer has gone away, stopping the animation");
                        break;
                    }
                },
                Ok(message) = protocol_rx.recv() => {
                    self.handle_message(&message);
                }
            }

            if !self.frame_loop.is_running() {
                break;
            }
        }

        tracing::debug!(
            "Animation stopped after {} frames",
            self.frame_loop.frames()
        );
        Ok(())
    }
}
