//! Schedules one frame at a time. Each frame is only scheduled once the previous one has
//! finished, and the whole chain can be broken at any point with a [`StopHandle`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The number of microseconds in a second.
pub const ONE_MICROSECOND: u64 = 1_000_000;

/// The default target frame rate.
pub const TARGET_FRAME_RATE: u32 = 60;

/// A cloneable handle that breaks a running [`FrameLoop`].
#[derive(Clone, Debug)]
pub struct StopHandle {
    /// Shared with the frame loop.
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Stop the loop. No further frames will be scheduled, though a frame that's already being
    /// drawn will finish.
    pub fn stop(&self) {
        tracing::debug!("Stopping frame loop");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Is the loop still going?
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// `FrameLoop`
#[derive(Debug)]
pub struct FrameLoop {
    /// How long each frame should last.
    frame_duration: std::time::Duration,
    /// The time at which the previous frame was rendered.
    last_frame_tick: tokio::time::Instant,
    /// Cleared when the loop should stop.
    running: Arc<AtomicBool>,
    /// How many frames have been scheduled.
    frames: u64,
}

impl FrameLoop {
    /// Instantiate a running loop.
    #[must_use]
    pub fn new(frame_rate: u32) -> Self {
        let target = ONE_MICROSECOND.wrapping_div(u64::from(frame_rate.max(1)));
        Self {
            frame_duration: std::time::Duration::from_micros(target),
            last_frame_tick: tokio::time::Instant::now(),
            running: Arc::new(AtomicBool::new(true)),
            frames: 0,
        }
    }

    /// Get a handle that can stop this loop from anywhere.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Is the loop still going?
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// How many frames have been scheduled so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// How long each frame should last.
    #[must_use]
    pub const fn frame_duration(&self) -> std::time::Duration {
        self.frame_duration
    }

    /// Sleep until the next frame is due, then schedule it. The time that the previous frame took
    /// to draw is subtracted from the wait, but nothing is done to catch up with frames that
    /// were missed.
    ///
    /// Returns `false`, without scheduling anything, once the loop has been stopped.
    pub async fn next_frame(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        if let Some(wait) = self
            .frame_duration
            .checked_sub(self.last_frame_tick.elapsed())
        {
            tokio::time::sleep(wait).await;
        }
        self.last_frame_tick = tokio::time::Instant::now();

        if !self.is_running() {
            return false;
        }
        self.frames = self.frames.wrapping_add(1);
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_duration_follows_the_frame_rate() {
        assert_eq!(
            FrameLoop::new(50).frame_duration(),
            std::time::Duration::from_millis(20)
        );
        assert_eq!(
            FrameLoop::new(0).frame_duration(),
            std::time::Duration::from_secs(1)
        );
    }

    #[tokio::test]
    async fn frames_are_scheduled_until_stopped() {
        let mut frame_loop = FrameLoop::new(1000);
        assert!(frame_loop.next_frame().await);
        assert!(frame_loop.next_frame().await);
        assert_eq!(frame_loop.frames(), 2);

        let handle = frame_loop.stop_handle();
        assert!(handle.is_running());
        handle.stop();

        assert!(!frame_loop.is_running());
        assert!(!frame_loop.next_frame().await);
        assert_eq!(frame_loop.frames(), 2);
    }

    #[tokio::test]
    async fn stopping_from_another_task() {
        let mut frame_loop = FrameLoop::new(1000);
        let handle = frame_loop.stop_handle();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            handle.stop();
        });

        let mut frames = 0_u32;
        while frame_loop.next_frame().await {
            frames += 1;
        }
        stopper.await.unwrap();

        assert!(frames > 0);
        assert!(!frame_loop.is_running());
    }
}
