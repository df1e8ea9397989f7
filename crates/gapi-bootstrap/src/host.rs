//! Host process abstractions: the document the script lands in, the global
//! the library defines when ready, and the tick cadence used for polling.

use crate::library::LibraryHandle;
use async_trait::async_trait;
use std::time::Duration;

/// Default polling cadence, one animation frame at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Script tag to append to the document head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    pub src: String,
    pub script_type: String,
    pub is_async: bool,
}

impl ScriptElement {
    /// Async `text/javascript` tag for `src`.
    pub fn javascript(src: &str) -> Self {
        Self {
            src: src.to_string(),
            script_type: "text/javascript".to_string(),
            is_async: true,
        }
    }
}

/// The document and global scope of the host.
///
/// One host is shared by every bootstrap in the process.
pub trait ScriptHost: Send + Sync {
    /// Whether a script tag with this `src` is already in the document.
    fn has_script(&self, src: &str) -> bool;

    /// Append `element` unless a tag with the same `src` exists.
    ///
    /// The check and the append must be atomic with respect to every other
    /// caller on this host. Returns true if the tag was appended.
    fn ensure_script(&self, element: ScriptElement) -> bool;

    /// The library root once its global is defined.
    fn library_global(&self) -> Option<LibraryHandle>;
}

/// Yielding scheduler for readiness polling.
#[async_trait]
pub trait TickScheduler: Send + Sync {
    /// Monotonic time since a fixed origin.
    fn now(&self) -> Duration;

    /// Suspend until the host's next tick.
    async fn next_tick(&self);
}

/// Scheduler ticking at a fixed frame interval on the tokio timer.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    origin: tokio::time::Instant,
    frame: Duration,
}

impl FrameScheduler {
    pub fn new(frame: Duration) -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            frame,
        }
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

#[async_trait]
impl TickScheduler for FrameScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn next_tick(&self) {
        tokio::time::sleep(self.frame).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_javascript_element() {
        let element = ScriptElement::javascript("https://apis.google.com/js/api.js");
        assert_eq!(element.src, "https://apis.google.com/js/api.js");
        assert_eq!(element.script_type, "text/javascript");
        assert!(element.is_async);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_scheduler_advances_one_frame_per_tick() {
        let scheduler = FrameScheduler::default();
        let before = scheduler.now();

        scheduler.next_tick().await;
        scheduler.next_tick().await;

        assert!(scheduler.now() - before >= DEFAULT_FRAME_INTERVAL * 2);
    }
}
