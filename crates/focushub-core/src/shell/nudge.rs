//! One-shot delayed nudge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Raises a flag once after a delay. Dropping the trigger cancels it.
#[derive(Debug)]
pub struct NudgeTrigger {
    handle: JoinHandle<()>,
}

impl NudgeTrigger {
    /// Arm the trigger. Must be called from within a Tokio runtime.
    pub fn arm(delay: Duration, flag: Arc<AtomicBool>) -> Result<Self> {
        let handle = Handle::try_current()?.spawn(async move {
            tokio::time::sleep(delay).await;
            flag.store(true, Ordering::SeqCst);
            tracing::debug!(delay_secs = delay.as_secs(), "nudge fired");
        });
        Ok(Self { handle })
    }

    /// Whether the nudge already fired or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for NudgeTrigger {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let flag = Arc::new(AtomicBool::new(false));
        let trigger = NudgeTrigger::arm(Duration::from_secs(30), Arc::clone(&flag)).unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(!flag.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(flag.load(Ordering::SeqCst));
        assert!(trigger.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let flag = Arc::new(AtomicBool::new(false));
        let trigger = NudgeTrigger::arm(Duration::from_secs(30), Arc::clone(&flag)).unwrap();
        drop(trigger);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn requires_runtime() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(NudgeTrigger::arm(Duration::from_secs(1), flag).is_err());
    }
}
