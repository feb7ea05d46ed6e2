use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Single-slot cancellable timer. Scheduling a value cancels whatever was
/// pending, so only the last value of a burst is ever delivered.
pub struct Debouncer<T> {
    delay: Duration,
    tx: mpsc::UnboundedSender<T>,
    pending: Option<CancellationToken>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<T>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, value: T) {
        self.cancel();

        let token = CancellationToken::new();
        let task_token = token.clone();
        let tx = self.tx.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    tx.send(value).ok();
                }
            }
        });

        self.pending = Some(token);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn burst_delivers_only_final_value() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(DELAY, tx);

        for term in ["b", "bu", "bug"] {
            debouncer.schedule(term.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(DELAY).await;

        assert_eq!(rx.try_recv().ok(), Some("bug".to_string()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(DELAY, tx);

        debouncer.schedule(1u32);
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv().ok(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_inputs_each_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(DELAY, tx);

        debouncer.schedule(1u32);
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.schedule(2u32);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(rx.try_recv().ok(), Some(1));
        assert_eq!(rx.try_recv().ok(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_value() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(DELAY, tx);

        debouncer.schedule(1u32);
        debouncer.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
