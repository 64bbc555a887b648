//! Trailing-edge debounce for persisting rapidly changing values.
//!
//! A single worker task owns the pending value. Every update restarts the
//! quiet period; when it elapses the latest value is saved. Saves run one at
//! a time in the worker, so a slow save delays the next one instead of
//! overlapping with it. A failed timed save is kept and reported by the next
//! flush.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::error;

use crate::{Error, Result};

enum Command<T> {
    Update(T),
    Flush(oneshot::Sender<Result<()>>),
}

/// Collapses bursts of updates into one delayed save of the latest value.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the worker on the current Tokio runtime.
    pub fn new<F, Fut>(delay: Duration, save: F) -> Self
    where
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, delay, save));
        Self { tx }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn push(&self, value: T) {
        let _ = self.tx.send(Command::Update(value));
    }

    /// Save the pending value now, if there is one. Fails if that save fails,
    /// or else if a timed save failed since the last flush.
    pub async fn flush(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| Error::Internal("debounce worker stopped".to_string()))?;
        done.await
            .map_err(|_| Error::Internal("debounce worker stopped".to_string()))?
    }
}

async fn run<T, F, Fut>(mut rx: mpsc::UnboundedReceiver<Command<T>>, delay: Duration, save: F)
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut pending: Option<T> = None;
    let mut failed: Option<Error> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = rx.recv() => command,
                _ = tokio::time::sleep(delay) => {
                    if let Some(value) = pending.take() {
                        if let Err(e) = save(value).await {
                            error!(error = %e, "Debounced save failed");
                            failed = Some(e);
                        }
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Update(value)) => pending = Some(value),
            Some(Command::Flush(reply)) => {
                let result = match pending.take() {
                    Some(value) => save(value).await,
                    None => Ok(()),
                };
                let result = match failed.take() {
                    Some(e) if result.is_ok() => Err(e),
                    _ => result,
                };
                let _ = reply.send(result);
            }
            None => {
                if let Some(value) = pending.take() {
                    if let Err(e) = save(value).await {
                        error!(error = %e, "Final debounced save failed");
                    }
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, Debouncer<u32>) {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&saved);
        let debouncer = Debouncer::new(Duration::from_millis(400), move |value| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(value);
                Ok(())
            }
        });
        (saved, debouncer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_latest_value() {
        let (saved, debouncer) = recorder();

        for value in 1..=3 {
            debouncer.push(value);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        // 300ms after the last push: still quiet
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(saved.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*saved.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_save_separately() {
        let (saved, debouncer) = recorder();

        debouncer.push(1);
        tokio::time::sleep(Duration::from_millis(500)).await;
        debouncer.push(2);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*saved.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_immediately_once() {
        let (saved, debouncer) = recorder();

        debouncer.push(7);
        debouncer.flush().await.unwrap();
        assert_eq!(*saved.lock().unwrap(), vec![7]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        debouncer.flush().await.unwrap();
        assert_eq!(*saved.lock().unwrap(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_saves_pending_value() {
        let (saved, debouncer) = recorder();

        debouncer.push(9);
        drop(debouncer);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(*saved.lock().unwrap(), vec![9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_reports_save_errors() {
        let debouncer = Debouncer::new(Duration::from_millis(400), |_: u32| async {
            Err(Error::Store("offline".to_string()))
        });

        debouncer.push(1);
        let err = debouncer.flush().await.unwrap_err();
        assert!(err.to_string().contains("offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_save_error_surfaces_on_next_flush() {
        let attempts = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&attempts);
        let debouncer = Debouncer::new(Duration::from_millis(400), move |_: u32| {
            let counter = Arc::clone(&counter);
            async move {
                *counter.lock().unwrap() += 1;
                Err(Error::Store("offline".to_string()))
            }
        });

        debouncer.push(1);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*attempts.lock().unwrap(), 1);

        let err = debouncer.flush().await.unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert_eq!(*attempts.lock().unwrap(), 1);

        // Reported once
        debouncer.flush().await.unwrap();
    }
}
