//! Strictly ordered submission of remote calls.
//!
//! A single worker task drains a FIFO channel of futures. Each future runs to
//! completion (success, error or panic) before the next one starts, so calls
//! reach the service in the order they were enqueued. Failures are logged and
//! never stop the worker.

use crate::error::{PublisherError, PublisherResult};
use futures::future::BoxFuture;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

type Task = BoxFuture<'static, PublisherResult<()>>;

enum Message {
    Run { label: String, task: Task },
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct SubmissionQueue {
    sender: mpsc::UnboundedSender<Message>,
}

impl SubmissionQueue {
    /// Spawn the worker on the current Tokio runtime.
    pub fn start() -> PublisherResult<Self> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| PublisherError::NoRuntime)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        runtime.spawn(Self::run(receiver));

        Ok(Self { sender })
    }

    async fn run(mut receiver: mpsc::UnboundedReceiver<Message>) {
        while let Some(message) = receiver.recv().await {
            match message {
                Message::Run { label, task } => match tokio::spawn(task).await {
                    Ok(Ok(())) => debug!("{} completed", label),
                    Ok(Err(e)) => error!("{} failed: {}", label, e),
                    Err(e) => error!("{} aborted: {}", label, e),
                },
                Message::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        debug!("Submission queue closed");
    }

    /// Append a task. Returns immediately; the task runs after everything
    /// enqueued before it has settled.
    pub fn enqueue<F>(&self, label: impl Into<String>, task: F)
    where
        F: Future<Output = PublisherResult<()>> + Send + 'static,
    {
        let label = label.into();
        debug!("Enqueueing {}", label);

        let message = Message::Run {
            label: label.clone(),
            task: Box::pin(task),
        };
        if self.sender.send(message).is_err() {
            warn!("Submission queue has stopped; dropping {}", label);
        }
    }

    /// Wait until every task enqueued before this call has settled.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Message::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    async fn explode() -> PublisherResult<()> {
        panic!("task blew up")
    }

    fn recorder() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_tasks_run_in_order() {
        let log = recorder();
        let queue = SubmissionQueue::start().unwrap();

        let slow = log.clone();
        queue.enqueue("slow", async move {
            slow.lock().unwrap().push("slow:start".to_string());
            tokio::time::sleep(Duration::from_millis(50)).await;
            slow.lock().unwrap().push("slow:end".to_string());
            Ok(())
        });

        let fast = log.clone();
        queue.enqueue("fast", async move {
            fast.lock().unwrap().push("fast:start".to_string());
            Ok(())
        });

        queue.flush().await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["slow:start", "slow:end", "fast:start"]
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_halt_queue() {
        let log = recorder();
        let queue = SubmissionQueue::start().unwrap();

        queue.enqueue("failing", async {
            Err(PublisherError::config("remote rejected"))
        });

        queue.enqueue("panicking", explode());

        let after = log.clone();
        queue.enqueue("after", async move {
            after.lock().unwrap().push("after".to_string());
            Ok(())
        });

        queue.flush().await;
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
    }

    #[test]
    fn test_requires_runtime() {
        assert!(matches!(
            SubmissionQueue::start(),
            Err(PublisherError::NoRuntime)
        ));
    }
}
