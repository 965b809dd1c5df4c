//! Fixed-size worker pool over a message queue.
//!
//! Every item is queued up front. `workers` tasks pull from the shared
//! receiver until it drains or `stop` fires. The caller waits at most
//! `deadline`; workers still busy after that are left running, not killed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct PoolOutcome<R> {
    /// Results delivered before the deadline.
    pub results: Vec<R>,
    pub timed_out: bool,
}

pub async fn run_bounded<T, R, F, Fut>(
    items: Vec<T>,
    workers: usize,
    deadline: Duration,
    stop: CancellationToken,
    job: F,
) -> PoolOutcome<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let (task_tx, task_rx) = mpsc::unbounded_channel::<T>();
    for item in items {
        // Receiver is alive until the workers exit, so this cannot fail here.
        let _ = task_tx.send(item);
    }
    drop(task_tx);

    let queue = Arc::new(Mutex::new(task_rx));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<R>();
    let job = Arc::new(job);

    let handles: Vec<_> = (0..workers.max(1))
        .map(|worker| {
            let queue = queue.clone();
            let result_tx = result_tx.clone();
            let job = job.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                loop {
                    if stop.is_cancelled() {
                        break;
                    }
                    let next = queue.lock().await.recv().await;
                    let Some(item) = next else {
                        break;
                    };
                    let result = job(item).await;
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
                tracing::trace!(worker, "Worker exiting");
            })
        })
        .collect();
    drop(result_tx);

    let timed_out = tokio::time::timeout(deadline, futures_util::future::join_all(handles))
        .await
        .is_err();

    let mut results = Vec::new();
    while let Ok(result) = result_rx.try_recv() {
        results.push(result);
    }
    PoolOutcome { results, timed_out }
}
