//! Live snapshot subscriptions
//!
//! A subscription is a spawned watcher task feeding a bounded channel. The
//! watcher emits the full current snapshot once, then again after every
//! change event that concerns it. It stops when:
//!
//! - the subscriber cancels or drops the `Subscription`
//! - a load fails (the error is delivered first)
//! - the change feed closes
//!
//! Nothing is delivered after cancellation, even if the watcher had already
//! queued a snapshot.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use thrift_common::{Error, Result};

use crate::repository::{ChangeEvent, ChangeFeed};

/// Cancels a subscription from anywhere; cheap to clone
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    cancelled: Arc<AtomicBool>,
    watcher: AbortHandle,
}

impl SubscriptionHandle {
    /// Stop the watcher. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.watcher.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Stream of snapshots of type `T`
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::Receiver<Result<T>>,
    handle: SubscriptionHandle,
}

impl<T> Subscription<T> {
    /// Next snapshot; `None` once the subscription is over
    pub async fn next(&mut self) -> Option<Result<T>> {
        if self.handle.is_cancelled() {
            return None;
        }
        let item = self.rx.recv().await;
        if self.handle.is_cancelled() {
            return None;
        }
        item
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    pub fn cancel(&mut self) {
        self.handle.cancel();
        self.rx.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.handle.watcher.abort();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.handle.is_cancelled() {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(_) if this.handle.is_cancelled() => Poll::Ready(None),
            other => other,
        }
    }
}

/// Start a watcher that reloads with `load` whenever `affects` accepts an event
///
/// The watcher subscribes to the feed before the first load, so a write
/// landing between the initial read and the first event is never missed.
/// Lagging behind the feed forces a reload, since skipped events are unknown.
pub(crate) fn watch<T, L, Fut, A>(
    changes: &ChangeFeed,
    buffer: usize,
    scope: String,
    affects: A,
    load: L,
) -> Subscription<T>
where
    T: Send + 'static,
    L: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    A: Fn(&ChangeEvent) -> bool + Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let mut events = changes.subscribe();

    let watcher = tokio::spawn(async move {
        tracing::debug!(scope = %scope, "Subscription started");

        if deliver(&tx, load().await).await {
            loop {
                let reload = tokio::select! {
                    _ = tx.closed() => break,
                    event = events.recv() => match event {
                        Ok(event) => affects(&event),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(scope = %scope, skipped, "Subscription lagged, reloading");
                            true
                        }
                        Err(RecvError::Closed) => {
                            let _ = tx
                                .send(Err(Error::Remote("Change feed closed".to_string())))
                                .await;
                            break;
                        }
                    },
                };

                if reload && !deliver(&tx, load().await).await {
                    break;
                }
            }
        }

        tracing::debug!(scope = %scope, "Subscription ended");
    });

    Subscription {
        rx,
        handle: SubscriptionHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            watcher: watcher.abort_handle(),
        },
    }
}

/// Send one load result; `false` when the watcher must stop
async fn deliver<T>(tx: &mpsc::Sender<Result<T>>, snapshot: Result<T>) -> bool {
    let keep_going = snapshot.is_ok();
    if let Err(e) = &snapshot {
        tracing::warn!(error = %e, "Subscription load failed");
    }
    tx.send(snapshot).await.is_ok() && keep_going
}
