use crate::error::ConfirmError;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub(crate) type ConfirmSender = oneshot::Sender<Result<bool, ConfirmError>>;

/// Answer to a [`request_confirm`](crate::UiStore::request_confirm)
///
/// Resolves to `Ok(true)` when confirmed and `Ok(false)` when cancelled. A
/// request replaced by a newer one resolves to `Err(Superseded)`; one whose
/// store went away resolves to `Err(Abandoned)`.
///
/// Executor-agnostic: await it anywhere, or poll it with
/// [`try_take`](Self::try_take) from a synchronous event loop.
#[must_use = "a confirm answer is delivered through this future"]
#[derive(Debug)]
pub struct ConfirmFuture {
    rx: oneshot::Receiver<Result<bool, ConfirmError>>,
}

impl ConfirmFuture {
    pub(crate) fn channel() -> (ConfirmSender, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Take the answer if it has arrived
    ///
    /// Returns `None` while the dialog is still pending. The answer can only be
    /// taken once.
    pub fn try_take(&mut self) -> Option<Result<bool, ConfirmError>> {
        match self.rx.try_recv() {
            Ok(answer) => answer,
            Err(oneshot::Canceled) => Some(Err(ConfirmError::Abandoned)),
        }
    }
}

impl Future for ConfirmFuture {
    type Output = Result<bool, ConfirmError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(answer)) => Poll::Ready(answer),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(ConfirmError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
