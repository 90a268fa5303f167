use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::stream::FusedStream;
use futures::Stream;

use crate::error::{Error, Result};
use crate::pending::{CancelHandle, PendingRequest};

/// Stream that yields the result of one dispatch
///
/// Emits a single `Ok(value)` and ends, or a single `Err(error)` and ends. A
/// cancelled dispatch ends without emitting anything. The request is already
/// running when the stream is created, so subscribing late still sees the
/// result. Dropping the stream before it ends cancels the request.
#[must_use = "streams do nothing unless polled, and dropping this one cancels the request"]
#[derive(Debug)]
pub struct SingleStream<T> {
    pending: Option<PendingRequest<T>>,
}

impl<T> SingleStream<T> {
    pub(crate) fn new(pending: PendingRequest<T>) -> Self {
        Self {
            pending: Some(pending),
        }
    }

    /// Get a handle that can cancel the underlying dispatch
    ///
    /// Once the stream has ended the returned handle is inert.
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.pending.as_ref().map(PendingRequest::cancel_handle)
    }
}

impl<T> Stream for SingleStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let pending = match this.pending.as_mut() {
            Some(pending) => pending,
            None => return Poll::Ready(None),
        };

        let result = ready!(Pin::new(pending).poll(cx));
        this.pending = None;

        match result {
            Err(Error::Cancelled) => Poll::Ready(None),
            result => Poll::Ready(Some(result)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.pending {
            Some(_) => (0, Some(1)),
            None => (0, Some(0)),
        }
    }
}

impl<T> FusedStream for SingleStream<T> {
    fn is_terminated(&self) -> bool {
        self.pending
            .as_ref()
            .map_or(true, PendingRequest::is_terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::runtime::Handle;

    #[tokio::test]
    async fn test_single_value_then_end() {
        let pending = PendingRequest::spawn(&Handle::current(), async { Ok(1) });
        let mut stream = SingleStream::new(pending);
        assert_eq!(stream.size_hint(), (0, Some(1)));
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(stream.next().await.is_none());
        assert!(stream.is_terminated());
    }

    #[tokio::test]
    async fn test_error_then_end() {
        let mut stream = SingleStream::new(PendingRequest::<()>::spawn(&Handle::current(), async {
            Err(Error::invalid_request("boom"))
        }));
        assert!(stream.next().await.unwrap().unwrap_err().is_invalid_request());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_stream_ends_empty() {
        let stream = SingleStream::new(PendingRequest::<()>::spawn(
            &Handle::current(),
            futures::future::pending(),
        ));
        let handle = stream.cancel_handle().unwrap();
        assert!(handle.cancel());

        let items: Vec<_> = stream.collect().await;
        assert!(items.is_empty());
    }
}
