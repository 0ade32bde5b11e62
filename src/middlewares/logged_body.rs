//! Response body that writes the deferred access-log line once it is done.
//!
//! The exchange counts as finished when the body reports end-of-stream,
//! fails, or is dropped before completion (client went away, `HEAD`).

use axum::body::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

use super::access_log::AccessLogger;
use crate::domain::{Phase, RequestTimeline, RequestView, ResponseView};

/// Exchange state carried by the body until the line is written.
struct Completion {
    logger: AccessLogger,
    request: RequestView,
    head: ResponseView,
    timeline: RequestTimeline,
}

/// Wraps a response body and logs the exchange exactly once.
pub struct LoggedBody<B> {
    inner: B,
    bytes_sent: u64,
    completion: Option<Completion>,
}

impl<B> LoggedBody<B> {
    pub(crate) fn new(
        inner: B,
        logger: AccessLogger,
        request: RequestView,
        head: ResponseView,
        timeline: RequestTimeline,
    ) -> Self {
        Self {
            inner,
            bytes_sent: 0,
            completion: Some(Completion {
                logger,
                request,
                head,
                timeline,
            }),
        }
    }

    fn complete(&mut self) {
        let Some(Completion {
            logger,
            request,
            head,
            mut timeline,
        }) = self.completion.take()
        else {
            return;
        };

        debug_assert_eq!(timeline.phase(), Phase::Active);
        let finished_at = timeline.finish();
        debug!(
            started_at = %timeline.start_wall(),
            bytes = self.bytes_sent,
            "Response body finished"
        );

        let response = head.finished(finished_at, self.bytes_sent);
        logger.log(&request, &response);
    }
}

impl<B> HttpBody for LoggedBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    self.bytes_sent += data.len() as u64;
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => self.complete(),
            Poll::Pending => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for LoggedBody<B> {
    fn drop(&mut self) {
        self.complete();
    }
}
