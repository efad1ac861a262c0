use super::{Request, Response, Transport, TransportError};
use futures::future::{self, BoxFuture};
use std::{
    io,
    net::SocketAddr,
    sync::atomic::{AtomicUsize, Ordering},
};

type Reply = dyn Fn(usize, Request) -> Result<Response, TransportError> + Send + Sync;

/// Answers requests in memory; the closure sees the 1-based attempt number.
pub(crate) struct MockTransport {
    attempts: AtomicUsize,
    reply: Box<Reply>,
}

impl MockTransport {
    pub(crate) fn new(
        reply: impl Fn(usize, Request) -> Result<Response, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            reply: Box::new(reply),
        }
    }

    /// A peer that is never up.
    pub(crate) fn refusing() -> Self {
        Self::new(|_, _| Err(io::Error::from(io::ErrorKind::ConnectionRefused).into()))
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        _addr: SocketAddr,
        request: Request,
    ) -> BoxFuture<'_, Result<Response, TransportError>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(future::ready((self.reply)(attempt, request)))
    }
}
