use super::{Request, Response, Transport, TransportError};
use async_bincode::{tokio::AsyncBincodeStream, AsyncDestination};
use futures::{future::BoxFuture, SinkExt, StreamExt};
use std::{io, net::SocketAddr, time::Duration};
use tokio::{io::BufStream, net::TcpStream, time};

type ClientStream = AsyncBincodeStream<BufStream<TcpStream>, Response, Request, AsyncDestination>;

/// Opens one TCP connection per request, writes the request frame and reads
/// back a single response frame.
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    timeout: Option<Duration>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds each round trip, connect included.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    async fn connect(addr: SocketAddr) -> io::Result<ClientStream> {
        let sock = TcpStream::connect(addr).await?;
        let sock = BufStream::new(sock);
        let sock = AsyncBincodeStream::from(sock).for_async();
        Ok(sock)
    }

    async fn send_recv(addr: SocketAddr, req: Request) -> Result<Response, TransportError> {
        let mut sock = Self::connect(addr).await?;
        sock.send(req)
            .await
            .map_err(|e| TransportError::Codec(e.to_string()))?;
        let resp = sock
            .next()
            .await
            .ok_or(TransportError::Closed)?
            .map_err(|e| TransportError::Codec(e.to_string()))?;
        Ok(resp)
    }
}

impl Transport for TcpTransport {
    fn send(
        &self,
        addr: SocketAddr,
        request: Request,
    ) -> BoxFuture<'_, Result<Response, TransportError>> {
        Box::pin(async move {
            match self.timeout {
                Some(limit) => time::timeout(limit, Self::send_recv(addr, request))
                    .await
                    .map_err(|_| TransportError::Timeout(limit))?,
                None => Self::send_recv(addr, request).await,
            }
        })
    }
}
