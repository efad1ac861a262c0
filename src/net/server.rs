use crate::{
    net::{Request, Response},
    service::Service,
};
use async_bincode::tokio::AsyncBincodeStream;
use futures::{SinkExt, StreamExt};
use std::{io, net::Ipv4Addr, sync::Arc, time::Duration};
use tokio::{io::BufStream, net::TcpListener, task, time};
use tracing::{debug, info, warn};

/// Binds `0.0.0.0:port` and runs the dispatch loop for `service`.
pub async fn serve_tcp(service: Service, port: u16) -> io::Result<()> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
    serve(listener, service).await
}

// Pause after a failed accept so a full fd table doesn't spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Runs the dispatch loop on an already bound listener.
///
/// Every accepted connection carries exactly one request and one response.
/// Failed accepts are logged and the loop keeps going.
pub async fn serve(listener: TcpListener, service: Service) -> io::Result<()> {
    let root_arc = Arc::new(service);
    info!(
        service = root_arc.name(),
        addr = %listener.local_addr()?,
        "serving"
    );
    loop {
        let arc_service = root_arc.clone();
        let (sock, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let mut sock =
            AsyncBincodeStream::<_, Request, Response, _>::from(BufStream::new(sock)).for_async();

        task::spawn(async move {
            match sock.next().await {
                Some(Ok(request)) => {
                    let response = arc_service.dispatch(request).await;
                    if let Err(e) = sock.send(response).await {
                        warn!(%peer, error = %e, "failed to write response");
                    }
                }
                Some(Err(e)) => warn!(%peer, error = %e, "malformed request"),
                None => debug!(%peer, "connection closed without a request"),
            }
        });
    }
}
