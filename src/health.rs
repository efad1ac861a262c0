//! Startup ordering: poll a service's `ping` until it answers.

use crate::{
    config::{ServiceEntry, WaitPolicy},
    net::Transport,
    service::PING,
    stub::CallStub,
};
use std::net::SocketAddr;
use tokio::time;
use tracing::{debug, info, warn};

/// Polls `ping` on `addr` until it answers `true`.
///
/// Attempts start `policy.delay` apart. Every failure (transport, remote,
/// undecodable answer, `false`, or no answer within `policy.attempt_timeout`)
/// counts as "not ready yet". Returns `false` once `policy.max_attempts`
/// attempts have failed, so a dead or silent peer costs about
/// `max_attempts * delay` when the timeout is no longer than the delay.
pub async fn wait_startup<T: Transport>(stub: &CallStub<T>, addr: SocketAddr, policy: WaitPolicy) -> bool {
    for attempt in 1..=policy.max_attempts {
        let started = time::Instant::now();
        let ping = stub.call::<_, bool>(addr, PING, ());
        match time::timeout(policy.attempt_timeout, ping).await {
            Ok(Ok(true)) => {
                info!(%addr, attempt, "service is up");
                return true;
            }
            Ok(Ok(false)) => debug!(%addr, attempt, "service answered but is not ready"),
            Ok(Err(e)) => debug!(%addr, attempt, error = %e, "service not reachable yet"),
            Err(_) => debug!(%addr, attempt, "service did not answer in time"),
        }
        time::sleep_until(started + policy.delay).await;
    }
    warn!(%addr, attempts = policy.max_attempts, "gave up waiting for service");
    false
}

impl ServiceEntry {
    /// [`wait_startup`] against this service on the local host.
    pub async fn wait_startup<T: Transport>(&self, stub: &CallStub<T>, policy: WaitPolicy) -> bool {
        wait_startup(stub, self.addr(), policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        net::{mock::MockTransport, Request, Response, TransportError},
        types::Value,
    };
    use futures::future::{self, BoxFuture};
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::{Duration, Instant},
    };

    /// Accepts every request and never answers.
    #[derive(Default)]
    struct Silent {
        sends: AtomicUsize,
    }

    impl Transport for Silent {
        fn send(&self, _: SocketAddr, _: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Box::pin(future::pending())
        }
    }

    const DELAY: Duration = Duration::from_millis(20);

    fn addr() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 9000))
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let stub = CallStub::with_transport(MockTransport::refusing());
        let started = Instant::now();
        let up = wait_startup(&stub, addr(), WaitPolicy::new(3, DELAY)).await;
        let elapsed = started.elapsed();

        assert!(!up);
        assert_eq!(stub.transport().attempts(), 3);
        assert!(elapsed >= DELAY * 2, "returned too early: {elapsed:?}");
        assert!(elapsed < DELAY * 4, "returned too late: {elapsed:?}");
    }

    #[tokio::test]
    async fn unanswered_attempts_time_out() {
        let stub = CallStub::with_transport(Silent::default());
        let started = Instant::now();
        let up = wait_startup(&stub, addr(), WaitPolicy::new(3, DELAY)).await;
        let elapsed = started.elapsed();

        assert!(!up);
        assert!(elapsed >= DELAY * 2, "returned too early: {elapsed:?}");
        assert!(elapsed < DELAY * 5, "returned too late: {elapsed:?}");
        assert_eq!(stub.transport().sends.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_on_first_true() {
        let stub = CallStub::with_transport(MockTransport::new(|attempt, _| {
            Ok(Response::ok(Value::from(attempt >= 2)))
        }));
        assert!(wait_startup(&stub, addr(), WaitPolicy::new(10, DELAY)).await);
        assert_eq!(stub.transport().attempts(), 2);
    }

    #[tokio::test]
    async fn every_kind_of_failure_means_not_ready() {
        let stub = CallStub::with_transport(MockTransport::new(|attempt, _| match attempt {
            1 => Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into()),
            2 => Ok(Response::error("still booting")),
            3 => Ok(Response::ok(Value::from("yes"))),
            _ => Ok(Response::ok(Value::from(true))),
        }));
        assert!(wait_startup(&stub, addr(), WaitPolicy::new(5, Duration::from_millis(1))).await);
        assert_eq!(stub.transport().attempts(), 4);
    }

    #[tokio::test]
    async fn zero_attempts_never_calls() {
        let stub = CallStub::with_transport(MockTransport::refusing());
        assert!(!wait_startup(&stub, addr(), WaitPolicy::new(0, DELAY)).await);
        assert_eq!(stub.transport().attempts(), 0);
    }

    #[tokio::test]
    async fn entry_polls_ping() {
        let entry = ServiceEntry::new("svc", 9123);
        let stub = CallStub::with_transport(MockTransport::new(|_, request| {
            assert_eq!(request.function, PING);
            Ok(Response::ok(Value::from(true)))
        }));
        assert!(entry.wait_startup(&stub, WaitPolicy::default()).await);
    }

    #[test]
    fn default_policy() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.max_attempts, 1000);
        assert_eq!(policy.delay, Duration::from_millis(10));
        assert_eq!(policy.attempt_timeout, policy.delay);

        let patient = policy.with_attempt_timeout(Duration::from_secs(1));
        assert_eq!(patient.attempt_timeout, Duration::from_secs(1));
        assert_eq!(patient.max_attempts, 1000);
    }
}
