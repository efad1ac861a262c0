use crate::{reference::RemoteFunctionRef, LOCAL_HOST};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, net::SocketAddr, time::Duration};

/// Where a service lives: its identifier and its fixed listening port.
///
/// Entries are usually declared as constants shared by the service and its
/// callers:
///
/// ```
/// use rpcref::ServiceEntry;
///
/// const CALCULATOR: ServiceEntry = ServiceEntry::new("calculator", 9000);
/// assert_eq!(CALCULATOR.addr().port(), 9000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: Cow<'static, str>,
    pub port: u16,
}

impl ServiceEntry {
    pub const fn new(name: &'static str, port: u16) -> Self {
        Self {
            name: Cow::Borrowed(name),
            port,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((LOCAL_HOST, self.port))
    }

    /// A reference to `func_name` on this service.
    ///
    /// Nothing checks that the function exists; prefer
    /// [`Service::reference`](crate::Service::reference) on the serving side.
    pub fn reference(&self, func_name: impl Into<String>) -> RemoteFunctionRef {
        RemoteFunctionRef::new(self.port, self.name.clone(), func_name)
    }
}

/// Polling policy for [`wait_startup`](crate::wait_startup).
///
/// Attempts start `delay` apart and each is cut off after `attempt_timeout`,
/// so the whole wait is bounded by `max_attempts * max(delay, attempt_timeout)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// How long one `ping` may take before the attempt counts as failed.
    pub attempt_timeout: Duration,
}

impl WaitPolicy {
    /// A policy whose per-attempt timeout equals `delay`.
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            attempt_timeout: delay,
        }
    }

    pub const fn with_attempt_timeout(self, attempt_timeout: Duration) -> Self {
        Self {
            attempt_timeout,
            ..self
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(1000, Duration::from_millis(10))
    }
}
