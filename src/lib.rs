//! A small typed RPC layer.
//!
//! A [`Service`] binds async functions under names; a [`CallStub`] invokes them
//! from another process with statically typed arguments and results. Every
//! service answers `ping`, which [`wait_startup`] polls to order startup, and a
//! [`RemoteFunctionRef`] lets a service hand one of its own functions to
//! another service as a callback.
//!
//! ```no_run
//! use rpcref::{CallStub, Service, ServiceEntry, WaitPolicy};
//!
//! const CALCULATOR: ServiceEntry = ServiceEntry::new("calculator", 9000);
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut service = Service::new(CALCULATOR);
//! service.register("add", |a: i64, b: i64| async move { a + b })?;
//! tokio::spawn(service.serve());
//!
//! let stub = CallStub::new();
//! assert!(CALCULATOR.wait_startup(&stub, WaitPolicy::default()).await);
//! let sum: i64 = stub.call(CALCULATOR.addr(), "add", (2, 3)).await?;
//! assert_eq!(sum, 5);
//! # Ok(())
//! # }
//! ```

mod args;
mod config;
mod dispatcher;
mod handler;
mod health;
pub mod net;
mod reference;
mod service;
mod stub;
pub mod types;

use std::net::Ipv4Addr;

/// Host every service is reached on.
pub const LOCAL_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

pub use args::{DecodeError, FromArgs, IntoArgs};
pub use config::{ServiceEntry, WaitPolicy};
pub use dispatcher::RegisterError;
pub use handler::{Handler, Outcome, RpcFunction, Signature, TypedHandler};
pub use health::wait_startup;
pub use net::{client::TcpTransport, Request, Response, Status, Transport, TransportError};
pub use reference::RemoteFunctionRef;
pub use service::{Service, PING};
pub use stub::{CallError, CallStub};
pub use types::{Decode, Encode, Number, Type, TypeMismatch, Typed, Value};
