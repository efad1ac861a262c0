use rpcref::{Service, ServiceEntry};
use tokio::{net::TcpListener, task};

/// Builds a service on an ephemeral local port and starts serving it.
pub async fn spawn_service(name: &'static str, build: impl FnOnce(&mut Service)) -> ServiceEntry {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let entry = ServiceEntry::new(name, listener.local_addr().unwrap().port());
    let mut service = Service::new(entry.clone());
    build(&mut service);
    task::spawn(service.serve_on(listener));
    entry
}

/// A port nothing listens on.
pub async fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
