mod common;

use common::{dead_port, spawn_service};
use rpcref::{CallError, CallStub, RemoteFunctionRef, Service, TransportError, WaitPolicy};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

const QUICK: WaitPolicy = WaitPolicy::new(50, Duration::from_millis(10));

/// A service that calls back whatever reference it is handed.
fn notifier(service: &mut Service) {
    service
        .register(
            "notify",
            |callback: RemoteFunctionRef, message: String| async move {
                let stub = CallStub::new();
                callback
                    .invoke::<_, _, usize>(&stub, (message,))
                    .await
                    .map_err(|e| e.to_string())
            },
        )
        .unwrap();
}

#[tokio::test]
async fn a_service_calls_back_through_a_reference() {
    let received = Arc::new(Mutex::new(Vec::<String>::new()));
    let inbox = received.clone();
    let app = spawn_service("app", move |service| {
        service
            .register("on_message", move |message: String| {
                let inbox = inbox.clone();
                async move {
                    let mut inbox = inbox.lock().unwrap();
                    inbox.push(message);
                    inbox.len()
                }
            })
            .unwrap();
    })
    .await;
    let notifier = spawn_service("notifier", notifier).await;

    let stub = CallStub::new();
    assert!(app.wait_startup(&stub, QUICK).await);
    assert!(notifier.wait_startup(&stub, QUICK).await);

    let callback = app.reference("on_message");
    for (n, message) in ["hello", "again"].into_iter().enumerate() {
        let seen: usize = stub
            .call(notifier.addr(), "notify", (callback.clone(), message))
            .await
            .unwrap();
        assert_eq!(seen, n + 1);
    }
    assert_eq!(*received.lock().unwrap(), ["hello", "again"]);
}

#[tokio::test]
async fn invoking_a_reference_matches_a_direct_call() {
    let calc = spawn_service("calc", |service| {
        service
            .register("add", |a: i64, b: i64| async move { a + b })
            .unwrap();
    })
    .await;
    let stub = CallStub::new();
    assert!(calc.wait_startup(&stub, QUICK).await);

    let reference = RemoteFunctionRef::new(calc.port, "calc", "add");
    let via_reference: i64 = reference.invoke(&stub, (20, 22)).await.unwrap();
    let direct: i64 = stub.call(calc.addr(), "add", (20, 22)).await.unwrap();
    assert_eq!(via_reference, direct);
}

#[tokio::test]
async fn reference_to_a_down_service_fails_in_transport() {
    let reference = RemoteFunctionRef::new(dead_port().await, "gone", "add");
    let err = reference
        .invoke::<_, _, i64>(&CallStub::new(), (1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::Transport(TransportError::Io(_))), "{err}");
}

#[tokio::test]
async fn callback_failure_is_reported_by_the_caller() {
    let notifier = spawn_service("notifier", notifier).await;
    let stub = CallStub::new();
    assert!(notifier.wait_startup(&stub, QUICK).await);

    let dangling = RemoteFunctionRef::new(dead_port().await, "gone", "on_message");
    let err = stub
        .call::<_, usize>(notifier.addr(), "notify", (dangling, "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::RemoteExecution(_)), "{err}");
}
