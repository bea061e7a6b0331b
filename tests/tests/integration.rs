//! End-to-end tests: a real server bound on an ephemeral endpoint, driven
//! through a real gRPC client.

use std::time::{Duration, Instant};

use gantry_kernel::{Flow, HttpRequest, UpstreamResponse};
use gantry_plugins::{BearerAuthPlugin, JsonStampPlugin};
use gantry_server::{ServeConfig, ServerState};
use gantry_testing::{
    connect, connect_unix, spawn, spawn_tcp, EchoPlugin, PanickingPlugin, PassivePlugin,
    SlowPlugin,
};

fn sample_request(method: &str, url: &str) -> HttpRequest {
    HttpRequest::new(method, url).with_path("/x")
}

#[tokio::test]
async fn metadata_and_capabilities_are_idempotent_over_the_wire() {
    let mut server = spawn_tcp(EchoPlugin).await;
    server.wait_for_state(ServerState::Running).await;
    let mut client = connect(server.addr.unwrap()).await;

    let first = client.get_metadata(()).await.unwrap().into_inner();
    let second = client.get_metadata(()).await.unwrap().into_inner();
    assert_eq!(first, second);
    assert_eq!(first.name, "echo");

    let caps_a = client.get_capabilities(()).await.unwrap().into_inner();
    let caps_b = client.get_capabilities(()).await.unwrap().into_inner();
    assert_eq!(caps_a, caps_b);
    assert!(caps_a.declares(Flow::Request));
    assert!(!caps_a.declares(Flow::Response));

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_do_not_corrupt_each_other() {
    let mut server = spawn_tcp(EchoPlugin).await;
    server.wait_for_state(ServerState::Running).await;
    let client = connect(server.addr.unwrap()).await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let mut client = client.clone();
        handles.push(tokio::spawn(async move {
            let method = format!("METHOD-{i}");
            let url = format!("http://localhost/item/{i}");
            let decision = client
                .handle_request(sample_request(&method, &url))
                .await
                .unwrap()
                .into_inner();
            (i, method, url, decision)
        }));
    }

    for handle in handles {
        let (_, method, url, decision) = handle.await.unwrap();
        assert!(decision.r#continue);
        let modified = decision.modified_request.expect("echo rewrites the request");
        assert_eq!(
            modified.headers.get("X-Echo").map(String::as_str),
            Some(format!("{method} {url}").as_str())
        );
        assert_eq!(modified.method, method);
        assert_eq!(modified.url, url);
    }

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn passive_plugin_is_never_dispatched() {
    let mut server = spawn_tcp(PassivePlugin).await;
    server.wait_for_state(ServerState::Running).await;
    let mut client = connect(server.addr.unwrap()).await;

    let caps = client.get_capabilities(()).await.unwrap().into_inner();
    assert!(caps.flows.is_empty());

    let status = client
        .handle_request(sample_request("GET", "http://localhost/"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::FailedPrecondition);

    let status = client
        .handle_response(UpstreamResponse::new(200))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::FailedPrecondition);

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn request_only_plugin_rejects_the_response_flow() {
    let mut server = spawn_tcp(EchoPlugin).await;
    server.wait_for_state(ServerState::Running).await;
    let mut client = connect(server.addr.unwrap()).await;

    client
        .handle_request(sample_request("GET", "http://localhost/"))
        .await
        .unwrap();

    let status = client
        .handle_response(UpstreamResponse::new(200))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::FailedPrecondition);

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn execution_fault_is_distinguishable_from_rejection() {
    // A panicking handler surfaces as INTERNAL...
    let mut panicking = spawn_tcp(PanickingPlugin).await;
    panicking.wait_for_state(ServerState::Running).await;
    let mut client = connect(panicking.addr.unwrap()).await;

    let status = client
        .handle_request(sample_request("GET", "http://localhost/"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::Internal);

    // ...and the server keeps serving unrelated calls afterwards.
    let metadata = client.get_metadata(()).await;
    assert!(metadata.is_ok());

    panicking.shutdown.cancel();
    panicking.task.await.unwrap().unwrap();

    // A business rejection is an ordinary decision, not a status.
    let mut rejecting = spawn_tcp(BearerAuthPlugin::new("expected")).await;
    rejecting.wait_for_state(ServerState::Running).await;
    let mut client = connect(rejecting.addr.unwrap()).await;

    let decision = client
        .handle_request(
            sample_request("GET", "http://localhost/").with_header("Authorization", "Bearer no"),
        )
        .await
        .unwrap()
        .into_inner();
    assert!(!decision.r#continue);
    assert_eq!(decision.status_code, 401);

    rejecting.shutdown.cancel();
    rejecting.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn token_plugin_scenarios_over_the_wire() {
    let mut server = spawn_tcp(BearerAuthPlugin::new("secret-token-123")).await;
    server.wait_for_state(ServerState::Running).await;
    let mut client = connect(server.addr.unwrap()).await;

    let ok = client
        .handle_request(
            sample_request("GET", "http://localhost/private")
                .with_header("Authorization", "Bearer secret-token-123"),
        )
        .await
        .unwrap()
        .into_inner();
    assert!(ok.r#continue);

    let rejected = client
        .handle_request(
            sample_request("GET", "http://localhost/private")
                .with_header("Authorization", "Bearer wrong"),
        )
        .await
        .unwrap()
        .into_inner();
    assert!(!rejected.r#continue);
    assert_eq!(rejected.status_code, 401);
    assert_eq!(
        rejected.headers.get("WWW-Authenticate").map(String::as_str),
        Some("Bearer")
    );
    assert!(String::from_utf8(rejected.body.clone())
        .unwrap()
        .contains("error"));

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn transform_plugin_stamps_json_over_the_wire() {
    let mut server = spawn_tcp(JsonStampPlugin::new()).await;
    server.wait_for_state(ServerState::Running).await;
    let mut client = connect(server.addr.unwrap()).await;

    let stamped = client
        .handle_request(
            sample_request("POST", "http://localhost/items")
                .with_header("Content-Type", "application/json")
                .with_body(&br#"{"a":1}"#[..]),
        )
        .await
        .unwrap()
        .into_inner();
    assert!(stamped.r#continue);
    let modified = stamped.modified_request.expect("body must be rewritten");
    let value: serde_json::Value = serde_json::from_slice(&modified.body).unwrap();
    assert_eq!(value["a"], serde_json::json!(1));
    assert!(value["_metadata"].is_object());

    let rejected = client
        .handle_request(
            sample_request("POST", "http://localhost/items")
                .with_header("Content-Type", "application/json")
                .with_body(&b"{not json"[..]),
        )
        .await
        .unwrap()
        .into_inner();
    assert!(!rejected.r#continue);
    assert_eq!(rejected.status_code, 400);

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn drain_lets_in_flight_calls_finish_then_refuses_new_ones() {
    let config = ServeConfig::tcp("127.0.0.1:0").with_grace_period(Duration::from_secs(5));
    let mut server = spawn(SlowPlugin::new(Duration::from_millis(300)), config).await;
    server.wait_for_state(ServerState::Running).await;
    let addr = server.addr.unwrap();
    let mut client = connect(addr).await;

    // Pin a call in flight, then trigger the drain underneath it.
    let in_flight = tokio::spawn(async move {
        client
            .handle_request(sample_request("GET", "http://localhost/slow"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    server.shutdown.cancel();

    // The in-flight call completes within the grace period.
    let decision = in_flight.await.unwrap().unwrap().into_inner();
    assert!(decision.r#continue);

    server.wait_for_state(ServerState::Stopped).await;
    server.task.await.unwrap().unwrap();

    // The listener is gone: no new calls are accepted.
    let refused = tokio::net::TcpStream::connect(addr).await;
    assert!(refused.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn calls_exceeding_the_grace_period_are_aborted() {
    let config = ServeConfig::tcp("127.0.0.1:0").with_grace_period(Duration::from_millis(200));
    let mut server = spawn(SlowPlugin::new(Duration::from_secs(30)), config).await;
    server.wait_for_state(ServerState::Running).await;
    let mut client = connect(server.addr.unwrap()).await;

    let in_flight = tokio::spawn(async move {
        client
            .handle_request(sample_request("GET", "http://localhost/very-slow"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let draining_at = Instant::now();
    server.shutdown.cancel();

    // The serve task must give up at the grace boundary, not wait the full
    // 30 s handler out, and the stranded call must observably fail.
    server.task.await.unwrap().unwrap();
    assert!(draining_at.elapsed() < Duration::from_secs(5));
    assert!(in_flight.await.unwrap().is_err());
}

#[tokio::test]
async fn lifecycle_states_progress_in_order() {
    let mut server = spawn_tcp(EchoPlugin).await;

    server.wait_for_state(ServerState::Running).await;
    server.shutdown.cancel();
    server.wait_for_state(ServerState::Stopped).await;
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn unix_socket_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugin.sock");
    let config = ServeConfig::unix(path.to_str().unwrap());

    let mut server = spawn(EchoPlugin, config).await;
    server.wait_for_state(ServerState::Running).await;

    let mut client = connect_unix(path.clone()).await;
    let metadata = client.get_metadata(()).await.unwrap().into_inner();
    assert_eq!(metadata.name, "echo");

    let decision = client
        .handle_request(sample_request("GET", "http://localhost/uds"))
        .await
        .unwrap()
        .into_inner();
    assert!(decision.r#continue);

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();

    // The socket file is cleaned up on stop.
    assert!(!path.exists());
}
