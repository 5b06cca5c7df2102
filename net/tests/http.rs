//! HTTP transport against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ferry_engine::event_channel;
use ferry_net::{HttpRequest, HttpSettings, HttpTransport, NetworkBridge, Transport, TransportResult};
use ferry_types::{ConsumerEvent, RequestHandle, RequestOutcome};

fn transport() -> HttpTransport {
    HttpTransport::with_settings(&HttpSettings::default(), Handle::current()).unwrap()
}

async fn run(transport: &HttpTransport, request: HttpRequest) -> TransportResult {
    let (tx, rx) = oneshot::channel();
    transport
        .start(
            request,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        )
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tiles/1/2/3.mvt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tile-bytes".to_vec()))
        .mount(&server)
        .await;

    let result = run(
        &transport(),
        HttpRequest::get(format!("{}/tiles/1/2/3.mvt", server.uri())),
    )
    .await;

    assert_eq!(
        result,
        TransportResult::Response {
            status: 200,
            body: b"tile-bytes".to_vec()
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_sends_payload_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-api-key", "abc"))
        .and(body_bytes(b"q=cafe".to_vec()))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let request = HttpRequest::post(format!("{}/search", server.uri()), b"q=cafe".to_vec())
        .with_header_block("X-Api-Key: abc\r\n");
    let result = run(&transport(), request).await;

    assert!(matches!(result, TransportResult::Response { status: 201, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let result = run(
        &transport(),
        HttpRequest::get(format!("{}/missing", server.uri())),
    )
    .await;

    assert_eq!(
        result,
        TransportResult::Response {
            status: 404,
            body: Vec::new()
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_refused_is_failure() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let result = run(&transport(), HttpRequest::get(format!("http://{addr}/x"))).await;
    assert!(matches!(result, TransportResult::Failed(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_timeout_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let settings = HttpSettings {
        request_timeout: Duration::from_millis(200),
        ..HttpSettings::default()
    };
    let transport = HttpTransport::with_settings(&settings, Handle::current()).unwrap();
    let result = run(&transport, HttpRequest::get(server.uri())).await;
    assert!(matches!(result, TransportResult::Failed(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_aborts_inflight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = transport();
    let (tx, rx) = oneshot::channel();
    let token = transport
        .start(
            HttpRequest::get(server.uri()),
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        )
        .unwrap();
    assert_eq!(transport.in_flight(), 1);

    transport.cancel(&token);
    let result = tokio::time::timeout(Duration::from_secs(2), rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result, TransportResult::Cancelled);
    assert_eq!(transport.in_flight(), 0);
}

// ── Through the bridge ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_bridge_delivers_keyed_events() {
    let server = MockServer::start().await;
    for (route, status) in [("/ok", 200u16), ("/gone", 410u16)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string("body"))
            .mount(&server)
            .await;
    }

    let (sink, mut pump) = event_channel();
    let bridge = NetworkBridge::new(transport(), Arc::new(sink));
    let gone_url = format!("{}/gone", server.uri());
    bridge
        .start(RequestHandle::new(1), HttpRequest::get(format!("{}/ok", server.uri())))
        .unwrap();
    bridge
        .start(RequestHandle::new(2), HttpRequest::get(gone_url.clone()))
        .unwrap();

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let event = tokio::time::timeout(Duration::from_secs(5), pump.next())
            .await
            .unwrap()
            .unwrap();
        match event {
            ConsumerEvent::RequestComplete { handle, outcome } => outcomes.push((handle, outcome)),
            other => panic!("unexpected event {}", other.name()),
        }
    }
    outcomes.sort_by_key(|(handle, _)| *handle);

    assert_eq!(
        outcomes,
        vec![
            (RequestHandle::new(1), RequestOutcome::Success(b"body".to_vec())),
            (
                RequestHandle::new(2),
                RequestOutcome::unexpected_status(410, &gone_url)
            ),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bridge_cancel_emits_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let (sink, mut pump) = event_channel();
    let bridge = NetworkBridge::new(transport(), Arc::new(sink));
    bridge
        .start(RequestHandle::new(42), HttpRequest::get(server.uri()))
        .unwrap();
    bridge.cancel(RequestHandle::new(42));

    // The aborted task still runs its callback, which claims the entry.
    tokio::time::timeout(Duration::from_secs(2), async {
        while bridge.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(bridge.transport().in_flight(), 0);
    assert!(pump.try_next().is_none());
}
