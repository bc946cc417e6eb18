#![forbid(unsafe_code)]

use std::sync::Arc;

use futures::StreamExt;
use krait_auth::{CredentialCache, StaticTokenSource};
use krait_client::testkit::FakeTransport;
use krait_client::Client;
use krait_core::resource::registry;
use krait_core::kinds::Pod;
use krait_core::{
    ApiErrorKind, Error, GetOptions, ListOptions, RequestBuilder, WatchEvent, WatchOptions,
};
use serde_json::json;

fn pods() -> RequestBuilder {
    RequestBuilder::new(&registry::POD)
}

#[tokio::test]
async fn authorization_is_injected_by_the_client_not_the_transport() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({"metadata": {"name": "web-0"}}));
    let credentials = CredentialCache::new(StaticTokenSource::new("sekret"));
    let client =
        Client::with_transport_and_credentials(transport.clone(), credentials, "default");

    let request = pods().get("web-0", Some("default"), &GetOptions::default()).unwrap();
    // The builder never sets Authorization itself.
    assert!(!request.headers.iter().any(|(k, _)| *k == "Authorization"));
    let _: Pod = client.request_json(request).await.unwrap();

    let seen = transport.recorded();
    assert_eq!(seen.len(), 1);
    let auth = seen[0]
        .headers
        .iter()
        .find(|(k, _)| *k == "Authorization")
        .map(|(_, v)| v.as_str());
    assert_eq!(auth, Some("Bearer sekret"));
}

#[tokio::test]
async fn non_2xx_responses_are_classified_before_the_caller_sees_them() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(
        404,
        json!({"kind": "Status", "status": "Failure", "reason": "NotFound", "code": 404}),
    );
    let client = Client::with_transport(transport, "default");

    let request = pods().get("gone", Some("default"), &GetOptions::default()).unwrap();
    let err = client.request_json::<Pod>(request).await.unwrap_err();
    match err {
        Error::Api(api) => {
            assert_eq!(api.kind, ApiErrorKind::NotFound);
            assert_eq!(api.status, 404);
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn credential_refresh_failure_aborts_the_request() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({}));
    let credentials = CredentialCache::new(StaticTokenSource::new(""));
    let client =
        Client::with_transport_and_credentials(transport.clone(), credentials, "default");

    let request = pods().list(None, &ListOptions::default()).unwrap();
    let err = client.request(request).await.unwrap_err();
    assert!(matches!(err, Error::CredentialRefresh(_)));
    // The transport never saw the request.
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn watch_yields_events_then_dies_on_the_first_malformed_line() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_lines([
        r#"{"type":"ADDED","object":{"metadata":{"name":"web-0"}}}"#,
        r#"{"type":"BOOKMARK","object":{"resourceVersion":"ignored","metadata":{"resourceVersion":"123"}}}"#,
        "not json at all",
        r#"{"type":"ADDED","object":{"metadata":{"name":"never-seen"}}}"#,
    ]);
    let client = Client::with_transport(transport, "default");

    let request = pods().watch(None, &WatchOptions::default(), None).unwrap();
    let mut stream = client.watch::<Pod>(request).await.unwrap();

    match stream.next().await.unwrap().unwrap() {
        WatchEvent::Added(pod) => assert_eq!(pod.metadata.name.as_deref(), Some("web-0")),
        other => panic!("expected Added, got {other:?}"),
    }
    match stream.next().await.unwrap().unwrap() {
        WatchEvent::Bookmark(b) => assert_eq!(b.metadata.resource_version, "123"),
        other => panic!("expected Bookmark, got {other:?}"),
    }
    assert!(matches!(stream.next().await.unwrap().unwrap_err(), Error::WatchDecode { .. }));
    // No further events after the decode error.
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn watch_ends_cleanly_when_the_transport_closes() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_lines([r#"{"type":"DELETED","object":{"metadata":{"name":"web-0"}}}"#]);
    let client = Client::with_transport(transport, "default");

    let request = pods().watch(None, &WatchOptions::default(), None).unwrap();
    let mut stream = client.watch::<Pod>(request).await.unwrap();
    assert!(matches!(stream.next().await.unwrap().unwrap(), WatchEvent::Deleted(_)));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn transport_errors_mid_stream_surface_and_close() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_stream(vec![
        Ok(r#"{"type":"ADDED","object":{"metadata":{"name":"web-0"}}}"#.into()),
        Err(Error::Transport("connection reset".into())),
    ]);
    let client = Client::with_transport(transport, "default");

    let request = pods().watch(None, &WatchOptions::default(), None).unwrap();
    let mut stream = client.watch::<Pod>(request).await.unwrap();
    assert!(stream.next().await.unwrap().is_ok());
    assert!(matches!(stream.next().await.unwrap().unwrap_err(), Error::Transport(_)));
    assert!(stream.next().await.is_none());
}
