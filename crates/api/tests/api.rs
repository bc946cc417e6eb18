#![forbid(unsafe_code)]

use std::sync::Arc;

use krait_api::Api;
use krait_client::testkit::FakeTransport;
use krait_client::Client;
use krait_core::kinds::{Deployment, Namespace, Pod};
use krait_core::{
    DeleteOptions, DeleteResult, Error, ListOptions, LogOptions, Method, Patch, PatchOptions,
};
use serde_json::json;

fn client(transport: &Arc<FakeTransport>) -> Client {
    Client::with_transport(transport.clone(), "default")
}

#[tokio::test]
async fn get_addresses_the_object_path() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({"metadata": {"name": "web-0", "namespace": "prod"}}));
    let api: Api<Pod> = Api::namespaced(client(&transport), "prod");

    let pod = api.get("web-0").await.unwrap();
    assert_eq!(pod.metadata.name.as_deref(), Some("web-0"));

    let seen = transport.recorded();
    assert_eq!(seen[0].method, Method::Get);
    assert_eq!(seen[0].path, "/api/v1/namespaces/prod/pods/web-0");
}

#[tokio::test]
async fn namespace_violations_never_reach_the_transport() {
    let transport = Arc::new(FakeTransport::new());
    let api: Api<Pod> = Api::all(client(&transport));
    assert!(matches!(api.get("web-0").await.unwrap_err(), Error::NamespaceRequired { .. }));

    let api: Api<Namespace> = Api::namespaced(client(&transport), "nope");
    assert!(matches!(
        api.list(&ListOptions::default()).await.unwrap_err(),
        Error::NamespaceNotAllowed { .. }
    ));
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn default_namespaced_uses_the_client_configuration() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({"items": [], "metadata": {}}));
    let api: Api<Pod> = Api::default_namespaced(client(&transport));
    assert_eq!(api.namespace(), Some("default"));
    api.list(&ListOptions::default()).await.unwrap();
    assert_eq!(transport.recorded()[0].path, "/api/v1/namespaces/default/pods");
}

#[tokio::test]
async fn create_posts_the_serialized_object() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(201, json!({"metadata": {"name": "cm"}}));
    let api: Api<krait_core::kinds::ConfigMap> = Api::namespaced(client(&transport), "ns");

    let mut object = krait_core::kinds::ConfigMap::default();
    object.metadata.name = Some("cm".into());
    api.create(&object).await.unwrap();

    let seen = transport.recorded();
    assert_eq!(seen[0].method, Method::Post);
    assert_eq!(seen[0].path, "/api/v1/namespaces/ns/configmaps");
    let body: serde_json::Value = serde_json::from_slice(seen[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["metadata"]["name"], "cm");
}

#[tokio::test]
async fn delete_surfaces_both_result_arms() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({"kind": "Status", "status": "Success", "code": 200}));
    transport.push_json(200, json!({"kind": "Pod", "metadata": {"name": "web-0"}}));
    let api: Api<Pod> = Api::namespaced(client(&transport), "ns");

    match api.delete("web-0", &DeleteOptions::default()).await.unwrap() {
        DeleteResult::Status(status) => assert_eq!(status.status.as_deref(), Some("Success")),
        DeleteResult::Resource(pod) => panic!("expected status, got {pod:?}"),
    }
    match api.delete("web-0", &DeleteOptions::default()).await.unwrap() {
        DeleteResult::Resource(pod) => assert_eq!(pod.metadata.name.as_deref(), Some("web-0")),
        DeleteResult::Status(status) => panic!("expected resource, got {status:?}"),
    }
}

#[tokio::test]
async fn patch_carries_the_negotiated_content_type() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({"metadata": {"name": "web"}}));
    let api: Api<Deployment> = Api::namespaced(client(&transport), "ns");

    let patch = Patch::Merge(json!({"spec": {"replicas": 3}}));
    api.patch("web", &PatchOptions::default(), &patch).await.unwrap();

    let seen = transport.recorded();
    assert_eq!(seen[0].method, Method::Patch);
    let content_type = seen[0]
        .headers
        .iter()
        .find(|(k, _)| *k == "Content-Type")
        .map(|(_, v)| v.as_str());
    assert_eq!(content_type, Some("application/merge-patch+json"));
}

#[tokio::test]
async fn apply_patch_goes_out_as_yaml() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({"metadata": {"name": "web"}}));
    let api: Api<Deployment> = Api::namespaced(client(&transport), "ns");

    let patch = Patch::Apply(json!({"apiVersion": "apps/v1", "kind": "Deployment"}));
    api.patch("web", &PatchOptions::apply("krait"), &patch).await.unwrap();

    let seen = transport.recorded();
    let content_type = seen[0]
        .headers
        .iter()
        .find(|(k, _)| *k == "Content-Type")
        .map(|(_, v)| v.as_str());
    assert_eq!(content_type, Some("application/apply-patch+yaml"));
    assert!(seen[0].query.iter().any(|(k, v)| k == "fieldManager" && v == "krait"));
}

#[tokio::test]
async fn logs_and_scale_are_capability_gated_paths() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_response(200, "line one\nline two\n");
    let pods: Api<Pod> = Api::namespaced(client(&transport), "ns");
    let text = pods.logs("web-0", &LogOptions::default()).await.unwrap();
    assert!(text.contains("line one"));
    assert_eq!(transport.recorded()[0].path, "/api/v1/namespaces/ns/pods/web-0/log");

    let transport = Arc::new(FakeTransport::new());
    transport.push_json(200, json!({"metadata": {"name": "web"}, "spec": {"replicas": 2}}));
    let deployments: Api<Deployment> = Api::namespaced(client(&transport), "ns");
    let scale = deployments.scale("web").await.unwrap();
    assert_eq!(scale.spec.map(|s| s.replicas), Some(2));
    assert_eq!(
        transport.recorded()[0].path,
        "/apis/apps/v1/namespaces/ns/deployments/web/scale"
    );
}

#[tokio::test]
async fn streamed_logs_force_follow() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_lines(["one", "two"]);
    let pods: Api<Pod> = Api::namespaced(client(&transport), "ns");

    let mut lines = pods.stream_logs("web-0", &LogOptions::default()).await.unwrap();
    use futures::StreamExt;
    assert_eq!(lines.next().await.unwrap().unwrap(), "one");

    let seen = transport.recorded();
    assert!(seen[0].query.iter().any(|(k, v)| k == "follow" && v == "true"));
}

#[tokio::test]
async fn metadata_list_decodes_partial_objects() {
    let transport = Arc::new(FakeTransport::new());
    transport.push_json(
        200,
        json!({
            "kind": "PartialObjectMetadataList",
            "metadata": {"resourceVersion": "9"},
            "items": [
                {"kind": "PartialObjectMetadata", "metadata": {"name": "web-0", "namespace": "ns"}}
            ]
        }),
    );
    let api: Api<Pod> = Api::all(client(&transport));
    let list = api.list_metadata(&ListOptions::default()).await.unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].metadata.name.as_deref(), Some("web-0"));

    let seen = transport.recorded();
    assert!(seen[0]
        .headers
        .iter()
        .any(|(k, v)| *k == "Content-Type" && v.contains("PartialObjectMetadataList")));
}
