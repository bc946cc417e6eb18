#![forbid(unsafe_code)]

use krait_core::kinds::Pod;
use krait_core::{DeleteResult, Error, WatchEvent};

#[test]
fn decodes_typed_events() {
    let line = r#"{"type":"ADDED","object":{"metadata":{"name":"web-0","namespace":"ns","resourceVersion":"7"}}}"#;
    match WatchEvent::<Pod>::decode_line(line).unwrap() {
        WatchEvent::Added(pod) => {
            assert_eq!(pod.metadata.name.as_deref(), Some("web-0"));
            assert_eq!(pod.metadata.resource_version.as_deref(), Some("7"));
        }
        other => panic!("expected Added, got {other:?}"),
    }

    let line = r#"{"type":"DELETED","object":{"metadata":{"name":"web-0"}}}"#;
    assert!(matches!(WatchEvent::<Pod>::decode_line(line).unwrap(), WatchEvent::Deleted(_)));
}

#[test]
fn bookmark_carries_only_the_resource_version() {
    let line = r#"{"type":"BOOKMARK","object":{"kind":"Pod","metadata":{"resourceVersion":"123"}}}"#;
    match WatchEvent::<Pod>::decode_line(line).unwrap() {
        WatchEvent::Bookmark(bookmark) => {
            assert_eq!(bookmark.metadata.resource_version, "123");
        }
        other => panic!("expected Bookmark, got {other:?}"),
    }

    // Some servers emit the version bare on the object.
    let line = r#"{"type":"BOOKMARK","object":{"resourceVersion":"123"}}"#;
    match WatchEvent::<Pod>::decode_line(line).unwrap() {
        WatchEvent::Bookmark(bookmark) => {
            assert_eq!(bookmark.metadata.resource_version, "123");
        }
        other => panic!("expected Bookmark, got {other:?}"),
    }
}

#[test]
fn malformed_lines_are_decode_errors() {
    assert!(matches!(
        WatchEvent::<Pod>::decode_line("not json").unwrap_err(),
        Error::WatchDecode { .. }
    ));
    // Unknown event types end the stream too.
    assert!(matches!(
        WatchEvent::<Pod>::decode_line(r#"{"type":"EXPLODED","object":{}}"#).unwrap_err(),
        Error::WatchDecode { .. }
    ));
    // A bookmark without a resourceVersion is malformed.
    assert!(matches!(
        WatchEvent::<Pod>::decode_line(r#"{"type":"BOOKMARK","object":{"metadata":{}}}"#)
            .unwrap_err(),
        Error::WatchDecode { .. }
    ));
}

#[test]
fn delete_result_decodes_both_arms() {
    let status = br#"{"kind":"Status","status":"Success","code":200}"#;
    assert!(matches!(
        DeleteResult::<Pod>::from_body(status).unwrap(),
        DeleteResult::Status(_)
    ));

    let pod = br#"{"kind":"Pod","metadata":{"name":"web-0","namespace":"ns"}}"#;
    match DeleteResult::<Pod>::from_body(pod).unwrap() {
        DeleteResult::Resource(pod) => assert_eq!(pod.metadata.name.as_deref(), Some("web-0")),
        DeleteResult::Status(status) => panic!("expected resource, got status {status:?}"),
    }
}
