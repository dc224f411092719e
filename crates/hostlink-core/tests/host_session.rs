//! Socket-level tests of the host client against a scripted mock host.

use std::time::Duration;

use hostlink_core::{Command, ErrorKind, Framing, HostTransport};
use hostlink_test_utils::{MockHost, Reply};
use pretty_assertions::assert_eq;
use serde_json::json;

fn command(name: &str) -> Command {
    Command::bare(name).unwrap()
}

// ── Framing and reassembly ────────────────────────────────────────

#[test_log::test(tokio::test)]
async fn test_round_trip_nul_framing() {
    let host = MockHost::builder()
        .on("get_widget_tree", Reply::success(json!({"widgets": ["Root"]})))
        .start()
        .await;

    let cmd = command("get_widget_tree").with_param("asset_path", "/Game/A");
    let resp = host.client().call(&cmd).await;

    assert_eq!(resp.payload(), Some(&json!({"widgets": ["Root"]})));
    assert_eq!(host.received(), vec![cmd]);
}

#[test_log::test(tokio::test)]
async fn test_terminator_split_across_reads() {
    let host = MockHost::builder()
        .framing(Framing::TextSentinel)
        .on(
            "get_layout_data",
            Reply::Chunked(
                vec![
                    br#"{"status":"success","result":{"n":1}}__MC"#.to_vec(),
                    b"P_END__".to_vec(),
                ],
                Duration::from_millis(50),
            ),
        )
        .start()
        .await;

    let resp = host.client().call(&command("get_layout_data")).await;
    assert_eq!(resp.payload(), Some(&json!({"n": 1})));
}

#[tokio::test]
async fn test_reply_in_many_small_chunks() {
    let body = br#"{"status":"success","result":{"text":"hello world"}}"#;
    let mut parts: Vec<Vec<u8>> = body.chunks(7).map(<[u8]>::to_vec).collect();
    parts.push(vec![0]);
    let host = MockHost::builder()
        .otherwise(Reply::Chunked(parts, Duration::from_millis(5)))
        .start()
        .await;

    let resp = host.client().call(&command("get_widget_tree")).await;
    assert_eq!(resp.payload(), Some(&json!({"text": "hello world"})));
}

#[tokio::test]
async fn test_half_close_framing() {
    let host = MockHost::builder()
        .framing(Framing::HalfClose)
        .on("save_asset", Reply::success(json!({"saved": true})))
        .start()
        .await;

    let cmd = command("save_asset").with_param("asset_path", "/Game/A");
    let resp = host.client().call(&cmd).await;

    assert_eq!(resp.payload(), Some(&json!({"saved": true})));
    assert_eq!(host.commands(), vec!["save_asset"]);
}

#[tokio::test]
async fn test_unterminated_reply_parsed_at_eof() {
    let host = MockHost::builder()
        .otherwise(Reply::Raw(br#"{"status":"success","result":{"ok":1}}"#.to_vec()))
        .start()
        .await;

    let resp = host.client().call(&command("get_widget_tree")).await;
    assert_eq!(resp.payload(), Some(&json!({"ok": 1})));
}

#[tokio::test]
async fn test_session_bound_serialises_calls() {
    let hold = Duration::from_millis(300);
    let host = MockHost::builder()
        .otherwise(Reply::Chunked(
            vec![br#"{"status":"success","result":{}}"#.to_vec(), vec![0]],
            hold,
        ))
        .start()
        .await;
    let client = host.client().with_max_sessions(1);

    let started = tokio::time::Instant::now();
    let timed = |name: &'static str| {
        let client = &client;
        async move {
            let resp = client.call(&command(name)).await;
            (resp, started.elapsed())
        }
    };
    let ((first, a), (second, b)) = tokio::join!(timed("get_widget_tree"), timed("get_layout_data"));

    assert!(first.is_success() && second.is_success());
    // The later call waits for the earlier session to close.
    assert!(a.max(b) >= hold * 2 - Duration::from_millis(50), "{a:?} / {b:?}");
    assert_eq!(host.commands().len(), 2);
}

// ── Transport failures ────────────────────────────────────────────

#[test_log::test(tokio::test)]
async fn test_silent_host_times_out() {
    let host = MockHost::builder().otherwise(Reply::Silent).start().await;

    let started = tokio::time::Instant::now();
    let resp = host.client().call(&command("get_widget_tree")).await;

    assert_eq!(resp.error_kind(), Some(ErrorKind::ReceiveTimeout));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_host_closes_without_reply() {
    let host = MockHost::builder().otherwise(Reply::Close).start().await;

    let resp = host.client().call(&command("get_widget_tree")).await;
    assert_eq!(resp.error_kind(), Some(ErrorKind::ReceiveEmpty));
}

#[tokio::test]
async fn test_nothing_listening() {
    let port = {
        let host = MockHost::start().await;
        host.port()
    };
    // Give the aborted accept loop a moment to release the socket.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = hostlink_core::HostClient::new(format!("127.0.0.1:{port}"));
    let resp = client.call(&command("get_widget_tree")).await;
    assert_eq!(resp.error_kind(), Some(ErrorKind::ConnectFailed));
}

#[tokio::test]
async fn test_garbage_reply_is_decode_failure() {
    let host = MockHost::builder()
        .otherwise(Reply::Raw(b"not json at all\0".to_vec()))
        .start()
        .await;

    let resp = host.client().call(&command("get_widget_tree")).await;
    assert_eq!(resp.error_kind(), Some(ErrorKind::DecodeFailed));
}

// ── Normalisation of host shapes ──────────────────────────────────

#[tokio::test]
async fn test_success_flag_failure_normalised() {
    let host = MockHost::builder()
        .otherwise(Reply::Json(json!({"success": false, "message": "X"})))
        .start()
        .await;

    let resp = host.client().call(&command("delete_widget")).await;
    assert_eq!(resp.to_value(), json!({"outcome": "error", "reason": "X"}));
    assert_eq!(resp.error_kind(), Some(ErrorKind::HostReportedFailure));
}

#[tokio::test]
async fn test_status_error_normalised() {
    let host = MockHost::builder()
        .otherwise(Reply::error("Widget 'Ok' not found"))
        .start()
        .await;

    let resp = host.client().call(&command("delete_widget")).await;
    assert_eq!(
        resp.to_value(),
        json!({"outcome": "error", "reason": "Widget 'Ok' not found"})
    );
}

#[tokio::test]
async fn test_nested_result_failure_normalised() {
    let host = MockHost::builder()
        .otherwise(Reply::success(json!({"success": false, "error": "Parent is not a panel"})))
        .start()
        .await;

    let resp = host.client().call(&command("reparent_widget")).await;
    assert_eq!(resp.reason(), Some("Parent is not a panel"));
}

#[tokio::test]
async fn test_wrapped_error_status_normalised() {
    let host = MockHost::builder()
        .on(
            "create_widget",
            Reply::success(json!({"status": "error", "error": "Target widget blueprint not found"})),
        )
        .start()
        .await;

    let resp = host.client().call(&command("create_widget")).await;
    assert!(!resp.is_success());
    assert_eq!(resp.reason(), Some("Target widget blueprint not found"));
}

#[tokio::test]
async fn test_transport_trait_object() {
    let host = MockHost::start().await;
    let client = host.client();
    let transport: &dyn HostTransport = &client;

    let resp = transport.send(&command("get_creatable_widget_types")).await;
    assert!(resp.is_success());
}
