//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML operation → paged HTTP requests →
//! projected values in a sink

use pagewalk::config::load_operation_from_str;
use pagewalk::operation::{HttpListOperation, ListRequest};
use pagewalk::output::{ChannelSink, CollectSink, OutputFormat, WriterSink};
use pagewalk::pagination::{run_paginated, PaginationOptions, StopReason};
use pagewalk::selector::Selector;
use pagewalk::{Error, OperationConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::num::NonZeroU32;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn get_operation(server: &MockServer) -> OperationConfig {
    load_operation_from_str(&format!(
        r"
name: ListWorkGroups
base_url: {}
path: /workgroups
token:
  request_field: NextToken
page_size:
  request_field: MaxResults
  max: 50
result_path: WorkGroups
http:
  max_retries: 0
",
        server.uri()
    ))
    .unwrap()
}

fn post_operation(server: &MockServer) -> OperationConfig {
    load_operation_from_str(&format!(
        r"
name: ListCalculationExecutions
base_url: {}
path: /sessions/{{{{ SessionId }}}}/calculations
method: POST
token:
  request_field: NextToken
  response_path: meta.next
page_size:
  request_field: MaxResults
result_path: Calculations
http:
  max_retries: 0
",
        server.uri()
    ))
    .unwrap()
}

async fn mount_three_workgroup_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/workgroups"))
        .and(query_param_is_missing("NextToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WorkGroups": ["a", "b"],
            "NextToken": "T1"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/workgroups"))
        .and(query_param("NextToken", "T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WorkGroups": ["c"],
            "NextToken": "T2"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/workgroups"))
        .and(query_param("NextToken", "T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WorkGroups": ["d"],
            "NextToken": ""
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Auto-iteration
// ============================================================================

#[tokio::test]
async fn test_fetches_all_pages_with_result_path() {
    let server = MockServer::start().await;
    mount_three_workgroup_pages(&server).await;

    let config = get_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let summary = assert_ok!(
        run_paginated(
            &operation,
            config.new_request(),
            PaginationOptions::new(),
            &config.default_selector().unwrap(),
            &mut sink,
            None,
        )
        .await
    );

    assert_eq!(
        sink.into_values(),
        vec![json!(["a", "b"]), json!(["c"]), json!(["d"])]
    );
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.stop_reason, StopReason::Exhausted);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_single_page_reports_resume_token() {
    let server = MockServer::start().await;
    mount_three_workgroup_pages(&server).await;

    let config = get_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let summary = run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new().no_auto_iteration(),
        &Selector::parse("*").unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        sink.into_values(),
        vec![json!({"WorkGroups": ["a", "b"], "NextToken": "T1"})]
    );
    assert_eq!(summary.next_token.as_deref(), Some("T1"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_manual_paging_from_caller_token() {
    let server = MockServer::start().await;
    mount_three_workgroup_pages(&server).await;

    let config = get_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let summary = run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new().starting_at("T1"),
        &config.default_selector().unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap();

    assert_eq!(sink.into_values(), vec![json!(["c"])]);
    assert_eq!(summary.next_token.as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_page_size_hint_sent_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/workgroups"))
        .and(query_param("MaxResults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"WorkGroups": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let size = config.check_page_size(5).unwrap();
    let mut sink = CollectSink::new();

    run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new().with_page_size(size),
        &config.default_selector().unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap();

    assert_eq!(sink.into_values(), vec![json!([])]);
}

#[tokio::test]
async fn test_page_size_over_limit_is_rejected() {
    let server = MockServer::start().await;
    let config = get_operation(&server);

    let err = assert_err!(config.check_page_size(500));
    assert!(err.is_validation());
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// POST bodies, nested tokens and echo
// ============================================================================

async fn mount_calculation_pages(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sessions/s-1/calculations"))
        .and(body_partial_json(json!({"MaxResults": 2, "NextToken": "p2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Calculations": [{"Id": "c-3"}],
            "meta": {"next": null}
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sessions/s-1/calculations"))
        .and(body_partial_json(json!({"MaxResults": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Calculations": [{"Id": "c-1"}, {"Id": "c-2"}],
            "meta": {"next": "p2"}
        })))
        .mount(server)
        .await;
}

fn calculation_request(config: &OperationConfig) -> ListRequest {
    config.new_request().with_field("SessionId", "s-1")
}

#[tokio::test]
async fn test_post_operation_with_jsonpath_selector() {
    let server = MockServer::start().await;
    mount_calculation_pages(&server).await;

    let config = post_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let summary = run_paginated(
        &operation,
        calculation_request(&config),
        PaginationOptions::new().with_page_size(NonZeroU32::new(2).unwrap()),
        &Selector::parse("$.Calculations[*].Id").unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        sink.into_values(),
        vec![json!(["c-1", "c-2"]), json!(["c-3"])]
    );
    assert_eq!(summary.pages, 2);

    // The path field is substituted into the URL, not sent in the body.
    let requests = server.received_requests().await.unwrap();
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first, json!({"MaxResults": 2}));
}

#[tokio::test]
async fn test_parameter_echo_after_all_pages() {
    let server = MockServer::start().await;
    mount_calculation_pages(&server).await;

    let config = post_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let summary = run_paginated(
        &operation,
        calculation_request(&config),
        PaginationOptions::new().with_page_size(NonZeroU32::new(2).unwrap()),
        &Selector::parse("^SessionId").unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap();

    assert_eq!(sink.into_values(), vec![json!("s-1")]);
    assert_eq!(summary.pages, 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_echo_parameter_makes_no_calls() {
    let server = MockServer::start().await;
    mount_calculation_pages(&server).await;

    let config = post_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let err = run_paginated(
        &operation,
        calculation_request(&config),
        PaginationOptions::new(),
        &Selector::parse("^WorkGroup").unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::UnknownParameter { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_path_field_makes_no_calls() {
    let server = MockServer::start().await;
    mount_calculation_pages(&server).await;

    let config = post_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let err = run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new(),
        &config.default_selector().unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::UndefinedVariable { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(sink.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_failure_mid_run_keeps_earlier_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/workgroups"))
        .and(query_param_is_missing("NextToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WorkGroups": ["a"],
            "NextToken": "T1"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/workgroups"))
        .and(query_param("NextToken", "T1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("InvalidRequestException"))
        .mount(&server)
        .await;

    let config = get_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let err = run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new(),
        &config.default_selector().unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap_err();

    assert_eq!(sink.into_values(), vec![json!(["a"])]);
    let message = err.to_string();
    assert!(message.contains("ListWorkGroups"));
    assert!(message.contains("page 2"));
    assert!(message.contains("InvalidRequestException"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let config = load_operation_from_str(
        r"
name: ListWorkGroups
base_url: http://127.0.0.1:1
path: /workgroups
token:
  request_field: NextToken
http:
  max_retries: 0
",
    )
    .unwrap();
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = CollectSink::new();

    let err = run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new(),
        &Selector::default(),
        &mut sink,
        None,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("Unable to reach"));
    assert!(sink.is_empty());
}

// ============================================================================
// Sinks
// ============================================================================

#[tokio::test]
async fn test_channel_sink_consumer_sees_pages_in_order() {
    let server = MockServer::start().await;
    mount_three_workgroup_pages(&server).await;

    let config = get_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let (mut sink, mut rx) = ChannelSink::bounded(1);

    let consumer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(value) = rx.recv().await {
            seen.push(value);
        }
        seen
    });

    run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new(),
        &config.default_selector().unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap();
    drop(sink);

    let seen = consumer.await.unwrap();
    assert_eq!(seen, vec![json!(["a", "b"]), json!(["c"]), json!(["d"])]);
}

#[tokio::test]
async fn test_writer_sink_json_lines() {
    let server = MockServer::start().await;
    mount_three_workgroup_pages(&server).await;

    let config = get_operation(&server);
    let operation = HttpListOperation::from_config(&config).unwrap();
    let mut sink = WriterSink::new(Vec::new(), OutputFormat::Json);

    run_paginated(
        &operation,
        config.new_request(),
        PaginationOptions::new(),
        &config.default_selector().unwrap(),
        &mut sink,
        None,
    )
    .await
    .unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(text, "[\"a\",\"b\"]\n[\"c\"]\n[\"d\"]\n");
}
