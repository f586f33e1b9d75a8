//! HTTP transport status mapping against a local mock server

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use steward::client::{
    DEFAULT_NOT_FOUND_MESSAGE, HttpTransport, IcingaClient, IcingaError, Transport, Verb,
};
use steward::status::Health;

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(&server.uri(), "root", "icinga", true).unwrap()
}

async fn respond_with(template: ResponseTemplate) -> (MockServer, HttpTransport) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(template)
        .mount(&server)
        .await;
    let transport = transport_for(&server);
    (server, transport)
}

#[tokio::test]
async fn test_requests_carry_auth_and_method_override() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/services"))
        .and(header("X-HTTP-Method-Override", "GET"))
        .and(header("Accept", "application/json"))
        .and(header("Authorization", "Basic cm9vdDppY2luZ2E="))
        .and(body_json(json!({"type": "Service"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let value = transport
        .send("/v1/objects/services", Verb::Get, &json!({"type": "Service"}))
        .await
        .unwrap();
    assert_eq!(value, json!({"results": []}));
}

#[tokio::test]
async fn test_unauthorized_and_forbidden_map_to_authentication() {
    for status in [401, 403] {
        let (_server, transport) = respond_with(ResponseTemplate::new(status)).await;
        let err = transport
            .send("/v1/objects/hosts", Verb::Get, &json!({}))
            .await
            .unwrap_err();
        assert!(
            matches!(err, IcingaError::Authentication { custom: false, .. }),
            "status {status}"
        );
    }
}

#[tokio::test]
async fn test_not_found_uses_server_status_when_present() {
    let (_server, transport) = respond_with(
        ResponseTemplate::new(404)
            .set_body_json(json!({"error": 404, "status": "No objects found."})),
    )
    .await;

    let err = transport
        .send("/v1/objects/hosts", Verb::Get, &json!({}))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.is_custom());
    assert_eq!(err.to_string(), "No objects found.");
}

#[tokio::test]
async fn test_not_found_without_status_uses_default() {
    let (_server, transport) = respond_with(ResponseTemplate::new(404).set_body_string("nope")).await;

    let err = transport
        .send("/v1/objects/hosts", Verb::Get, &json!({}))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_custom());
    assert_eq!(err.to_string(), DEFAULT_NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_server_error_maps_to_not_found() {
    let (_server, transport) =
        respond_with(ResponseTemplate::new(500).set_body_string("internal")).await;

    let err = transport
        .send("/v1/actions/reschedule-check", Verb::Post, &json!({}))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_custom());
}

#[tokio::test]
async fn test_non_json_success_is_unexpected() {
    let (_server, transport) =
        respond_with(ResponseTemplate::new(200).set_body_string("<html>")).await;

    let err = transport
        .send("/v1/objects/hosts", Verb::Get, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, IcingaError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    // bind and release a port so nothing listens on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(&format!("http://{addr}"), "root", "icinga", true).unwrap();
    let err = transport
        .send("/v1/objects/hosts", Verb::Get, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, IcingaError::Connection { custom: false, .. }));
}

#[tokio::test]
async fn test_client_reads_service_status_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "name": "web-01!http",
                "type": "Service",
                "attrs": {"name": "http", "last_state": 2.0},
            }]
        })))
        .mount(&server)
        .await;

    let client = IcingaClient::with_transport(transport_for(&server));
    let status = client.get_service_status("web-01", "http").await.unwrap();
    assert_eq!(status, Health::Critical);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["filter_vars"]["host_name"], "web-01");
    assert_eq!(body["filter_vars"]["service_name"], "http");
}

#[test]
fn test_client_requires_https() {
    let err = IcingaClient::new("http://icinga:5665", "root", "icinga", true).unwrap_err();
    assert!(matches!(err, IcingaError::InvalidUrl(_)));
    assert!(IcingaClient::new("https://icinga:5665", "root", "icinga", true).is_ok());
}
