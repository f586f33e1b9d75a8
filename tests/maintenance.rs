//! Downtime scheduling and clearing against the in-memory Icinga server

use std::time::Duration;

use steward::checks::CheckOptions;
use steward::client::IcingaError;
use steward::maintenance::{DowntimeSpec, PreCheck, ServicePlan, ServiceScope};
use steward::status::Health;
use steward_testkit::{MockHost, MockIcinga, MockService};

const SCHEDULE_DOWNTIME: &str = "/v1/actions/schedule-downtime";

fn web_host() -> MockHost {
    MockHost::new("web-01")
        .with_service(MockService::new("http", Health::Ok))
        .with_service(MockService::new("disk_root", Health::Ok))
        .with_service(MockService::new("disk_var", Health::Ok))
}

fn one_hour() -> DowntimeSpec {
    DowntimeSpec::from_secs(3600)
        .with_author("ops")
        .with_comment("Kernel upgrade")
}

#[tokio::test]
async fn test_explicit_list_with_unknown_service_changes_nothing() {
    let (server, client) = MockIcinga::new()
        .with_host(
            MockHost::new("web-01")
                .with_service(MockService::new("X", Health::Ok))
                .with_service(MockService::new("Z", Health::Ok)),
        )
        .into_client();

    let err = client
        .set_maintenance(
            "web-01",
            &ServiceScope::explicit(["X", "Y"]),
            &one_hour(),
            None,
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.is_custom());
    assert_eq!(
        err.to_string(),
        "Unable to find service(s) Y on host web-01, valid services are: X, Z"
    );
    assert!(server.downtimes().is_empty());
    assert!(server.requests_to(SCHEDULE_DOWNTIME).is_empty());
}

#[tokio::test]
async fn test_explicit_list_covers_each_named_service() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    let result = client
        .set_maintenance(
            "web-01",
            &ServiceScope::explicit(["http", "disk_var", "http"]),
            &one_hour(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.services, vec!["http", "disk_var"]);
    assert_eq!(result.changes, 3);
    assert_eq!(result.statuses.len(), 3);
    assert!(result.changed());

    let downtimes = server.downtimes();
    assert_eq!(downtimes.len(), 3);
    assert_eq!(downtimes[0].service, None);
    assert_eq!(downtimes[1].service.as_deref(), Some("http"));
    assert_eq!(downtimes[2].service.as_deref(), Some("disk_var"));
    assert!(downtimes.iter().all(|d| d.author == "ops"));
    assert!(downtimes.iter().all(|d| d.comment == "Kernel upgrade"));

    let host_request = &server.requests_to(SCHEDULE_DOWNTIME)[0];
    assert_eq!(host_request.body["all_services"], false);
}

#[tokio::test]
async fn test_pattern_scope_covers_matching_services() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    let result = client
        .set_maintenance("web-01", &ServiceScope::from_pattern("disk*"), &one_hour(), None)
        .await
        .unwrap();

    assert_eq!(result.services, vec!["disk_root", "disk_var"]);
    assert_eq!(result.changes, 3);
    assert_eq!(server.downtimes().len(), 3);
}

#[tokio::test]
async fn test_pattern_matching_nothing_only_covers_host() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    let result = client
        .set_maintenance("web-01", &ServiceScope::from_pattern("mysql*"), &one_hour(), None)
        .await
        .unwrap();

    assert!(result.services.is_empty());
    assert_eq!(result.changes, 1);
    assert_eq!(server.downtimes().len(), 1);
}

#[tokio::test]
async fn test_all_scope_lets_server_cover_services() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    let result = client
        .set_maintenance("web-01", &ServiceScope::from_pattern("all"), &one_hour(), None)
        .await
        .unwrap();

    // host downtime plus the three created by the server
    assert_eq!(result.changes, 4);
    assert_eq!(result.services, vec!["http", "disk_root", "disk_var"]);
    assert_eq!(server.requests_to(SCHEDULE_DOWNTIME).len(), 1);
    assert_eq!(server.requests_to(SCHEDULE_DOWNTIME)[0].body["all_services"], true);
    assert_eq!(server.downtimes().len(), 4);

    let status = client.get_host_status("web-01").await.unwrap();
    assert!(status.in_maintenance);
}

#[tokio::test]
async fn test_host_only_scope() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    let result = client
        .set_maintenance("web-01", &ServiceScope::host_only(), &one_hour(), None)
        .await
        .unwrap();

    assert_eq!(result.changes, 1);
    assert!(result.services.is_empty());
    assert_eq!(server.downtimes().len(), 1);
    assert_eq!(server.downtimes()[0].service, None);
}

#[tokio::test]
async fn test_every_window_spans_the_duration() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    client
        .set_maintenance("web-01", &ServiceScope::from_pattern("*"), &one_hour(), None)
        .await
        .unwrap();

    let downtimes = server.downtimes();
    assert!(!downtimes.is_empty());
    for downtime in &downtimes {
        assert_eq!(downtime.end_time - downtime.start_time, 3600);
        assert_eq!(downtime.duration, 3600);
    }
}

#[tokio::test]
async fn test_zero_duration_is_rejected_before_any_request() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    let err = client
        .set_maintenance("web-01", &ServiceScope::All, &DowntimeSpec::from_secs(0), None)
        .await
        .unwrap_err();

    assert!(matches!(err, IcingaError::InvalidRequest(_)));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_host_is_not_found() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    let err = client
        .set_maintenance("db-09", &ServiceScope::host_only(), &one_hour(), None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(server.downtimes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_precheck_stops_on_failed_service() {
    let (server, client) = MockIcinga::new()
        .with_host(
            MockHost::new("web-01")
                .with_service(MockService::new("http", Health::Ok))
                .with_service(MockService::new("disk", Health::Critical)),
        )
        .into_client();

    let precheck =
        PreCheck::new(CheckOptions::new(Duration::from_secs(2), 0)).stop_on_failed_service(true);
    let err = client
        .set_maintenance("web-01", &ServiceScope::All, &one_hour(), Some(&precheck))
        .await
        .unwrap_err();

    assert!(err.is_service_failed());
    assert!(err.to_string().contains("disk"));
    assert!(server.downtimes().is_empty());
    assert_eq!(server.reschedule_count("web-01", "disk"), 1);
    assert_eq!(server.reschedule_count("web-01", "http"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_precheck_failure_without_stop_continues() {
    let (server, client) = MockIcinga::new()
        .with_host(
            MockHost::new("web-01")
                .with_service(MockService::new("http", Health::Ok))
                .with_service(MockService::new("disk", Health::Critical)),
        )
        .into_client();

    let precheck = PreCheck::new(CheckOptions::new(Duration::from_secs(2), 0));
    let result = client
        .set_maintenance("web-01", &ServiceScope::All, &one_hour(), Some(&precheck))
        .await
        .unwrap();

    assert_eq!(result.changes, 3);
    assert_eq!(server.downtimes().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_set_service_maintenance() {
    let (server, client) = MockIcinga::new()
        .with_host(
            MockHost::new("web-01")
                .with_service(
                    MockService::new("http", Health::Critical)
                        .recovering_after(Duration::from_secs(1)),
                )
                .with_service(MockService::new("disk", Health::Critical)),
        )
        .into_client();
    let opts = CheckOptions::new(Duration::from_secs(3), 0);

    let status = client
        .set_service_maintenance("web-01", "http", &one_hour(), Some(&opts))
        .await
        .unwrap();
    assert!(status.contains("web-01!http"));

    let err = client
        .set_service_maintenance("web-01", "disk", &one_hour(), Some(&opts))
        .await
        .unwrap_err();
    assert!(err.is_service_failed());

    let err = client
        .set_service_maintenance("web-01", "ssh", &one_hour(), None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let downtimes = server.downtimes();
    assert_eq!(downtimes.len(), 1);
    assert_eq!(downtimes[0].service.as_deref(), Some("http"));
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    client
        .set_maintenance("web-01", &ServiceScope::All, &one_hour(), None)
        .await
        .unwrap();

    let cleared = client
        .clear_maintenance("web-01", &ServiceScope::All, None)
        .await
        .unwrap();
    assert_eq!(cleared.changes, 4);
    assert_eq!(cleared.statuses.len(), 4);
    assert_eq!(cleared.services, vec!["http", "disk_root", "disk_var"]);
    assert!(server.downtimes().is_empty());

    let again = client
        .clear_maintenance("web-01", &ServiceScope::All, None)
        .await
        .unwrap();
    assert!(!again.changed());
    assert!(again.statuses.is_empty());

    let status = client.get_host_status("web-01").await.unwrap();
    assert!(!status.in_maintenance);
}

#[tokio::test]
async fn test_clear_is_host_wide_for_any_scope() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    client
        .set_maintenance("web-01", &ServiceScope::from_pattern("disk*"), &one_hour(), None)
        .await
        .unwrap();

    let cleared = client
        .clear_maintenance("web-01", &ServiceScope::explicit(["disk_root"]), None)
        .await
        .unwrap();
    assert_eq!(cleared.changes, 3);
    assert!(server.downtimes().is_empty());
}

#[tokio::test]
async fn test_resolve_scope() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();

    assert_eq!(
        client.resolve_scope("web-01", &ServiceScope::All).await.unwrap(),
        ServicePlan::AllServices
    );
    assert_eq!(
        client
            .resolve_scope("web-01", &ServiceScope::host_only())
            .await
            .unwrap(),
        ServicePlan::Services(Vec::new())
    );
    assert_eq!(
        client
            .resolve_scope("web-01", &ServiceScope::from_pattern("disk_?oot"))
            .await
            .unwrap(),
        ServicePlan::Services(vec!["disk_root".to_string()])
    );
    assert_eq!(server.action_count(), 0);
}

#[tokio::test]
async fn test_oversized_duration_is_rejected_before_any_request() {
    let (server, client) = MockIcinga::new().with_host(web_host()).into_client();
    let huge = DowntimeSpec::from_secs(steward::duration::parse_duration("999999999999999d"));

    let err = client
        .set_maintenance("web-01", &ServiceScope::host_only(), &huge, None)
        .await
        .unwrap_err();
    assert!(matches!(err, IcingaError::InvalidRequest(_)));

    let err = client
        .set_service_maintenance("web-01", "http", &huge, None)
        .await
        .unwrap_err();
    assert!(matches!(err, IcingaError::InvalidRequest(_)));

    assert!(server.requests().is_empty());
    assert!(server.downtimes().is_empty());
}

fn host_with_failing_disk() -> MockHost {
    MockHost::new("web-01")
        .with_service(MockService::new("http", Health::Ok))
        .with_service(MockService::new("disk", Health::Critical))
}

#[tokio::test(start_paused = true)]
async fn test_clear_precheck_stops_on_failed_service() {
    let (server, client) = MockIcinga::new()
        .with_host(host_with_failing_disk())
        .into_client();
    client
        .set_maintenance("web-01", &ServiceScope::All, &one_hour(), None)
        .await
        .unwrap();
    assert_eq!(server.downtimes().len(), 3);

    let precheck =
        PreCheck::new(CheckOptions::new(Duration::from_secs(2), 0)).stop_on_failed_service(true);
    let err = client
        .clear_maintenance("web-01", &ServiceScope::All, Some(&precheck))
        .await
        .unwrap_err();

    assert!(err.is_service_failed());
    assert!(err.to_string().contains("disk"));
    assert_eq!(server.downtimes().len(), 3);
    assert!(server.requests_to("/v1/actions/remove-downtime").is_empty());
    assert_eq!(server.reschedule_count("web-01", "disk"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clear_precheck_failure_without_stop_continues() {
    let (server, client) = MockIcinga::new()
        .with_host(host_with_failing_disk())
        .into_client();
    client
        .set_maintenance("web-01", &ServiceScope::All, &one_hour(), None)
        .await
        .unwrap();

    let precheck = PreCheck::new(CheckOptions::new(Duration::from_secs(2), 0));
    let cleared = client
        .clear_maintenance("web-01", &ServiceScope::All, Some(&precheck))
        .await
        .unwrap();

    assert_eq!(cleared.changes, 3);
    assert!(server.downtimes().is_empty());
    assert_eq!(server.reschedule_count("web-01", "disk"), 1);
}
