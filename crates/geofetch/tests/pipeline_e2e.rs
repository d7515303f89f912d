//! End-to-end pipeline tests against a real HTTP server on loopback.

mod common;

use std::time::Duration;

use common::{FEATURES, MockGeoServer, TOPOLOGY, dev_loader};
use geofetch::{
    Algorithm, ConfigOverride, DocumentKind, ErrorKind, GeoFetcher, Integrity, RuntimeMode,
    SecurityConfig, SecurityReason, SriRecord,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_loads_topology_and_feature_collection() {
    let server = MockGeoServer::start().await;
    server.serve_json("/us.json", TOPOLOGY).await;
    server.serve("/world.geojson", "application/geo+json; charset=utf-8", FEATURES).await;

    let geo = dev_loader();
    let us = geo.get_or_fetch(&server.url("/us.json")).await.unwrap();
    assert_eq!(us.kind(), DocumentKind::Topology);
    assert_eq!(us.as_topology().unwrap().object_names().collect::<Vec<_>>(), ["states"]);

    let world = geo.get_or_fetch(&server.url("/world.geojson")).await.unwrap();
    assert_eq!(world.as_feature_collection().unwrap().feature_count(), 1);
}

#[tokio::test]
async fn test_sends_accept_header_from_allowlist() {
    let server = MockGeoServer::start().await;
    server.serve_json("/us.json", TOPOLOGY).await;
    let geo = dev_loader();

    geo.fetch_document(&server.url("/us.json")).await.unwrap();

    let requests = server.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let accept = requests[0].headers.get("accept").unwrap().to_str().unwrap();
    assert_eq!(accept, geofetch::accept_header(&geo.config()));
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_wrong_content_type_is_rejected() {
    let server = MockGeoServer::start().await;
    server.serve("/page", "text/html", "<html></html>").await;

    let err = dev_loader().fetch_document(&server.url("/page")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_error_status_is_load_error() {
    let server = MockGeoServer::start().await;
    server.serve_template("/gone.json", ResponseTemplate::new(404)).await;

    let err = dev_loader().fetch_document(&server.url("/gone.json")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
    assert!(err.message().contains("404"));
}

#[tokio::test]
async fn test_follows_validated_redirects() {
    let server = MockGeoServer::start().await;
    server.redirect("/old.json", 301, "/moved.json").await;
    server.redirect("/moved.json", 307, &server.url("/us.json")).await;
    server.serve_json("/us.json", TOPOLOGY).await;

    let doc = dev_loader().fetch_document(&server.url("/old.json")).await.unwrap();
    assert_eq!(doc.kind(), DocumentKind::Topology);
}

#[tokio::test]
async fn test_redirect_to_metadata_address_is_blocked() {
    let server = MockGeoServer::start().await;
    server.redirect("/start.json", 302, "/hop.json").await;
    server.redirect("/hop.json", 302, "https://169.254.169.254/latest/meta-data/").await;

    let err = dev_loader().fetch_document(&server.url("/start.json")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Security);
    assert_eq!(err.reason(), Some(SecurityReason::PrivateAddress));
    assert_eq!(err.source_url(), Some("https://169.254.169.254/latest/meta-data/"));
}

#[tokio::test]
async fn test_redirect_loop_is_cut_off() {
    let server = MockGeoServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop.json"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop.json"))
        .expect(6)
        .mount(&server.server)
        .await;

    let err = dev_loader().fetch_document(&server.url("/loop.json")).await.unwrap_err();
    assert_eq!(err.reason(), Some(SecurityReason::Redirect));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = MockGeoServer::start().await;
    let padding = " ".repeat(8 * 1024);
    server
        .serve_json("/big.json", &format!(r#"{{"type":"FeatureCollection","features":[]{padding}}}"#))
        .await;

    let geo = dev_loader();
    geo.configure(&ConfigOverride::default().max_response_size_bytes(4 * 1024)).unwrap();
    let err = geo.fetch_document(&server.url("/big.json")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_request() {
    let server = MockGeoServer::start().await;
    server.serve_delayed("/us.json", TOPOLOGY, Duration::from_millis(200), 1).await;

    let geo = dev_loader();
    let url = server.url("/us.json");
    let (a, b, c) = tokio::join!(geo.get_or_fetch(&url), geo.get_or_fetch(&url), geo.get_or_fetch(&url));
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    geo.get_or_fetch(&url).await.unwrap();
}

#[tokio::test]
async fn test_timeout_is_load_error() {
    let server = MockGeoServer::start().await;
    server
        .serve_template(
            "/slow.json",
            ResponseTemplate::new(200)
                .set_body_raw(TOPOLOGY, "application/json")
                .set_delay(Duration::from_secs(5)),
        )
        .await;

    let geo = dev_loader();
    geo.configure(&ConfigOverride::default().timeout(Duration::from_millis(200))).unwrap();
    let err = geo.get_or_fetch(&server.url("/slow.json")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
    assert!(err.message().contains("timed out"));
}

#[tokio::test]
async fn test_integrity_is_enforced() {
    let server = MockGeoServer::start().await;
    server.serve_json("/us.json", TOPOLOGY).await;
    server.serve_json("/tampered.json", FEATURES).await;

    let geo = dev_loader();
    let good = Integrity::compute(Algorithm::Sha384, TOPOLOGY.as_bytes());
    geo.registry().add_sri(&server.url("/us.json"), &good.to_sri(), true).unwrap();
    geo.registry()
        .add_record(&server.url("/tampered.json"), SriRecord::new(good, true));

    geo.fetch_document(&server.url("/us.json")).await.unwrap();
    let err = geo.fetch_document(&server.url("/tampered.json")).await.unwrap_err();
    assert_eq!(err.reason(), Some(SecurityReason::IntegrityMismatch));
}

#[tokio::test]
async fn test_production_refuses_loopback_even_with_development_config() {
    let server = MockGeoServer::start().await;
    server.serve_json("/us.json", TOPOLOGY).await;

    let geo = GeoFetcher::new(RuntimeMode::Production)
        .unwrap()
        .with_config(SecurityConfig::development())
        .unwrap();
    let err = geo.fetch_document(&server.url("/us.json")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Security);
}
