//! Shared wiremock fixtures for the end-to-end tests.

#![allow(dead_code)]

use std::time::Duration;

use geofetch::{GeoFetcher, ReqwestClient, RuntimeMode, SecurityConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOPOLOGY: &str =
    r#"{"type":"Topology","objects":{"states":{"type":"GeometryCollection","geometries":[]}},"arcs":[]}"#;

pub const FEATURES: &str =
    r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{}}]}"#;

/// Geography server on loopback.
pub struct MockGeoServer {
    pub server: MockServer,
}

impl MockGeoServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self, route: &str) -> String { format!("{}{}", self.server.uri(), route) }

    pub async fn serve(&self, route: &str, content_type: &str, body: &str) {
        self.serve_template(route, ResponseTemplate::new(200).set_body_raw(body, content_type)).await;
    }

    pub async fn serve_json(&self, route: &str, body: &str) {
        self.serve(route, "application/json", body).await;
    }

    pub async fn serve_delayed(&self, route: &str, body: &str, delay: Duration, expected_hits: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "application/json")
                    .set_delay(delay),
            )
            .expect(expected_hits)
            .mount(&self.server)
            .await;
    }

    pub async fn redirect(&self, route: &str, status: u16, location: &str) {
        self.serve_template(route, ResponseTemplate::new(status).insert_header("Location", location))
            .await;
    }

    pub async fn serve_template(&self, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }
}

/// A loader allowed to reach the loopback mock server.
pub fn dev_loader() -> GeoFetcher<ReqwestClient> {
    GeoFetcher::new(RuntimeMode::Test)
        .and_then(|geo| geo.with_config(SecurityConfig::development()))
        .expect("loader")
}
