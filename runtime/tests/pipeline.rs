//! End-to-end runs with a mock upstream and a mock hub.

use oil_price_sensor::config::{ConfigError, Settings};
use oil_price_sensor::pipeline;
use oil_price_sensor::SensorError;
use std::collections::HashMap;
use wiremock::matchers::{any, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_from(vars: &[(&str, String)]) -> Settings {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let mut settings = Settings::from_lookup(|key| vars.get(key).cloned()).unwrap();
    // Keep the host's supervisor token out of the test.
    settings.hub.token_files.clear();
    settings
}

#[tokio::test]
async fn test_missing_zipcode_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_from(&[
        ("UPSTREAM_URL", server.uri()),
        ("HA_URL", server.uri()),
        ("SUPERVISOR_TOKEN", "tok".to_string()),
    ]);

    let err = pipeline::run(&settings).await.unwrap_err();
    assert!(matches!(
        err,
        SensorError::Config(ConfigError::MissingRegionKey)
    ));
    assert_eq!(err.kind(), "config");
}

#[tokio::test]
async fn test_missing_token_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = settings_from(&[
        ("ZIPCODE", "06001".to_string()),
        ("UPSTREAM_URL", server.uri()),
        ("HA_URL", server.uri()),
    ]);

    let err = pipeline::run(&settings).await.unwrap_err();
    assert!(matches!(err, SensorError::Config(ConfigError::MissingToken)));
}

#[tokio::test]
async fn test_form_scrape_and_publish() {
    let upstream = MockServer::start().await;
    let hub = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form></form>"))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("number=06001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<script>var d = {"zipcodeprices":[{"price":"$2.89<sup>9</sup>","gallon":"150"}]};</script>"#,
        ))
        .expect(1)
        .mount(&upstream)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/states/sensor.heating_oil_price_06001"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&hub)
        .await;

    let settings = settings_from(&[
        ("ZIPCODE", "06001".to_string()),
        ("UPSTREAM_URL", upstream.uri()),
        ("HA_URL", hub.uri()),
        ("SUPERVISOR_TOKEN", "tok".to_string()),
    ]);

    let report = pipeline::run(&settings).await.unwrap();
    assert_eq!(report.state, "2.899");
    assert_eq!(report.entity_id, "sensor.heating_oil_price_06001");
    assert_eq!(report.matcher, "structured");
    assert_eq!(report.fetcher, "form");
    assert_eq!(report.hub_url, hub.uri());
    assert_eq!(report.attempt, 1);
}

#[tokio::test]
async fn test_blocked_upstream_never_reaches_hub() {
    let upstream = MockServer::start().await;
    let hub = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(403))
        .mount(&upstream)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&hub)
        .await;

    let settings = settings_from(&[
        ("ZIPCODE", "06001".to_string()),
        ("UPSTREAM_URL", upstream.uri()),
        ("HA_URL", hub.uri()),
        ("SUPERVISOR_TOKEN", "tok".to_string()),
    ]);

    let err = pipeline::run(&settings).await.unwrap_err();
    assert_eq!(err.kind(), "blocked");
}

#[tokio::test]
async fn test_empty_price_list_never_reaches_hub() {
    let upstream = MockServer::start().await;
    let hub = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"zipcodeprices":[]}"#))
        .mount(&upstream)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&hub)
        .await;

    let settings = settings_from(&[
        ("ZIPCODE", "06001".to_string()),
        ("UPSTREAM_URL", upstream.uri()),
        ("HA_URL", hub.uri()),
        ("SUPERVISOR_TOKEN", "tok".to_string()),
    ]);

    let err = pipeline::run(&settings).await.unwrap_err();
    assert_eq!(err.kind(), "extract");
    assert!(err.to_string().contains("no prices found"));
}

#[tokio::test]
async fn test_scrape_needs_no_token() {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<b>$3.29</b>"))
        .mount(&upstream)
        .await;

    let settings = settings_from(&[
        ("ZIPCODE", "06001".to_string()),
        ("UPSTREAM_URL", upstream.uri()),
    ]);

    let extraction = pipeline::scrape(&settings).await.unwrap();
    assert_eq!(extraction.price.value(), 3.29);
    assert_eq!(extraction.matcher, "dollar");
}
