//! Session lifecycle and dispatcher behaviour over a scripted transport.

mod common;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use remote_webdriver::protocol::RawResponse;
use remote_webdriver::{
    By, Capabilities, CommandEvent, Driver, DriverState, Error, ErrorKind, ScriptedTransport,
};
use serde_json::{Value, json};

use common::{FakeService, active_driver, idle_driver};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[tokio::test]
async fn test_new_session_sends_both_dialects() {
    let transport = ScriptedTransport::new();
    transport.with_session("s-1");
    let driver = idle_driver(&transport).await;

    let caps = Capabilities::browser("firefox")
        .with_platform("LINUX")
        .set("proxyType", "MANUAL")
        .set("httpProxy", "proxy:8080")
        .set("moz:firefoxOptions", json!({"args": ["-headless"]}))
        .set("chrome.switches", json!(["x"]));
    let session = driver.start_session(caps).await.unwrap();
    assert_eq!(session.id().as_str(), "s-1");

    let sent = &transport.requests_for("newSession")[0];
    assert_eq!(sent.path, "/session");
    assert_eq!(
        sent.body,
        Some(json!({
            "capabilities": {
                "firstMatch": [{}],
                "alwaysMatch": {
                    "browserName": "firefox",
                    "platformName": "linux",
                    "proxy": {"proxyType": "manual", "httpProxy": "proxy:8080"},
                    "moz:firefoxOptions": {"args": ["-headless"]},
                }
            },
            "desiredCapabilities": {
                "browserName": "firefox",
                "platform": "LINUX",
                "proxyType": "MANUAL",
                "httpProxy": "proxy:8080",
                "moz:firefoxOptions": {"args": ["-headless"]},
                "chrome.switches": ["x"],
            }
        }))
    );
    assert_eq!(transport.endpoints()[0].as_str(), "http://127.0.0.1:4444/wd/hub");
}

#[tokio::test]
async fn test_legacy_new_session_reply() {
    let transport = ScriptedTransport::new();
    transport.respond(
        "newSession",
        RawResponse::legacy(0, Some("oss-1"), json!({"browserName": "htmlunit"})),
    );
    let driver = idle_driver(&transport).await;

    let session = driver.start_session(Capabilities::new()).await.unwrap();
    assert_eq!(session.id().as_str(), "oss-1");
    assert_eq!(session.capabilities().browser_name(), Some("htmlunit"));
}

#[tokio::test]
async fn test_commands_before_session_fail_locally() {
    let transport = ScriptedTransport::new();
    let driver = idle_driver(&transport).await;

    let err = driver.get("https://example.com").await.unwrap_err();
    assert!(matches!(err, Error::NoActiveSession { .. }));
    assert_eq!(err.kind(), ErrorKind::NoActiveSession);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_second_start_rejected() {
    let transport = ScriptedTransport::new();
    let driver = active_driver(&transport).await;

    let err = driver.start_session(Capabilities::new()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(transport.requests_for("newSession").len(), 1);
}

#[tokio::test]
async fn test_quit_twice_sends_one_delete() {
    let transport = ScriptedTransport::new();
    let driver = active_driver(&transport).await;

    driver.quit().await.unwrap();
    driver.quit().await.unwrap();
    assert_eq!(driver.state(), DriverState::Closed);
    assert_eq!(transport.requests_for("quit").len(), 1);
    assert_eq!(transport.requests_for("quit")[0].path, "/session/s-1");

    let err = driver.title().await.unwrap_err();
    assert!(matches!(err, Error::NoActiveSession { .. }));
}

#[tokio::test]
async fn test_quit_without_session_sends_nothing() {
    let transport = ScriptedTransport::new();
    let driver = idle_driver(&transport).await;

    driver.quit().await.unwrap();
    assert_eq!(driver.state(), DriverState::Closed);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_quit_tolerates_forgotten_session() {
    let transport = ScriptedTransport::new();
    transport
        .respond_value("newSession", json!({"sessionId": "s-1", "capabilities": {}}))
        .respond_error("quit", 404, "invalid session id", "already gone");
    let driver = idle_driver(&transport).await;
    driver.start_session(Capabilities::new()).await.unwrap();

    driver.quit().await.unwrap();
    assert_eq!(driver.state(), DriverState::Closed);
}

#[tokio::test]
async fn test_element_handles_die_with_session() {
    let transport = ScriptedTransport::new();
    transport.respond_value("findElement", json!({ELEMENT_KEY: "e-1"}));
    let driver = active_driver(&transport).await;

    let element = driver.find_element(By::css("button")).await.unwrap();
    assert_eq!(driver.element_count(), 1);

    driver.quit().await.unwrap();
    assert_eq!(driver.element_count(), 0);

    let before = transport.request_count();
    let err = element.click().await.unwrap_err();
    assert!(matches!(err, Error::InvalidSessionId { .. }));
    assert_eq!(transport.request_count(), before);
}

#[tokio::test]
async fn test_stale_element_is_tagged() {
    let transport = ScriptedTransport::new();
    transport
        .respond_value("findElement", json!({ELEMENT_KEY: "e-1"}))
        .respond_error("clickElement", 404, "stale element reference", "detached");
    let driver = active_driver(&transport).await;

    let element = driver.find_element("#go").await.unwrap();
    let err = element.click().await.unwrap_err();
    match err {
        Error::StaleElementReference { element_id, .. } => {
            assert_eq!(element_id.unwrap().as_str(), "e-1");
        }
        other => panic!("expected stale element, got {other:?}"),
    }
    assert!(driver.state() == DriverState::Active);
    assert_eq!(
        transport.requests_for("clickElement")[0].path,
        "/session/s-1/element/e-1/click"
    );
}

#[tokio::test]
async fn test_invalid_session_closes_and_kills_handles() {
    let transport = ScriptedTransport::new();
    transport
        .respond_value("findElement", json!({ELEMENT_KEY: "e-1"}))
        .respond_error("getTitle", 404, "invalid session id", "crashed");
    let driver = active_driver(&transport).await;
    let element = driver.find_element("a").await.unwrap();

    let err = driver.title().await.unwrap_err();
    assert!(err.is_session_error());
    assert_eq!(driver.state(), DriverState::Closed);

    let err = element.text().await.unwrap_err();
    assert!(matches!(err, Error::InvalidSessionId { .. }));
}

#[tokio::test]
async fn test_concurrent_commands_are_serialized() {
    let transport = ScriptedTransport::new();
    transport
        .respond_value("getTitle", json!("t"))
        .set_latency(Duration::from_millis(20));
    let driver = active_driver(&transport).await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let driver = driver.clone();
            tokio::spawn(async move { driver.title().await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "t");
    }

    assert_eq!(transport.max_in_flight(), 1);
    assert_eq!(transport.requests_for("getTitle").len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_is_not_a_wait_timeout() {
    let transport = ScriptedTransport::new();
    transport.with_session("s-1").respond_hang("getPageSource");
    let driver = Driver::builder()
        .endpoint("http://127.0.0.1:4444")
        .transport(transport.clone())
        .request_timeout(Duration::from_secs(30))
        .build()
        .await
        .unwrap();
    driver.start_session(Capabilities::new()).await.unwrap();

    let err = driver.page_source().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestTimeout);
    assert!(err.is_timeout());
    assert_eq!(driver.state(), DriverState::Active);
}

#[tokio::test]
async fn test_observer_sees_request_ids() {
    let transport = ScriptedTransport::new();
    transport.with_session("s-1").respond_value("getTitle", json!("t"));
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::default();
    let sink = Arc::clone(&seen);

    let driver = Driver::builder()
        .endpoint("http://127.0.0.1:4444")
        .transport(transport.clone())
        .observer(move |event| {
            let kind = match event {
                CommandEvent::Sent { .. } => "sent",
                CommandEvent::Received { .. } => "received",
            };
            sink.lock().push((kind.to_string(), event.request_id().to_string()));
        })
        .connect(Capabilities::new())
        .await
        .unwrap();
    driver.title().await.unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0].0, "sent");
    assert_eq!(seen[1].0, "received");
    assert_eq!(seen[2].1, seen[3].1);
    assert_ne!(seen[0].1, seen[2].1);
}

#[tokio::test]
async fn test_vendor_command_through_execute() {
    let transport = ScriptedTransport::new();
    transport.with_session("s-1").respond_value(
        "executeCdpCommand",
        json!({"result": {"value": 2}}),
    );
    let driver = Driver::builder()
        .endpoint("http://127.0.0.1:9515")
        .transport(transport.clone())
        .vendor(remote_webdriver::VendorConfig::chrome())
        .connect(Capabilities::new())
        .await
        .unwrap();

    let value = driver
        .execute("executeCdpCommand", json!({"cmd": "Runtime.evaluate", "params": {}}))
        .await
        .unwrap();
    assert_eq!(value["result"]["value"], 2);
    assert_eq!(
        transport.requests_for("executeCdpCommand")[0].path,
        "/session/s-1/goog/cdp/execute"
    );

    let err = driver.execute("noSuchThing", Value::Null).await.unwrap_err();
    assert!(matches!(err, Error::UnknownCommand { .. }));
}

#[tokio::test]
async fn test_service_lifecycle_follows_driver() {
    let transport = ScriptedTransport::new();
    transport.with_session("s-1");
    let service = FakeService::new("http://127.0.0.1:9515");

    let driver = Driver::builder()
        .service(service.clone())
        .transport(transport.clone())
        .connect(Capabilities::new())
        .await
        .unwrap();
    assert_eq!(service.start_count(), 1);
    assert_eq!(driver.endpoint().as_str(), "http://127.0.0.1:9515/");

    driver.quit().await.unwrap();
    assert_eq!(service.stop_count(), 1);
}

#[tokio::test]
async fn test_failed_connect_stops_service() {
    let transport = ScriptedTransport::new();
    transport.respond_error("newSession", 500, "session not created", "no chrome");
    let service = FakeService::new("http://127.0.0.1:9515");

    let err = Driver::builder()
        .service(service.clone())
        .transport(transport.clone())
        .connect(Capabilities::chrome())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotCreated { .. }));
    assert_eq!(service.stop_count(), 1);
}

#[tokio::test]
async fn test_service_start_failure_propagates() {
    let err = Driver::builder()
        .service(FakeService::failing())
        .transport(ScriptedTransport::new())
        .build()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceStartTimeout);
}

#[tokio::test]
async fn test_endpoint_and_service_are_exclusive() {
    let err = Driver::builder()
        .endpoint("http://127.0.0.1:4444")
        .service(FakeService::new("http://127.0.0.1:9515"))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}
