//! Shared test fixtures.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use remote_webdriver::{
    Capabilities, Driver, Error, Result, ScriptedTransport, Service,
};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds an idle driver over `transport`.
pub async fn idle_driver(transport: &ScriptedTransport) -> Driver {
    init_tracing();
    Driver::builder()
        .endpoint("http://127.0.0.1:4444/wd/hub")
        .transport(transport.clone())
        .build()
        .await
        .expect("driver builds")
}

/// Builds a driver with an active session `s-1`.
pub async fn active_driver(transport: &ScriptedTransport) -> Driver {
    transport.with_session("s-1");
    let driver = idle_driver(transport).await;
    driver
        .start_session(Capabilities::browser("x"))
        .await
        .expect("session starts");
    driver
}

/// Service double that hands out a fixed URL and counts calls.
#[derive(Clone)]
pub struct FakeService {
    url: Url,
    fail_start: bool,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl FakeService {
    pub fn new(url: &str) -> Self {
        Self {
            url: Url::parse(url).expect("valid url"),
            fail_start: false,
            starts: Arc::default(),
            stops: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new("http://127.0.0.1:1")
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Service for FakeService {
    async fn start(&self) -> Result<Url> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(Error::service_start_timeout(self.url.as_str(), 20_000));
        }
        Ok(self.url.clone())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
