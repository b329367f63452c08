//! Child-process driver service.
//!
//! Launches a driver executable with `--port=<port>` followed by the
//! configured arguments and waits until the port accepts TCP
//! connections.
//!
//! # Lifecycle
//!
//! | Call | Effect |
//! |------|--------|
//! | `start()` | Reserve port, spawn, poll readiness every 100 ms |
//! | `start()` again | Returns the running endpoint |
//! | `stop()` | Kill, wait for exit, release port |
//! | `stop()` again | No-op |
//!
//! The child is also killed when the service is dropped.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};

use super::Service;
use super::port::{PortAllocator, PortLease};

// ============================================================================
// Constants
// ============================================================================

/// Default time allowed for the port to open.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(20);

/// Interval between readiness probes.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards a child process and ensures it is killed when dropped.
struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Returns the exit status if the process already exited.
    fn exited(&mut self) -> Result<Option<std::process::ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => Ok(child.try_wait()?),
            None => Ok(None),
        }
    }

    /// Kills the process and waits for it to exit.
    async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing driver process");
            if let Err(e) = child.kill().await {
                debug!(pid = self.pid, error = %e, "Failed to kill process");
            }
            if let Err(e) = child.wait().await {
                debug!(pid = self.pid, error = %e, "Failed to wait for process");
            }
            info!(pid = self.pid, "Driver process terminated");
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

/// A started process with its port.
struct Running {
    process: ProcessGuard,
    url: Url,
    _lease: PortLease,
}

// ============================================================================
// DriverService
// ============================================================================

/// Launches a local driver executable.
///
/// Use [`DriverService::builder`] to configure one.
pub struct DriverService {
    executable: PathBuf,
    port: Option<u16>,
    args: Vec<String>,
    env: Vec<(String, String)>,
    log_path: Option<PathBuf>,
    start_timeout: Duration,
    allocator: PortAllocator,
    running: AsyncMutex<Option<Running>>,
}

impl fmt::Debug for DriverService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverService")
            .field("executable", &self.executable)
            .field("port", &self.port)
            .field("args", &self.args)
            .field("log_path", &self.log_path)
            .field("start_timeout", &self.start_timeout)
            .finish_non_exhaustive()
    }
}

impl DriverService {
    /// Creates a builder for the executable at `executable`.
    #[inline]
    #[must_use]
    pub fn builder(executable: impl Into<PathBuf>) -> DriverServiceBuilder {
        DriverServiceBuilder::new(executable)
    }

    /// Returns the executable path.
    #[inline]
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Returns the start timeout.
    #[inline]
    #[must_use]
    pub fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    /// Returns `true` while the process is running.
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Reserves the configured or a fresh port.
    fn lease_port(&self) -> Result<PortLease> {
        match self.port {
            Some(port) => self.allocator.reserve(port).ok_or_else(|| {
                Error::service_launch(format!("port {port} is already leased"))
            }),
            None => self.allocator.allocate(),
        }
    }

    /// Builds the child command.
    async fn command(&self, port: u16) -> Result<Command> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(format!("--port={port}"))
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match &self.log_path {
            Some(path) => {
                let log = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?
                    .into_std()
                    .await;
                cmd.stdout(Stdio::from(log.try_clone()?))
                    .stderr(Stdio::from(log));
            }
            None => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }
        Ok(cmd)
    }

    /// Polls until the port accepts connections or the process exits.
    async fn wait_ready(&self, process: &mut ProcessGuard, url: &Url, port: u16) -> Result<()> {
        let deadline = Instant::now() + self.start_timeout;
        loop {
            if let Some(status) = process.exited()? {
                return Err(Error::service_launch(format!(
                    "{} exited during start-up with {status}",
                    self.executable.display()
                )));
            }
            if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::service_start_timeout(
                    url.as_str(),
                    self.start_timeout.as_millis() as u64,
                ));
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Service for DriverService {
    async fn start(&self) -> Result<Url> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            return Ok(current.url.clone());
        }

        let lease = self.lease_port()?;
        let port = lease.port();
        let url = Url::parse(&format!("http://127.0.0.1:{port}"))?;

        let child = self.command(port).await?.spawn().map_err(|e| {
            Error::service_launch(format!("{}: {e}", self.executable.display()))
        })?;
        let mut process = ProcessGuard::new(child);
        info!(
            executable = %self.executable.display(),
            port,
            pid = process.pid,
            "Driver process spawned"
        );

        if let Err(e) = self.wait_ready(&mut process, &url, port).await {
            warn!(port, error = %e, "Driver service failed to start");
            process.kill().await;
            return Err(e);
        }

        info!(url = %url, "Driver service ready");
        *running = Some(Running {
            process,
            url: url.clone(),
            _lease: lease,
        });
        Ok(url)
    }

    async fn stop(&self) -> Result<()> {
        let Some(mut current) = self.running.lock().await.take() else {
            return Ok(());
        };
        current.process.kill().await;
        debug!(url = %current.url, "Driver service stopped");
        Ok(())
    }
}

// ============================================================================
// DriverServiceBuilder
// ============================================================================

/// Builder for [`DriverService`].
#[derive(Debug, Clone)]
pub struct DriverServiceBuilder {
    executable: PathBuf,
    port: Option<u16>,
    args: Vec<String>,
    env: Vec<(String, String)>,
    log_path: Option<PathBuf>,
    start_timeout: Duration,
    allocator: Option<PortAllocator>,
}

impl DriverServiceBuilder {
    /// Creates a builder for the executable at `executable`.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            port: None,
            args: Vec::new(),
            env: Vec::new(),
            log_path: None,
            start_timeout: DEFAULT_START_TIMEOUT,
            allocator: None,
        }
    }

    /// Uses a fixed port instead of an allocated one.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Appends a command-line argument.
    #[inline]
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends command-line arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for the process.
    #[inline]
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Appends stdout and stderr to `path`.
    #[inline]
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets how long to wait for the port to open.
    #[inline]
    #[must_use]
    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Uses `allocator` instead of the process-wide one.
    #[inline]
    #[must_use]
    pub fn allocator(mut self, allocator: PortAllocator) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Builds the service with validation. Nothing is spawned yet.
    ///
    /// # Errors
    ///
    /// - [`Error::DriverNotFound`] if the executable does not exist
    /// - [`Error::Config`] if the start timeout or port is zero
    pub fn build(self) -> Result<DriverService> {
        if !self.executable.is_file() {
            return Err(Error::driver_not_found(&self.executable));
        }
        if self.start_timeout.is_zero() {
            return Err(Error::config("Start timeout must be greater than zero."));
        }
        if self.port == Some(0) {
            return Err(Error::config(
                "Port 0 is not allowed. Omit .port() to allocate one.",
            ));
        }

        Ok(DriverService {
            executable: self.executable,
            port: self.port,
            args: self.args,
            env: self.env,
            log_path: self.log_path,
            start_timeout: self.start_timeout,
            allocator: self
                .allocator
                .unwrap_or_else(|| PortAllocator::shared().clone()),
            running: AsyncMutex::new(None),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
