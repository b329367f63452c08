//! Local port allocation.
//!
//! Ports are picked by binding an ephemeral listener and releasing it
//! immediately. The allocator remembers every port whose lease is alive
//! and never hands it out twice, even if the OS offers it again.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Attempts before giving up on finding a free port.
const MAX_ATTEMPTS: usize = 64;

// ============================================================================
// PortAllocator
// ============================================================================

/// Hands out distinct local ports.
///
/// Cloning is cheap; clones share the reservation set.
#[derive(Clone, Default)]
pub struct PortAllocator {
    leased: Arc<Mutex<FxHashSet<u16>>>,
}

impl fmt::Debug for PortAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortAllocator")
            .field("leased", &self.leased.lock().len())
            .finish()
    }
}

impl PortAllocator {
    /// Creates an allocator with no reservations.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide allocator.
    #[must_use]
    pub fn shared() -> &'static PortAllocator {
        static SHARED: OnceLock<PortAllocator> = OnceLock::new();
        SHARED.get_or_init(PortAllocator::new)
    }

    /// Reserves a free port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if no listener can be bound, or
    /// [`Error::ServiceLaunch`] if every offered port is already leased.
    pub fn allocate(&self) -> Result<PortLease> {
        for _ in 0..MAX_ATTEMPTS {
            let port = {
                let listener = TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))?;
                listener.local_addr()?.port()
            };
            if let Some(lease) = self.reserve(port) {
                debug!(port, "Port allocated");
                return Ok(lease);
            }
            trace!(port, "Port already leased");
        }
        Err(Error::service_launch("no free local port"))
    }

    /// Reserves a specific port; `None` if it is already leased.
    #[must_use]
    pub fn reserve(&self, port: u16) -> Option<PortLease> {
        if !self.leased.lock().insert(port) {
            return None;
        }
        Some(PortLease {
            port,
            leased: Arc::clone(&self.leased),
        })
    }

    /// Returns `true` if `port` is leased.
    #[inline]
    #[must_use]
    pub fn is_leased(&self, port: u16) -> bool {
        self.leased.lock().contains(&port)
    }

    /// Returns the number of live leases.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.leased.lock().len()
    }

    /// Returns `true` if nothing is leased.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leased.lock().is_empty()
    }
}

// ============================================================================
// PortLease
// ============================================================================

/// A port reservation, released on drop.
pub struct PortLease {
    port: u16,
    leased: Arc<Mutex<FxHashSet<u16>>>,
}

impl PortLease {
    /// Returns the reserved port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Debug for PortLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortLease").field("port", &self.port).finish()
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        self.leased.lock().remove(&self.port);
        trace!(port = self.port, "Port released");
    }
}

// ============================================================================
// Tests
// ============================================================================
