use ferry_core::AdmissionError;
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::warn;

/// Counts open connections per source address.
#[derive(Debug)]
pub struct AdmissionGuard {
    open: HashMap<IpAddr, usize>,
    max_per_ip: usize,
}

impl AdmissionGuard {
    pub fn new(max_per_ip: usize) -> Self {
        Self {
            open: HashMap::new(),
            max_per_ip,
        }
    }

    /// Reserves a slot for a new connection from `addr`.
    pub fn admit(&mut self, addr: IpAddr) -> Result<(), AdmissionError> {
        let count = self.open.entry(addr).or_insert(0);
        if *count >= self.max_per_ip {
            warn!("Refusing connection from {}: {} already open", addr, count);
            return Err(AdmissionError::TooManyConnections {
                limit: self.max_per_ip,
            });
        }
        *count += 1;
        Ok(())
    }

    /// Frees the slot taken by [`admit`](Self::admit).
    pub fn release(&mut self, addr: IpAddr) {
        let Some(count) = self.open.get_mut(&addr) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.open.remove(&addr);
        }
    }

    pub fn open_connections(&self, addr: &IpAddr) -> usize {
        self.open.get(addr).copied().unwrap_or(0)
    }
}
