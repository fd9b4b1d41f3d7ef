//! Hub configuration.

use std::time::Duration;

use crate::error::{HubError, Result};

/// Default UDP port for session-management traffic.
pub const DEFAULT_MGMT_PORT: u16 = 31850;

/// Maximum number of background worker threads a hub may own.
pub const MAX_WORKERS: usize = 8;

/// Maximum synthetic drop probability. Dropping every packet would make the
/// control channel permanently unusable, so 1.0 is disallowed by contract.
pub const MAX_DROP_PROBABILITY: f64 = 0.95;

/// How often hub-owned threads re-check the shutdown flag while waiting.
/// Bounds both worker and listener stop latency.
pub(crate) const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for one [`crate::Hub`].
///
/// Validated at hub construction: `drop_probability` must lie in
/// `[0, MAX_DROP_PROBABILITY]` and `num_workers` must not exceed
/// [`MAX_WORKERS`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// UDP port to bind for session-management datagrams. Port 0 asks the OS
    /// for an ephemeral port, available afterwards via
    /// [`crate::Hub::local_addr`].
    pub mgmt_port: u16,
    /// Number of background worker threads, fixed for the hub lifetime.
    pub num_workers: usize,
    /// Probability that an inbound session-management datagram is
    /// synthetically discarded, for exercising the upper layer's
    /// retransmission protocol.
    pub drop_probability: f64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { mgmt_port: DEFAULT_MGMT_PORT, num_workers: 0, drop_probability: 0.0 }
    }
}

impl HubConfig {
    /// Configuration listening on `mgmt_port` with no background workers and
    /// no synthetic loss.
    pub fn new(mgmt_port: u16) -> Self {
        Self { mgmt_port, ..Self::default() }
    }

    /// Set the number of background worker threads.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Set the synthetic drop probability.
    pub fn with_drop_probability(mut self, drop_probability: f64) -> Self {
        self.drop_probability = drop_probability;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        // NaN fails the range check as well.
        if !(0.0..=MAX_DROP_PROBABILITY).contains(&self.drop_probability) {
            return Err(HubError::InvalidDropProbability(self.drop_probability));
        }
        if self.num_workers > MAX_WORKERS {
            return Err(HubError::TooManyWorkers { requested: self.num_workers });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(HubConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_excessive_drop_probability() {
        let config = HubConfig::new(0).with_drop_probability(1.0);
        assert!(matches!(config.validate(), Err(HubError::InvalidDropProbability(_))));
    }

    #[test]
    fn rejects_negative_drop_probability() {
        let config = HubConfig::new(0).with_drop_probability(-0.1);
        assert!(matches!(config.validate(), Err(HubError::InvalidDropProbability(_))));
    }

    #[test]
    fn accepts_maximum_drop_probability() {
        let config = HubConfig::new(0).with_drop_probability(MAX_DROP_PROBABILITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_too_many_workers() {
        let config = HubConfig::new(0).with_workers(MAX_WORKERS + 1);
        assert!(matches!(
            config.validate(),
            Err(HubError::TooManyWorkers { requested }) if requested == MAX_WORKERS + 1
        ));
    }
}
