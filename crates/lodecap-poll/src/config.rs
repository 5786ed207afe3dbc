//! Poll service configuration.

/// Default worker pool size.
pub const DEFAULT_NUM_WORKERS: usize = 4;

/// Default URL prefix for locally-minted capability URLs.
pub const DEFAULT_CAP_PREFIX: &str = "/CAPS/";

/// Configuration for [`PollService`](crate::PollService) and capability
/// registration.
#[derive(Debug, Clone)]
pub struct PollServiceConfig {
    /// Worker pool size. At least one.
    pub num_workers: usize,
    /// Prefix for locally-minted capability URLs.
    pub cap_prefix: String,
    /// When set, capabilities are proxied to this external asset service
    /// instead of being serviced locally.
    pub external_url: Option<String>,
}

impl Default for PollServiceConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_NUM_WORKERS,
            cap_prefix: DEFAULT_CAP_PREFIX.to_owned(),
            external_url: None,
        }
    }
}

impl PollServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker pool size, clamped to at least one worker.
    #[must_use]
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    /// Sets the prefix for locally-minted capability URLs.
    #[must_use]
    pub fn with_cap_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cap_prefix = prefix.into();
        self
    }

    /// Proxies all capabilities to an external asset service.
    #[must_use]
    pub fn with_external_url(mut self, url: impl Into<String>) -> Self {
        self.external_url = Some(url.into());
        self
    }
}
