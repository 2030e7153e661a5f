use serde::Deserialize;

/// Main configuration structure for Unit-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    pub output: OutputConfig,
}

/// Remote catalog endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Scheme and host of the catalog site (e.g. "https://masterunitlist.info")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the filtered listing page
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Path prefix of the unit overview page; also the prefix of listing links
    #[serde(rename = "detail-path")]
    pub detail_path: String,

    /// Path prefix of the custom card page
    #[serde(rename = "custom-card-path")]
    pub custom_card_path: String,

    /// Query string appended to the listing request (without the leading '?')
    #[serde(rename = "listing-filter", default)]
    pub listing_filter: String,
}

/// Worker pool and HTTP behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Number of concurrent workers; defaults to the host's available parallelism
    pub workers: Option<usize>,

    /// Capacity of the pending queue; defaults to twice the worker count
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: Option<usize>,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Extra attempts for a transient overview fetch failure
    #[serde(rename = "overview-retries", default = "default_overview_retries")]
    pub overview_retries: u32,

    /// Delay between overview fetch attempts in milliseconds
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Append-only results log, one JSON unit per line
    #[serde(rename = "results-path")]
    pub results_path: String,

    /// Pending snapshot file; an empty string disables snapshot mode
    #[serde(rename = "pending-path", default = "default_pending_path")]
    pub pending_path: Option<String>,
}

impl OutputConfig {
    /// The pending snapshot path, or `None` when snapshot mode is off
    pub fn snapshot_path(&self) -> Option<&str> {
        self.pending_path.as_deref().filter(|path| !path.is_empty())
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            workers: None,
            queue_capacity: None,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            overview_retries: default_overview_retries(),
            retry_delay_ms: default_retry_delay(),
            user_agent: default_user_agent(),
        }
    }
}

impl HarvestConfig {
    /// Resolves the worker count, falling back to available parallelism
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Resolves the pending queue capacity for the given worker count
    pub fn queue_capacity_for(&self, workers: usize) -> usize {
        self.queue_capacity.unwrap_or(workers * 2).max(1)
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_overview_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    500
}

fn default_pending_path() -> Option<String> {
    Some("remaining_units.json".to_string())
}

fn default_user_agent() -> String {
    format!("unit-harvest/{}", env!("CARGO_PKG_VERSION"))
}
