//! Metrics collection and export module

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub tx_submissions_total: IntCounter,
    pub tx_retries_total: IntCounter,
    pub tx_confirmed_total: IntCounter,
    pub tx_failures_total: IntCounter,
    pub preflight_rejections_total: IntCounter,

    // Histograms
    pub tx_confirm_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let tx_submissions_total = IntCounter::with_opts(Opts::new(
            "tx_submissions_total",
            "Raw transaction submissions, retries included",
        ))?;

        let tx_retries_total = IntCounter::with_opts(Opts::new(
            "tx_retries_total",
            "Submissions that were a retry of a failed attempt",
        ))?;

        let tx_confirmed_total =
            IntCounter::with_opts(Opts::new("tx_confirmed_total", "Confirmed transactions"))?;

        let tx_failures_total = IntCounter::with_opts(Opts::new(
            "tx_failures_total",
            "Transactions that failed after the retry",
        ))?;

        let preflight_rejections_total = IntCounter::with_opts(Opts::new(
            "preflight_rejections_total",
            "Operations rejected before any transaction was built",
        ))?;

        let tx_confirm_latency = Histogram::with_opts(
            HistogramOpts::new(
                "tx_confirm_latency_seconds",
                "Submit-to-confirmation latency",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(tx_submissions_total.clone()))?;
        registry.register(Box::new(tx_retries_total.clone()))?;
        registry.register(Box::new(tx_confirmed_total.clone()))?;
        registry.register(Box::new(tx_failures_total.clone()))?;
        registry.register(Box::new(preflight_rejections_total.clone()))?;
        registry.register(Box::new(tx_confirm_latency.clone()))?;

        Ok(Self {
            registry,
            tx_submissions_total,
            tx_retries_total,
            tx_confirmed_total,
            tx_failures_total,
            preflight_rejections_total,
            tx_confirm_latency,
        })
    }

    /// Prometheus text exposition of all metrics
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}
