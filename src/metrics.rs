use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for the room rates service
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Admission metrics
    admission_decisions: CounterVec,

    // Response metrics
    responses: CounterVec,
    upstream_errors: Counter,
    request_duration: Histogram,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let admission_decisions = CounterVec::new(
            Opts::new(
                "room_rates_admission_decisions",
                "Rate limiter decisions by outcome",
            ),
            &["outcome"],
        )?;

        let responses = CounterVec::new(
            Opts::new(
                "room_rates_responses",
                "API responses by HTTP status code",
            ),
            &["status"],
        )?;

        let upstream_errors = Counter::new(
            "room_rates_upstream_errors",
            "Number of failed room data lookups",
        )?;

        let request_duration = Histogram::with_opts(HistogramOpts::new(
            "room_rates_request_duration_seconds",
            "Duration of API requests in seconds",
        ))?;

        registry.register(Box::new(admission_decisions.clone()))?;
        registry.register(Box::new(responses.clone()))?;
        registry.register(Box::new(upstream_errors.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            admission_decisions,
            responses,
            upstream_errors,
            request_duration,
        })
    }

    /// Get the Prometheus registry for this metrics instance
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_admitted(&self) {
        self.admission_decisions.with_label_values(&["admitted"]).inc();
    }

    pub fn record_rejected(&self) {
        self.admission_decisions.with_label_values(&["rejected"]).inc();
    }

    /// Record a response by status code
    pub fn record_response(&self, status: u16) {
        self.responses.with_label_values(&[&status.to_string()]).inc();
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors.inc();
    }

    /// Create a timer for measuring request duration
    pub fn start_request_timer(&self) -> prometheus::HistogramTimer {
        self.request_duration.start_timer()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics")
    }
}
