use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub searches_total: IntCounterVec,
    pub notifications_total: IntCounterVec,
    pub notification_queue_depth: IntGauge,
    pub fanout_latency_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let searches_total = IntCounterVec::new(
            Opts::new("searches_total", "Searches served by chosen mode"),
            &["mode"],
        )
        .expect("valid searches_total metric");

        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Driver notifications by outcome"),
            &["outcome"],
        )
        .expect("valid notifications_total metric");

        let notification_queue_depth = IntGauge::new(
            "notification_queue_depth",
            "Client requests waiting for notification fan-out",
        )
        .expect("valid notification_queue_depth metric");

        let fanout_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "fanout_latency_seconds",
            "Time to notify nearby drivers of one request in seconds",
        ))
        .expect("valid fanout_latency_seconds metric");

        registry
            .register(Box::new(searches_total.clone()))
            .expect("register searches_total");
        registry
            .register(Box::new(notifications_total.clone()))
            .expect("register notifications_total");
        registry
            .register(Box::new(notification_queue_depth.clone()))
            .expect("register notification_queue_depth");
        registry
            .register(Box::new(fanout_latency_seconds.clone()))
            .expect("register fanout_latency_seconds");

        Self {
            registry,
            searches_total,
            notifications_total,
            notification_queue_depth,
            fanout_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
