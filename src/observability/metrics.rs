use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub order_transitions_total: IntCounterVec,
    pub orders_created_total: IntCounter,
    pub couriers_busy: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let order_transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Lifecycle operations by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid order_transitions_total metric");

        let orders_created_total =
            IntCounter::new("orders_created_total", "Orders successfully created")
                .expect("valid orders_created_total metric");

        let couriers_busy = IntGauge::new("couriers_busy", "Couriers currently out for delivery")
            .expect("valid couriers_busy metric");

        registry
            .register(Box::new(order_transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(couriers_busy.clone()))
            .expect("register couriers_busy");

        Self {
            registry,
            order_transitions_total,
            orders_created_total,
            couriers_busy,
        }
    }

    pub fn record(&self, operation: &str, outcome: &str) {
        self.order_transitions_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Current count for one series; reading never creates the series.
    pub fn transitions(&self, operation: &str, outcome: &str) -> u64 {
        let families = self.order_transitions_total.collect();
        families
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                let labels = metric.get_label();
                let has = |name: &str, value: &str| {
                    labels
                        .iter()
                        .any(|label| label.get_name() == name && label.get_value() == value)
                };
                has("operation", operation) && has("outcome", outcome)
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
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
