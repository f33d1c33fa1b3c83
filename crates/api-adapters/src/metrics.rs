//! Request and denial counters, rendered for `GET /metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

type Labels = Vec<(String, String)>;

pub struct Metrics {
    registry: Registry,
    responses: Family<Labels, Counter>,
    denials: Family<Labels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("forum");
        let responses = Family::<Labels, Counter>::default();
        let denials = Family::<Labels, Counter>::default();
        registry.register(
            "http_responses",
            "HTTP responses by method and status class",
            responses.clone(),
        );
        registry.register(
            "authorization_denials",
            "Requests refused by the authorization gate, by reason",
            denials.clone(),
        );
        Self {
            registry,
            responses,
            denials,
        }
    }

    pub fn observe_response(&self, method: &str, status: u16) {
        let labels = vec![
            ("method".to_string(), method.to_string()),
            ("status".to_string(), format!("{}xx", status / 100)),
        ];
        self.responses.get_or_create(&labels).inc();
    }

    pub fn observe_denial(&self, reason: &str) {
        let labels = vec![("reason".to_string(), reason.to_string())];
        self.denials.get_or_create(&labels).inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_the_exposition() {
        let metrics = Metrics::new();
        metrics.observe_response("GET", 200);
        metrics.observe_response("GET", 204);
        metrics.observe_denial("banned");

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"forum_http_responses_total{method="GET",status="2xx"} 2"#));
        assert!(text.contains(r#"forum_authorization_denials_total{reason="banned"} 1"#));
    }
}
