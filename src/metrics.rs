//! metrics dashboard controller.
//!
//! one load = one GET, then three independent renders (kpis, intents table,
//! bar chart). every load fully supersedes the previous one: kpis are
//! overwritten, the table body is replaced and the chart goes through
//! [`ChartSlot::replace`]. each request carries a sequence number and only
//! the latest one issued gets rendered, so a slow response never overwrites
//! a newer one.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, error, info, warn};

use crate::api::{ApiResponse, Transport, string_or_number};
use crate::chart::{BarChartSpec, ChartSlot, ChartSurface};
use crate::config::{ClientConfig, Texts, fill};
use crate::error::{MetricsError, TransportError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsSnapshot {
    pub total_messages: u64,
    pub unique_users: u64,
    pub average_response_time_ms: f64,
    pub user_last_intents: Vec<UserIntent>,
    /// in payload order
    #[serde(deserialize_with = "ordered_counts")]
    pub top_intents: Vec<IntentCount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserIntent {
    #[serde(rename = "user_cedula", deserialize_with = "string_or_number")]
    pub user_id_number: String,
    pub intent_summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentCount {
    pub label: String,
    pub count: u64,
}

fn ordered_counts<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<IntentCount>, D::Error> {
    struct CountsVisitor;

    impl<'de> Visitor<'de> for CountsVisitor {
        type Value = Vec<IntentCount>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of intent label to count")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((label, count)) = map.next_entry::<String, u64>()? {
                out.push(IntentCount { label, count });
            }
            Ok(out)
        }
    }

    d.deserialize_map(CountsVisitor)
}

/// the three scalar kpis, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub total_messages: String,
    pub unique_users: String,
    pub average_response_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentRow {
    pub label: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntentTable {
    Rows(Vec<IntentRow>),
    /// single placeholder row
    Empty(String),
}

pub trait DashboardView {
    /// called once per successful load, before any render. views that were
    /// replaced by an error restore their markup here.
    fn begin_render(&mut self) {}
    fn set_kpis(&mut self, kpis: &Kpis);
    /// replaces the whole table body.
    fn replace_intents(&mut self, table: &IntentTable);
    fn show_error(&mut self, message: &str);
    /// replaces the entire dashboard region with one message.
    fn replace_with_error(&mut self, message: &str);
}

/// a metrics request, ready to send.
#[derive(Debug, Clone)]
pub struct PendingLoad {
    url: String,
    seq: u64,
}

impl PendingLoad {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub async fn send<T: Transport + ?Sized>(&self, transport: &T) -> Result<ApiResponse, TransportError> {
        transport.get(&self.url).await
    }
}

pub struct MetricsDashboard<V, C: ChartSurface> {
    metrics_url: String,
    texts: Texts,
    view: V,
    charts: C,
    chart: ChartSlot<C::Handle>,
    /// sequence number of the latest request issued
    latest: u64,
}

impl<V: DashboardView, C: ChartSurface> MetricsDashboard<V, C> {
    pub fn new(metrics_url: impl Into<String>, texts: Texts, view: V, charts: C) -> Self {
        Self {
            metrics_url: metrics_url.into(),
            texts,
            view,
            charts,
            chart: ChartSlot::default(),
            latest: 0,
        }
    }

    pub fn from_config(config: &ClientConfig, view: V, charts: C) -> Self {
        Self::new(config.metrics_url(), config.texts.clone(), view, charts)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn charts(&self) -> &C {
        &self.charts
    }

    pub fn has_chart(&self) -> bool {
        self.chart.is_live()
    }

    /// issues a new request; any earlier one still in flight goes stale.
    pub fn request(&mut self) -> PendingLoad {
        self.latest += 1;
        PendingLoad { url: self.metrics_url.clone(), seq: self.latest }
    }

    /// renders the outcome of `load`; errors are surfaced on the view before
    /// being returned. outcomes of superseded loads are dropped untouched.
    pub fn render(
        &mut self,
        load: &PendingLoad,
        outcome: Result<ApiResponse, TransportError>,
    ) -> Result<(), MetricsError> {
        if load.seq != self.latest {
            debug!(target: "lenny_web", "metrics: dropping stale load seq={} latest={}", load.seq, self.latest);
            return Ok(());
        }
        let err = match self.try_render(outcome) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        warn!(target: "lenny_web", "metrics: {}", err);
        match &err {
            MetricsError::Server(message) => {
                let text = match message {
                    Some(m) => fill(&self.texts.metrics_server_error, "error", m),
                    None => self.texts.metrics_generic_error.clone(),
                };
                self.view.show_error(&text);
            }
            MetricsError::Connectivity(_) | MetricsError::Decode(_) => {
                // the canvas goes away with the region
                self.chart.release();
                self.view.replace_with_error(&self.texts.metrics_load_failed);
            }
            MetricsError::Chart(_) => self.view.show_error(&self.texts.metrics_load_failed),
        }
        Err(err)
    }

    pub async fn load_and_render<T: Transport + ?Sized>(&mut self, transport: &T) -> Result<(), MetricsError> {
        let request = self.request();
        info!(target: "lenny_web", "metrics: GET {}", request.url());
        let outcome = request.send(transport).await;
        self.render(&request, outcome)
    }

    fn try_render(&mut self, outcome: Result<ApiResponse, TransportError>) -> Result<(), MetricsError> {
        let response = outcome.inspect_err(|e| {
            error!(target: "lenny_web", "metrics transport error: {}", e);
        })?;
        if !response.is_success() {
            return Err(MetricsError::Server(response.error_message()));
        }
        let snapshot: MetricsSnapshot = response
            .decode()
            .map_err(|e| MetricsError::Decode(e.to_string()))?;

        let kpis = kpis(&self.texts, &snapshot);
        let table = intent_table(&self.texts, &snapshot);
        let spec = chart_spec(&self.texts, &snapshot);

        self.view.begin_render();
        self.view.set_kpis(&kpis);
        self.view.replace_intents(&table);
        self.chart.replace(&mut self.charts, &spec)?;

        info!(target: "lenny_web", "metrics rendered: rows={} bars={}",
            snapshot.user_last_intents.len(), spec.labels.len());
        Ok(())
    }
}

fn kpis(texts: &Texts, snapshot: &MetricsSnapshot) -> Kpis {
    Kpis {
        total_messages: snapshot.total_messages.to_string(),
        unique_users: snapshot.unique_users.to_string(),
        average_response_time: format!("{}{}", snapshot.average_response_time_ms, texts.metrics_avg_suffix),
    }
}

fn intent_table(texts: &Texts, snapshot: &MetricsSnapshot) -> IntentTable {
    if snapshot.user_last_intents.is_empty() {
        return IntentTable::Empty(texts.metrics_no_data.clone());
    }
    IntentTable::Rows(
        snapshot
            .user_last_intents
            .iter()
            .map(|entry| IntentRow {
                label: fill(&texts.metrics_row_label, "id", &entry.user_id_number),
                summary: entry.intent_summary.clone(),
            })
            .collect(),
    )
}

fn chart_spec(texts: &Texts, snapshot: &MetricsSnapshot) -> BarChartSpec {
    BarChartSpec {
        dataset_label: texts.chart_dataset_label.clone(),
        labels: snapshot.top_intents.iter().map(|i| i.label.clone()).collect(),
        values: snapshot.top_intents.iter().map(|i| i.count).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingCharts, FakeTransport, RecordingDashboard};
    use pollster::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn payload() -> Value {
        json!({
            "total_messages": 42,
            "unique_users": 7,
            "average_response_time_ms": 1350,
            "user_last_intents": [
                {"user_cedula": "123", "intent_summary": "Consulta de facturación"},
                {"user_cedula": 456, "intent_summary": "Soporte técnico"}
            ],
            "top_intents": {"billing": 5, "support": 3}
        })
    }

    fn dashboard() -> MetricsDashboard<RecordingDashboard, CountingCharts> {
        MetricsDashboard::new(
            "http://api/metrics",
            Texts::default(),
            RecordingDashboard::default(),
            CountingCharts::default(),
        )
    }

    #[test]
    fn renders_kpis_table_and_chart() {
        let transport = FakeTransport::new().reply(200, payload());
        let mut dash = dashboard();
        block_on(dash.load_and_render(&transport)).unwrap();

        assert_eq!(transport.calls()[0].method, "GET");
        assert_eq!(transport.calls()[0].url, "http://api/metrics");
        assert_eq!(
            dash.view().kpis,
            Some(Kpis {
                total_messages: "42".into(),
                unique_users: "7".into(),
                average_response_time: "1350 ms".into(),
            })
        );
        assert_eq!(
            dash.view().table,
            Some(IntentTable::Rows(vec![
                IntentRow { label: "Cédula 123:".into(), summary: "Consulta de facturación".into() },
                IntentRow { label: "Cédula 456:".into(), summary: "Soporte técnico".into() },
            ]))
        );
        let created = &dash.charts().created;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].labels, vec!["billing", "support"]);
        assert_eq!(created[0].values, vec![5, 3]);
        assert_eq!(dash.charts().live(), 1);
    }

    #[test]
    fn second_load_supersedes_first() {
        let transport = FakeTransport::new().reply(200, payload()).reply(200, payload());
        let mut dash = dashboard();
        block_on(dash.load_and_render(&transport)).unwrap();
        let kpis = dash.view().kpis.clone();
        let table = dash.view().table.clone();

        block_on(dash.load_and_render(&transport)).unwrap();
        assert_eq!(dash.view().kpis, kpis);
        assert_eq!(dash.view().table, table);
        assert_eq!(dash.charts().live(), 1);
        assert_eq!(dash.charts().created.len(), 2);
    }

    #[test]
    fn top_intents_keep_payload_order() {
        let mut body = payload();
        body["top_intents"] = json!({"zeta": 1, "alpha": 9, "mid": 4});
        let transport = FakeTransport::new().reply(200, body);
        let mut dash = dashboard();
        block_on(dash.load_and_render(&transport)).unwrap();
        assert_eq!(dash.charts().created[0].labels, vec!["zeta", "alpha", "mid"]);
        assert_eq!(dash.charts().created[0].values, vec![1, 9, 4]);
    }

    #[test]
    fn empty_intents_render_no_data_row() {
        let mut body = payload();
        body["user_last_intents"] = json!([]);
        let transport = FakeTransport::new().reply(200, body);
        let mut dash = dashboard();
        block_on(dash.load_and_render(&transport)).unwrap();
        assert_eq!(
            dash.view().table,
            Some(IntentTable::Empty(Texts::default().metrics_no_data))
        );
    }

    #[test]
    fn server_error_skips_all_renders() {
        let transport = FakeTransport::new()
            .reply(404, json!({"error": "No hay datos para mostrar"}))
            .reply(500, Value::Null);
        let mut dash = dashboard();

        let err = block_on(dash.load_and_render(&transport)).unwrap_err();
        assert_eq!(err, MetricsError::Server(Some("No hay datos para mostrar".into())));
        let err = block_on(dash.load_and_render(&transport)).unwrap_err();
        assert_eq!(err, MetricsError::Server(None));

        assert_eq!(
            dash.view().errors,
            vec![
                "Error del servidor: No hay datos para mostrar".to_string(),
                Texts::default().metrics_generic_error,
            ]
        );
        assert_eq!(dash.view().kpis, None);
        assert_eq!(dash.view().table, None);
        assert!(dash.charts().created.is_empty());
    }

    #[test]
    fn connectivity_failure_replaces_region_and_drops_chart() {
        let transport = FakeTransport::new().reply(200, payload()).fail("offline");
        let mut dash = dashboard();
        block_on(dash.load_and_render(&transport)).unwrap();
        assert!(dash.has_chart());

        let err = block_on(dash.load_and_render(&transport)).unwrap_err();
        assert!(matches!(err, MetricsError::Connectivity(_)));
        assert_eq!(dash.view().replaced_with, Some(Texts::default().metrics_load_failed));
        assert!(!dash.has_chart());
        assert_eq!(dash.charts().live(), 0);
    }

    #[test]
    fn load_after_failure_renders_again() {
        let transport = FakeTransport::new().fail("offline").reply(200, payload());
        let mut dash = dashboard();
        assert!(block_on(dash.load_and_render(&transport)).is_err());
        block_on(dash.load_and_render(&transport)).unwrap();
        assert_eq!(dash.view().replaced_with, None);
        assert_eq!(dash.view().renders_started, 1);
        assert!(dash.view().kpis.is_some());
    }

    #[test]
    fn malformed_snapshot_renders_nothing() {
        let transport = FakeTransport::new().reply(200, json!({"total_messages": 3}));
        let mut dash = dashboard();
        let err = block_on(dash.load_and_render(&transport)).unwrap_err();
        assert!(matches!(err, MetricsError::Decode(_)));
        assert_eq!(dash.view().renders_started, 0);
        assert!(dash.charts().created.is_empty());
        assert!(dash.view().replaced_with.is_some());
    }

    #[test]
    fn chart_failure_is_surfaced_after_table() {
        let transport = FakeTransport::new().reply(200, payload());
        let mut charts = CountingCharts::default();
        charts.fail_next = true;
        let mut dash = MetricsDashboard::new("http://api/metrics", Texts::default(), RecordingDashboard::default(), charts);

        let err = block_on(dash.load_and_render(&transport)).unwrap_err();
        assert!(matches!(err, MetricsError::Chart(_)));
        assert!(dash.view().table.is_some());
        assert_eq!(dash.view().errors, vec![Texts::default().metrics_load_failed]);
    }

    #[test]
    fn fractional_average_keeps_precision() {
        let mut body = payload();
        body["average_response_time_ms"] = json!(812.5);
        let snapshot: MetricsSnapshot = ApiResponse::new(200, body).decode().unwrap();
        assert_eq!(kpis(&Texts::default(), &snapshot).average_response_time, "812.5 ms");
    }

    #[test]
    fn late_response_of_superseded_load_is_dropped() {
        let mut dash = dashboard();
        let older = dash.request();
        let newer = dash.request();
        assert!(newer.seq() > older.seq());

        let mut fresh = payload();
        fresh["total_messages"] = json!(50);
        dash.render(&newer, Ok(ApiResponse::new(200, fresh))).unwrap();
        dash.render(&older, Ok(ApiResponse::new(200, payload()))).unwrap();
        dash.render(&older, Err(TransportError::Network("late".into()))).unwrap();

        assert_eq!(dash.view().kpis.as_ref().map(|k| k.total_messages.as_str()), Some("50"));
        assert_eq!(dash.view().replaced_with, None);
        assert_eq!(dash.charts().created.len(), 1);
        assert_eq!(dash.charts().live(), 1);
    }
}
