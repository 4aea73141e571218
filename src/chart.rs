//! chart lifecycle.
//!
//! the charting library is opaque: a [`ChartSurface`] turns a [`BarChartSpec`]
//! into a live handle, and the handle must be destroyed before the canvas
//! gets another one. [`ChartSlot`] is the only place that holds a handle, and
//! its only way to install one is destroy-then-create.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::ChartError;

/// horizontal bar chart: one bar per label, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartSpec {
    pub dataset_label: String,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl BarChartSpec {
    /// chart.js configuration object.
    pub fn to_chartjs_config(&self) -> Value {
        json!({
            "type": "bar",
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": self.dataset_label,
                    "data": self.values,
                    "backgroundColor": "rgba(11, 110, 253, 0.7)",
                    "borderColor": "rgba(11, 110, 253, 1)",
                    "borderWidth": 1
                }]
            },
            "options": {
                "indexAxis": "y",
                "scales": { "x": { "beginAtZero": true } },
                "responsive": true,
                "maintainAspectRatio": false
            }
        })
    }
}

pub trait ChartHandle {
    /// releases the rendered instance and whatever it holds on the canvas.
    fn destroy(self);
}

pub trait ChartSurface {
    type Handle: ChartHandle;

    fn create(&mut self, spec: &BarChartSpec) -> Result<Self::Handle, ChartError>;
}

/// owner of the single live chart for one canvas.
#[derive(Debug)]
pub struct ChartSlot<H> {
    live: Option<H>,
}

impl<H> Default for ChartSlot<H> {
    fn default() -> Self {
        Self { live: None }
    }
}

impl<H: ChartHandle> ChartSlot<H> {
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.live.take() {
            debug!(target: "lenny_web", "chart destroyed");
            handle.destroy();
        }
    }

    /// destroys the current chart, then builds the new one. on failure the
    /// slot is left empty.
    pub fn replace<S>(&mut self, surface: &mut S, spec: &BarChartSpec) -> Result<(), ChartError>
    where
        S: ChartSurface<Handle = H>,
    {
        self.release();
        self.live = Some(surface.create(spec)?);
        debug!(target: "lenny_web", "chart created: bars={}", spec.labels.len());
        Ok(())
    }
}
