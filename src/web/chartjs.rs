//! chart.js binding. the library is loaded by the page as the global `Chart`.

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::chart::{BarChartSpec, ChartHandle, ChartSurface};
use crate::error::ChartError;

#[wasm_bindgen]
extern "C" {
    type Chart;

    #[wasm_bindgen(constructor, catch)]
    fn new(canvas: &HtmlCanvasElement, config: &JsValue) -> Result<Chart, JsValue>;

    #[wasm_bindgen(method)]
    fn destroy(this: &Chart);

    #[wasm_bindgen(static_method_of = Chart, js_name = getChart, catch)]
    fn get_chart(canvas: &HtmlCanvasElement) -> Result<Option<Chart>, JsValue>;
}

pub struct ChartJsHandle(Chart);

impl ChartHandle for ChartJsHandle {
    fn destroy(self) {
        self.0.destroy();
    }
}

/// builds charts on the canvas with the given id, looked up per render so a
/// restored dashboard region gets its fresh canvas.
pub struct ChartJsSurface {
    canvas_id: String,
}

impl ChartJsSurface {
    pub fn new(canvas_id: impl Into<String>) -> Self {
        Self { canvas_id: canvas_id.into() }
    }

    fn canvas(&self) -> Result<HtmlCanvasElement, ChartError> {
        let missing = || ChartError::Canvas(format!("#{}", self.canvas_id));
        super::dom::document()
            .map_err(|_| missing())?
            .get_element_by_id(&self.canvas_id)
            .ok_or_else(missing)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| missing())
    }
}

impl ChartSurface for ChartJsSurface {
    type Handle = ChartJsHandle;

    fn create(&mut self, spec: &BarChartSpec) -> Result<ChartJsHandle, ChartError> {
        let canvas = self.canvas()?;
        // a chart made by other page script would still own the canvas
        if let Ok(Some(orphan)) = Chart::get_chart(&canvas) {
            orphan.destroy();
        }
        let config = js_sys::JSON::parse(&spec.to_chartjs_config().to_string())
            .map_err(|e| ChartError::Construct(format!("{e:?}")))?;
        let chart = Chart::new(&canvas, &config).map_err(|e| ChartError::Construct(format!("{e:?}")))?;
        Ok(ChartJsHandle(chart))
    }
}
