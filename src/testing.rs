//! fakes shared by the unit tests.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Mutex;

use serde_json::Value;

use crate::api::{ApiResponse, Transport};
use crate::chart::{BarChartSpec, ChartHandle, ChartSurface};
use crate::chat::{ChatView, Message};
use crate::error::{ChartError, TransportError};
use crate::metrics::{DashboardView, IntentTable, Kpis};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

/// scripted transport: pops one queued outcome per request, records calls.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: Value) -> Self {
        self.replies.lock().unwrap().push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(self, reason: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Network(reason.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> Result<ApiResponse, TransportError> {
        self.calls.lock().unwrap().push(call);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".into())))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse, TransportError> {
        self.next(Call { method: "GET", url: url.to_string(), body: None })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        self.next(Call { method: "POST", url: url.to_string(), body: Some(body.clone()) })
    }
}

#[derive(Debug, Default)]
pub struct RecordingChatView {
    pub revealed: bool,
    pub messages: Vec<Message>,
    pub typing: bool,
    pub typing_toggles: usize,
    pub input_cleared: usize,
    pub notices: Vec<String>,
}

impl ChatView for RecordingChatView {
    fn reveal_chat(&mut self) {
        self.revealed = true;
    }
    fn append_message(&mut self, message: &Message) {
        self.messages.push(message.clone());
    }
    fn set_typing(&mut self, visible: bool) {
        self.typing = visible;
        self.typing_toggles += 1;
    }
    fn clear_input(&mut self) {
        self.input_cleared += 1;
    }
    fn notify(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}

#[derive(Debug, Default)]
pub struct RecordingDashboard {
    pub kpis: Option<Kpis>,
    pub table: Option<IntentTable>,
    pub errors: Vec<String>,
    pub replaced_with: Option<String>,
    pub renders_started: usize,
}

impl DashboardView for RecordingDashboard {
    fn begin_render(&mut self) {
        self.renders_started += 1;
        self.replaced_with = None;
    }
    fn set_kpis(&mut self, kpis: &Kpis) {
        self.kpis = Some(kpis.clone());
    }
    fn replace_intents(&mut self, table: &IntentTable) {
        self.table = Some(table.clone());
    }
    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
    fn replace_with_error(&mut self, message: &str) {
        self.kpis = None;
        self.table = None;
        self.replaced_with = Some(message.to_string());
    }
}

/// counts live chart instances so tests can assert destroy-before-create.
#[derive(Debug, Default)]
pub struct CountingCharts {
    pub live: Rc<Cell<usize>>,
    pub created: Vec<BarChartSpec>,
    pub fail_next: bool,
}

impl CountingCharts {
    pub fn live(&self) -> usize {
        self.live.get()
    }
}

#[derive(Debug)]
pub struct CountedChart {
    live: Rc<Cell<usize>>,
}

impl ChartHandle for CountedChart {
    fn destroy(self) {
        self.live.set(self.live.get() - 1);
    }
}

impl ChartSurface for CountingCharts {
    type Handle = CountedChart;

    fn create(&mut self, spec: &BarChartSpec) -> Result<CountedChart, ChartError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(ChartError::Construct("Chart is not defined".into()));
        }
        // a second live instance on one canvas is the bug we guard against
        assert_eq!(self.live.get(), 0, "chart created while another is live");
        self.live.set(self.live.get() + 1);
        self.created.push(spec.clone());
        Ok(CountedChart { live: self.live.clone() })
    }
}
