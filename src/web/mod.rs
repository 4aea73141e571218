//! browser shell: mounts the chat page and the metrics page.
//!
//! - `start_chat` / `start_metrics` are called by each page's script and
//!   return a handle that owns the page state and its dom listeners.
//! - listeners hold `Weak` refs; dropping (freeing) the handle detaches them.
//! - network work runs in `spawn_local`, never while a `RefCell` borrow is
//!   held, so the page stays interactive while a request is pending.

mod chartjs;
mod dom;
mod fetch;
mod storage;

pub use chartjs::{ChartJsHandle, ChartJsSurface};
pub use dom::{DomChatView, DomDashboard};
pub use fetch::FetchTransport;
pub use storage::LocalStorage;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::info;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, EventTarget};

use crate::app::ChatApp;
use crate::config::ClientConfig;
use crate::metrics::MetricsDashboard;

type SharedChat = Rc<RefCell<ChatApp<LocalStorage, DomChatView>>>;
type SharedDashboard = Rc<RefCell<MetricsDashboard<DomDashboard, ChartJsSurface>>>;

#[wasm_bindgen(start)]
pub fn boot() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    info!(target: "lenny_web", "lenny_web loaded");
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// a registered dom listener, removed again on drop.
struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    /// `submit` handlers always swallow the native form submission.
    fn submit(target: &EventTarget, mut handler: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            ev.prevent_default();
            handler();
        });
        target.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref())?;
        Ok(Self { target: target.clone(), event: "submit", closure })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

#[wasm_bindgen]
pub struct ChatClient {
    app: SharedChat,
    _listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl ChatClient {
    pub fn is_logged_in(&self) -> bool {
        self.app.borrow().session().identity().is_some()
    }

    pub fn is_waiting(&self) -> bool {
        self.app.borrow().chat().is_in_flight()
    }
}

/// mounts the chat page: restores the session, then wires both forms.
#[wasm_bindgen]
pub fn start_chat(config_json: Option<String>) -> Result<ChatClient, JsValue> {
    let config = ClientConfig::from_optional_json(config_json.as_deref()).map_err(js_err)?;
    let store = LocalStorage::open().map_err(js_err)?;
    let view = DomChatView::mount(&config.chat_dom)?;
    let login_form: EventTarget = view.login_form().clone().into();
    let chat_form: EventTarget = view.chat_form().clone().into();

    let app: SharedChat = Rc::new(RefCell::new(ChatApp::new(&config, store, view)));
    let transport = Rc::new(FetchTransport);
    app.borrow_mut().on_load();

    let listeners = vec![
        Listener::submit(&login_form, {
            let app = Rc::downgrade(&app);
            let transport = transport.clone();
            move || on_login(&app, &transport)
        })?,
        Listener::submit(&chat_form, {
            let app = Rc::downgrade(&app);
            move || on_chat(&app, &transport)
        })?,
    ];
    info!(target: "lenny_web", "chat page mounted: api='{}'", config.api_base_url);
    Ok(ChatClient { app, _listeners: listeners })
}

fn on_login(app: &Weak<RefCell<ChatApp<LocalStorage, DomChatView>>>, transport: &Rc<FetchTransport>) {
    let Some(shared) = app.upgrade() else { return };
    let pending = {
        let mut app = shared.borrow_mut();
        let (name, id) = app.view().login_fields();
        app.submit_login(&name, &id)
    };
    let Ok(pending) = pending else { return };

    let weak = app.clone();
    let transport = transport.clone();
    spawn_local(async move {
        let outcome = pending.send(transport.as_ref()).await;
        if let Some(shared) = weak.upgrade() {
            // failures were already surfaced on the view
            let _ = shared.borrow_mut().finish_login(outcome);
        }
    });
}

fn on_chat(app: &Weak<RefCell<ChatApp<LocalStorage, DomChatView>>>, transport: &Rc<FetchTransport>) {
    let Some(shared) = app.upgrade() else { return };
    let turn = {
        let mut app = shared.borrow_mut();
        let text = app.view().message_text();
        app.submit_turn(&text)
    };
    let Ok(turn) = turn else { return };

    let weak = app.clone();
    let transport = transport.clone();
    spawn_local(async move {
        turn.run(transport.as_ref()).await;
        if let Some(shared) = weak.upgrade() {
            shared.borrow_mut().settle_turn();
        }
    });
}

#[wasm_bindgen]
pub struct MetricsClient {
    dashboard: SharedDashboard,
    transport: Rc<FetchTransport>,
}

#[wasm_bindgen]
impl MetricsClient {
    /// fetches a fresh snapshot and re-renders everything.
    pub fn reload(&self) {
        let request = self.dashboard.borrow_mut().request();
        info!(target: "lenny_web", "metrics: GET {}", request.url());
        let weak = Rc::downgrade(&self.dashboard);
        let transport = self.transport.clone();
        spawn_local(async move {
            let outcome = request.send(transport.as_ref()).await;
            if let Some(dashboard) = weak.upgrade() {
                let _ = dashboard.borrow_mut().render(&request, outcome);
            }
        });
    }

    pub fn has_chart(&self) -> bool {
        self.dashboard.borrow().has_chart()
    }
}

/// mounts the dashboard page and loads it once.
#[wasm_bindgen]
pub fn start_metrics(config_json: Option<String>) -> Result<MetricsClient, JsValue> {
    let config = ClientConfig::from_optional_json(config_json.as_deref()).map_err(js_err)?;
    let view = DomDashboard::mount(&config.dashboard_dom)?;
    let charts = ChartJsSurface::new(view.chart_canvas_id());
    let dashboard = MetricsDashboard::from_config(&config, view, charts);

    let client = MetricsClient {
        dashboard: Rc::new(RefCell::new(dashboard)),
        transport: Rc::new(FetchTransport),
    };
    info!(target: "lenny_web", "metrics page mounted: endpoint='{}'", config.metrics_url());
    client.reload();
    Ok(client)
}
