//! web-sys implementations of the chat and dashboard views.

use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlInputElement, Window};

use crate::chat::{ChatView, Message};
use crate::config::{ChatDomIds, DashboardDomIds};
use crate::metrics::{DashboardView, IntentTable, Kpis};

pub(crate) fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub(crate) fn document() -> Result<Document, JsValue> {
    window()?.document().ok_or_else(|| JsValue::from_str("no document"))
}

fn required(doc: &Document, id: &str) -> Result<Element, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))
}

fn input(doc: &Document, id: &str) -> Result<HtmlInputElement, JsValue> {
    required(doc, id)?
        .dyn_into::<HtmlInputElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not an input")))
}

/// dom calls inside view methods only fail on a broken page; log and go on
fn soft<T>(res: Result<T, JsValue>, what: &str) -> Option<T> {
    res.map_err(|e| warn!(target: "lenny_web", "dom: {} failed: {:?}", what, e)).ok()
}

pub struct DomChatView {
    window: Window,
    document: Document,
    hidden_class: String,
    login_overlay: Element,
    login_form: Element,
    name_input: HtmlInputElement,
    id_input: HtmlInputElement,
    chat_container: Element,
    chat_form: Element,
    message_input: HtmlInputElement,
    messages: Element,
    typing_indicator: Element,
}

impl DomChatView {
    pub fn mount(ids: &ChatDomIds) -> Result<Self, JsValue> {
        let document = document()?;
        Ok(Self {
            window: window()?,
            hidden_class: ids.hidden_class.clone(),
            login_overlay: required(&document, &ids.login_overlay)?,
            login_form: required(&document, &ids.login_form)?,
            name_input: input(&document, &ids.name_input)?,
            id_input: input(&document, &ids.id_input)?,
            chat_container: required(&document, &ids.chat_container)?,
            chat_form: required(&document, &ids.chat_form)?,
            message_input: input(&document, &ids.message_input)?,
            messages: required(&document, &ids.messages)?,
            typing_indicator: required(&document, &ids.typing_indicator)?,
            document,
        })
    }

    pub fn login_form(&self) -> &Element {
        &self.login_form
    }

    pub fn chat_form(&self) -> &Element {
        &self.chat_form
    }

    /// raw (untrimmed) name and id fields.
    pub fn login_fields(&self) -> (String, String) {
        (self.name_input.value(), self.id_input.value())
    }

    pub fn message_text(&self) -> String {
        self.message_input.value()
    }

    fn set_hidden(&self, el: &Element, hidden: bool) {
        soft(el.class_list().toggle_with_force(&self.hidden_class, hidden), "toggle hidden");
    }
}

impl ChatView for DomChatView {
    fn reveal_chat(&mut self) {
        self.set_hidden(&self.login_overlay, true);
        self.set_hidden(&self.chat_container, false);
    }

    fn append_message(&mut self, message: &Message) {
        let Some(el) = soft(self.document.create_element("div"), "create message") else {
            return;
        };
        soft(el.class_list().add_2("msg", message.sender.css_class()), "message class");
        el.set_text_content(Some(&message.text));
        soft(self.messages.append_child(&el), "append message");
        self.messages.set_scroll_top(self.messages.scroll_height());
    }

    fn set_typing(&mut self, visible: bool) {
        self.set_hidden(&self.typing_indicator, !visible);
    }

    fn clear_input(&mut self) {
        self.message_input.set_value("");
    }

    fn notify(&mut self, text: &str) {
        soft(self.window.alert_with_message(text), "alert");
    }
}

pub struct DomDashboard {
    ids: DashboardDomIds,
    document: Document,
    /// container markup at mount, restored after an error replaced it
    template: String,
    replaced: bool,
}

impl DomDashboard {
    pub fn mount(ids: &DashboardDomIds) -> Result<Self, JsValue> {
        let document = document()?;
        let template = required(&document, &ids.container)?.inner_html();
        Ok(Self {
            ids: ids.clone(),
            document,
            template,
            replaced: false,
        })
    }

    pub fn chart_canvas_id(&self) -> &str {
        &self.ids.chart_canvas
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        let el = self.document.get_element_by_id(id);
        if el.is_none() {
            warn!(target: "lenny_web", "dom: missing element #{}", id);
        }
        el
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn error_id(&self) -> String {
        format!("{}-error", self.ids.container)
    }

    fn intent_row(&self, tabular: bool, label: &str, summary: Option<&str>) -> Result<Element, JsValue> {
        let doc = &self.document;
        if tabular {
            let tr = doc.create_element("tr")?;
            let first = doc.create_element("td")?;
            first.set_text_content(Some(label));
            tr.append_child(&first)?;
            match summary {
                Some(summary) => {
                    let second = doc.create_element("td")?;
                    second.set_text_content(Some(summary));
                    tr.append_child(&second)?;
                }
                None => first.set_attribute("colspan", "2")?,
            }
            Ok(tr)
        } else {
            let li = doc.create_element("li")?;
            match summary {
                Some(summary) => {
                    let span = doc.create_element("span")?;
                    span.set_text_content(Some(label));
                    li.append_child(&span)?;
                    li.append_child(&doc.create_text_node(&format!(" {summary}")))?;
                }
                None => li.set_text_content(Some(label)),
            }
            Ok(li)
        }
    }
}

impl DashboardView for DomDashboard {
    fn begin_render(&mut self) {
        if std::mem::take(&mut self.replaced) {
            if let Some(container) = self.by_id(&self.ids.container) {
                container.set_inner_html(&self.template);
            }
        }
        if let Some(stale) = self.document.get_element_by_id(&self.error_id()) {
            stale.remove();
        }
    }

    fn set_kpis(&mut self, kpis: &Kpis) {
        self.set_text(&self.ids.total_messages, &kpis.total_messages);
        self.set_text(&self.ids.unique_users, &kpis.unique_users);
        self.set_text(&self.ids.avg_response_time, &kpis.average_response_time);
    }

    fn replace_intents(&mut self, table: &IntentTable) {
        let Some(list) = self.by_id(&self.ids.intents_list) else {
            return;
        };
        list.set_inner_html("");
        let tabular = matches!(list.tag_name().as_str(), "TBODY" | "TABLE");
        let rows: Vec<(&str, Option<&str>)> = match table {
            IntentTable::Rows(rows) => rows.iter().map(|r| (r.label.as_str(), Some(r.summary.as_str()))).collect(),
            IntentTable::Empty(text) => vec![(text.as_str(), None)],
        };
        for (label, summary) in rows {
            if let Some(row) = soft(self.intent_row(tabular, label, summary), "intent row") {
                soft(list.append_child(&row), "append intent row");
            }
        }
    }

    fn show_error(&mut self, message: &str) {
        let Some(container) = self.by_id(&self.ids.container) else {
            return;
        };
        let id = self.error_id();
        let el = match self.document.get_element_by_id(&id) {
            Some(el) => el,
            None => {
                let Some(el) = soft(self.document.create_element("p"), "create error") else {
                    return;
                };
                el.set_id(&id);
                soft(el.class_list().add_1("metrics-error"), "error class");
                soft(container.prepend_with_node_1(&el), "prepend error");
                el
            }
        };
        el.set_text_content(Some(message));
    }

    fn replace_with_error(&mut self, message: &str) {
        let Some(container) = self.by_id(&self.ids.container) else {
            return;
        };
        container.set_inner_html("");
        if let Some(el) = soft(self.document.create_element("p"), "create error") {
            el.set_id(&self.error_id());
            soft(el.class_list().add_1("metrics-error"), "error class");
            el.set_text_content(Some(message));
            soft(container.append_child(&el), "append error");
        }
        self.replaced = true;
    }
}
