//! client configuration.
//!
//! every field has a default, so pages can pass a partial json object (or
//! nothing at all). user-visible strings live in [`Texts`] so a deployment
//! can translate them without touching code.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://lenny-ai-a9dx.onrender.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// base url for `/login` and `/chat`.
    pub api_base_url: String,
    /// base url for `/metrics`; falls back to `api_base_url`.
    pub metrics_base_url: Option<String>,
    pub storage: StorageKeys,
    /// native transport only; the browser path has no request timeout.
    pub request_timeout_ms: Option<u64>,
    pub texts: Texts,
    pub chat_dom: ChatDomIds,
    pub dashboard_dom: DashboardDomIds,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            metrics_base_url: None,
            storage: StorageKeys::default(),
            request_timeout_ms: None,
            texts: Texts::default(),
            chat_dom: ChatDomIds::default(),
            dashboard_dom: DashboardDomIds::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        info!(target: "lenny_web", "config loaded: api='{}' metrics='{}'",
            config.api_base_url, config.metrics_base());
        Ok(config)
    }

    /// `None` and blank strings both mean "use defaults".
    pub fn from_optional_json(json: Option<&str>) -> Result<Self, ConfigError> {
        match json.map(str::trim) {
            Some(j) if !j.is_empty() => Self::from_json(j),
            _ => Ok(Self::default()),
        }
    }

    pub fn metrics_base(&self) -> &str {
        self.metrics_base_url.as_deref().unwrap_or(&self.api_base_url)
    }

    pub fn login_url(&self) -> String {
        join_url(&self.api_base_url, "login")
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.api_base_url, "chat")
    }

    pub fn metrics_url(&self) -> String {
        join_url(self.metrics_base(), "metrics")
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// browser storage keys for the persisted identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub display_name: String,
    pub id_number: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            display_name: "user_nombre".to_string(),
            id_number: "user_cedula".to_string(),
        }
    }
}

/// every string the client shows to a user.
///
/// placeholders: `{name}` (display name), `{id}` (id number), `{error}`
/// (server-provided message).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Texts {
    pub login_missing_fields: String,
    pub login_in_progress: String,
    pub login_server_error: String,
    pub login_generic_error: String,
    pub login_connectivity: String,
    pub login_storage: String,
    pub greeting_new: String,
    pub greeting_back: String,
    pub session_missing: String,
    pub chat_server_error: String,
    pub chat_generic_error: String,
    pub chat_connectivity: String,
    pub metrics_server_error: String,
    pub metrics_generic_error: String,
    pub metrics_load_failed: String,
    pub metrics_no_data: String,
    pub metrics_row_label: String,
    pub metrics_avg_suffix: String,
    pub chart_dataset_label: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            login_missing_fields: "Por favor, completa ambos campos.".into(),
            login_in_progress: "Iniciando sesión, por favor espera.".into(),
            login_server_error: "Error: {error}".into(),
            login_generic_error: "No se pudo iniciar sesión.".into(),
            login_connectivity: "No se pudo conectar con el servidor. Inténtalo más tarde.".into(),
            login_storage: "No se pudo guardar la sesión en este navegador.".into(),
            greeting_new: "Hola, {name}. Soy Lenny AI. ¿En qué puedo ayudarte hoy?".into(),
            greeting_back: "¡Hola de nuevo, {name}! ¿Cómo puedo asistirte?".into(),
            session_missing: "Error de sesión. Por favor, recarga la página.".into(),
            chat_server_error: "Error: {error}".into(),
            chat_generic_error: "No se pudo obtener respuesta.".into(),
            chat_connectivity: "No se pudo conectar con el servidor. Verifica tu conexión.".into(),
            metrics_server_error: "Error del servidor: {error}".into(),
            metrics_generic_error: "Error del servidor.".into(),
            metrics_load_failed: "No se pudieron cargar las métricas.".into(),
            metrics_no_data: "No hay datos para mostrar.".into(),
            metrics_row_label: "Cédula {id}:".into(),
            metrics_avg_suffix: " ms".into(),
            chart_dataset_label: "Número de Consultas".into(),
        }
    }
}

/// fills a `{key}` placeholder template.
pub fn fill(template: &str, key: &str, value: &str) -> String {
    template.replace(&format!("{{{key}}}"), value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatDomIds {
    pub login_overlay: String,
    pub login_form: String,
    pub name_input: String,
    pub id_input: String,
    pub chat_container: String,
    pub chat_form: String,
    pub message_input: String,
    pub messages: String,
    pub typing_indicator: String,
    /// css class toggled to show/hide the overlay, container and indicator.
    pub hidden_class: String,
}

impl Default for ChatDomIds {
    fn default() -> Self {
        Self {
            login_overlay: "login-overlay".into(),
            login_form: "login-form".into(),
            name_input: "nombre".into(),
            id_input: "cedula".into(),
            chat_container: "chat-container".into(),
            chat_form: "chat-form".into(),
            message_input: "message-input".into(),
            messages: "messages".into(),
            typing_indicator: "typing-indicator".into(),
            hidden_class: "hidden".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardDomIds {
    pub container: String,
    pub total_messages: String,
    pub unique_users: String,
    pub avg_response_time: String,
    pub intents_list: String,
    pub chart_canvas: String,
}

impl Default for DashboardDomIds {
    fn default() -> Self {
        Self {
            container: "metrics-container".into(),
            total_messages: "total-messages".into(),
            unique_users: "unique-users".into(),
            avg_response_time: "avg-response-time".into(),
            intents_list: "user-intents-list".into(),
            chart_canvas: "top-intents-chart".into(),
        }
    }
}
