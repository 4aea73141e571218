//! lenny_web: browser client for the lenny ai assistant.
//!
//! - session gate: restores or establishes a `{nombre, cedula}` identity,
//!   persisted in the browser's key-value store.
//! - chat exchange: one user turn -> one `/chat` call -> one reply, with a
//!   typing indicator and at most one turn in flight.
//! - metrics dashboard: one `/metrics` snapshot rendered as kpis, an intents
//!   table and a horizontal bar chart; every load supersedes the last.
//!
//! the controllers only talk to trait seams (`Transport`, `KeyValueStore`,
//! `ChatView`, `DashboardView`, `ChartSurface`). on wasm the `web` module
//! implements them with the dom, `localStorage`, fetch and chart.js; on
//! native the `native` module provides a `ureq` transport driven by a small
//! tokio runtime.

pub mod api;
pub mod app;
pub mod chart;
pub mod chat;
pub mod config;
pub mod error;
pub mod metrics;
pub mod session;
pub mod storage;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
mod testing;

pub use api::{ApiResponse, Transport};
pub use app::ChatApp;
pub use chart::{BarChartSpec, ChartHandle, ChartSlot, ChartSurface};
pub use chat::{ChatController, ChatView, Message, PendingTurn, Sender, Transcript, TurnOutcome};
pub use config::{ClientConfig, Texts};
pub use error::{ChartError, ChatError, ConfigError, LoginError, MetricsError, StorageError, TransportError};
pub use metrics::{DashboardView, IntentRow, IntentTable, Kpis, MetricsDashboard, MetricsSnapshot, PendingLoad};
pub use session::{Identity, PendingLogin, SessionManager, SessionState};
pub use storage::{KeyValueStore, MemoryStore};
