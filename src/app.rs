//! the chat page: session gate + exchange controller over one view.

use tracing::info;

use crate::api::{ApiResponse, Transport};
use crate::chat::{ChatController, ChatView, PendingTurn};
use crate::config::{ClientConfig, Texts, fill};
use crate::error::{ChatError, LoginError, TransportError};
use crate::session::{Identity, PendingLogin, SessionManager};
use crate::storage::KeyValueStore;

pub struct ChatApp<S, V> {
    session: SessionManager<S>,
    chat: ChatController,
    view: V,
    texts: Texts,
}

impl<S: KeyValueStore, V: ChatView> ChatApp<S, V> {
    pub fn new(config: &ClientConfig, store: S, view: V) -> Self {
        Self {
            session: SessionManager::from_config(config, store),
            chat: ChatController::from_config(config),
            view,
            texts: config.texts.clone(),
        }
    }

    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// page load: a persisted identity opens the gate straight away.
    pub fn on_load(&mut self) -> Option<Identity> {
        let identity = self.session.restore_session()?;
        self.view.reveal_chat();
        let greeting = fill(&self.texts.greeting_back, "name", &identity.display_name);
        self.chat.say(&mut self.view, greeting);
        Some(identity)
    }

    /// login form submitted. local failures are surfaced here and yield no
    /// request.
    pub fn submit_login(&mut self, display_name: &str, id_number: &str) -> Result<PendingLogin, LoginError> {
        self.session
            .begin_login(display_name, id_number)
            .inspect_err(|err| self.surface_login_error(err))
    }

    pub fn finish_login(&mut self, outcome: Result<ApiResponse, TransportError>) -> Result<Identity, LoginError> {
        match self.session.complete_login(outcome) {
            Ok(identity) => {
                self.view.reveal_chat();
                let greeting = fill(&self.texts.greeting_new, "name", &identity.display_name);
                self.chat.say(&mut self.view, greeting);
                Ok(identity)
            }
            Err(err) => {
                self.surface_login_error(&err);
                Err(err)
            }
        }
    }

    pub async fn login<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        display_name: &str,
        id_number: &str,
    ) -> Result<Identity, LoginError> {
        let pending = self.submit_login(display_name, id_number)?;
        let outcome = pending.send(transport).await;
        self.finish_login(outcome)
    }

    /// chat form submitted.
    pub fn submit_turn(&mut self, text: &str) -> Result<PendingTurn, ChatError> {
        let identity = self.session.identity();
        self.chat.begin_turn(&mut self.view, identity, text)
    }

    /// applies a settled turn, if any.
    pub fn settle_turn(&mut self) -> bool {
        self.chat.drain(&mut self.view)
    }

    pub async fn send_turn<T: Transport + ?Sized>(&mut self, transport: &T, text: &str) -> Result<(), ChatError> {
        let turn = self.submit_turn(text)?;
        turn.run(transport).await;
        self.settle_turn();
        Ok(())
    }

    fn surface_login_error(&mut self, err: &LoginError) {
        let text = match err {
            LoginError::Validation(_) => self.texts.login_missing_fields.clone(),
            LoginError::InProgress => self.texts.login_in_progress.clone(),
            LoginError::Server(Some(message)) => fill(&self.texts.login_server_error, "error", message),
            LoginError::Server(None) => self.texts.login_generic_error.clone(),
            LoginError::Connectivity(_) => self.texts.login_connectivity.clone(),
            LoginError::Storage(_) => self.texts.login_storage.clone(),
        };
        info!(target: "lenny_web", "login notice: {}", err);
        self.view.notify(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use crate::storage::MemoryStore;
    use crate::testing::{FakeTransport, RecordingChatView};
    use pollster::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn app(store: MemoryStore) -> ChatApp<MemoryStore, RecordingChatView> {
        ChatApp::new(&ClientConfig::default(), store, RecordingChatView::default())
    }

    fn stored_ana() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.set("user_nombre", "Ana").unwrap();
        store.set("user_cedula", "123").unwrap();
        store
    }

    #[test]
    fn login_unlocks_chat_and_greets_by_name() {
        let transport = FakeTransport::new().reply(200, json!({"user": {"nombre": "Ana", "cedula": "123"}}));
        let mut app = app(MemoryStore::new());
        assert_eq!(app.on_load(), None);
        assert!(!app.view().revealed);

        block_on(app.login(&transport, "Ana", "123")).unwrap();
        assert!(app.view().revealed);
        let greeting = &app.chat().transcript().messages()[0];
        assert_eq!(greeting.sender, crate::chat::Sender::Bot);
        assert!(greeting.text.contains("Ana"));
        assert!(app.view().notices.is_empty());
    }

    #[test]
    fn restored_session_skips_login() {
        let mut app = app(stored_ana());
        let identity = app.on_load().unwrap();
        assert_eq!(identity.display_name, "Ana");
        assert!(app.view().revealed);
        assert_eq!(
            app.chat().transcript().messages(),
            &[Message::bot("¡Hola de nuevo, Ana! ¿Cómo puedo asistirte?")]
        );
    }

    #[test]
    fn failed_login_keeps_gate_closed() {
        let transport = FakeTransport::new()
            .reply(400, json!({"error": "Cédula y nombre son requeridos"}))
            .fail("offline");
        let mut app = app(MemoryStore::new());

        assert!(block_on(app.login(&transport, "Ana", "123")).is_err());
        assert!(block_on(app.login(&transport, "Ana", "123")).is_err());
        assert!(block_on(app.login(&transport, "", "123")).is_err());

        assert!(!app.view().revealed);
        assert_eq!(
            app.view().notices,
            vec![
                "Error: Cédula y nombre son requeridos".to_string(),
                Texts::default().login_connectivity,
                Texts::default().login_missing_fields,
            ]
        );
        assert_eq!(transport.calls().len(), 2);
        assert!(app.session().store().is_empty());
    }

    #[test]
    fn chat_turn_after_restore() {
        let transport = FakeTransport::new().reply(200, json!({"response": "¡Hola!"}));
        let mut app = app(stored_ana());
        app.on_load();
        block_on(app.send_turn(&transport, "Hola")).unwrap();

        let messages = &app.chat().transcript().messages()[1..];
        assert_eq!(messages, &[Message::user("Hola"), Message::bot("¡Hola!")]);
        assert!(!app.view().typing);
    }

    #[test]
    fn chat_before_login_is_a_session_error() {
        let transport = FakeTransport::new();
        let mut app = app(MemoryStore::new());
        app.on_load();
        assert_eq!(block_on(app.send_turn(&transport, "Hola")).unwrap_err(), ChatError::NoSession);
        assert_eq!(app.view().notices, vec![Texts::default().session_missing]);
        assert!(transport.calls().is_empty());
    }
}
