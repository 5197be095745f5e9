//! In-memory conversation state

use gemchat_core::{Error, Message, Part, Result};

/// Ordered log of messages.
///
/// Order is append order. Messages are only ever removed all at once by
/// [`MessageStore::reset`].
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message at the end; its id must not already be present
    pub fn append(&mut self, message: Message) -> Result<()> {
        if self.get(&message.id).is_some() {
            return Err(Error::DuplicateId(message.id));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Replace the parts of a message, keeping its position, id, role and timestamp
    pub fn update_by_id(&mut self, id: &str, parts: Vec<Part>) -> Result<()> {
        // Search from the newest: updates target the streaming message
        let message = self
            .messages
            .iter_mut()
            .rev()
            .find(|message| message.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        message.parts = parts;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Everything the presentation layer needs to draw the conversation
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub store: MessageStore,
    /// True from send initiation until the stream settles
    pub is_loading: bool,
    /// Session-level error shown as a banner
    pub error: Option<String>,
}

impl ConversationState {
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// Clear messages, loading flag and error ("new chat")
    pub fn reset(&mut self) {
        self.store.reset();
        self.is_loading = false;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemchat_core::Role;

    fn text_message(role: Role, text: &str) -> Message {
        Message::new(role, vec![Part::text(text)])
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = MessageStore::new();
        let first = text_message(Role::User, "one");
        let second = text_message(Role::Model, "two");
        store.append(first.clone()).unwrap();
        store.append(second.clone()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].id, first.id);
        assert_eq!(store.last().unwrap().id, second.id);
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let mut store = MessageStore::new();
        let message = text_message(Role::User, "one");
        store.append(message.clone()).unwrap();

        match store.append(message.clone()) {
            Err(Error::DuplicateId(id)) => assert_eq!(id, message.id),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_by_id_replaces_parts_only() {
        let mut store = MessageStore::new();
        let user = text_message(Role::User, "hi");
        let model = text_message(Role::Model, "");
        store.append(user.clone()).unwrap();
        store.append(model.clone()).unwrap();

        store
            .update_by_id(&model.id, vec![Part::text("Hello")])
            .unwrap();

        let updated = store.get(&model.id).unwrap();
        assert_eq!(updated.text(), "Hello");
        assert_eq!(updated.role, Role::Model);
        assert_eq!(updated.timestamp, model.timestamp);
        assert_eq!(store.messages()[1].id, model.id);
        assert_eq!(store.messages()[0], user);
    }

    #[test]
    fn test_update_missing_id() {
        let mut store = MessageStore::new();
        assert!(matches!(
            store.update_by_id("model-missing", vec![Part::text("x")]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut state = ConversationState::default();
        state.store.append(text_message(Role::User, "hi")).unwrap();
        state.is_loading = true;
        state.error = Some("boom".to_string());

        state.reset();

        assert!(state.messages().is_empty());
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }
}
