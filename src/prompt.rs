//! Prompt Assembler: folds extracted attachment text into the conversation

use crate::error::RelayError;
use crate::models::{ChatMessage, ContentPart, MessageContent, MessageRole};

/// Label separating the attachment text from the user's own words
pub const USER_QUERY_MARKER: &str = "User Query:";

/// Build the outgoing message list.
///
/// Non-empty `combined` text is prepended to the latest `user` message only
/// (a new one is appended when the conversation has none). Other messages
/// and non-text parts are left as they came.
pub fn assemble(
    mut messages: Vec<ChatMessage>,
    combined: &str,
) -> Result<Vec<ChatMessage>, RelayError> {
    let combined = combined.trim();

    if !combined.is_empty() {
        match messages.iter_mut().rev().find(|m| m.role == MessageRole::User) {
            Some(message) => prepend_context(&mut message.content, combined),
            None => {
                let mut message = ChatMessage::user(String::new());
                prepend_context(&mut message.content, combined);
                messages.push(message);
            }
        }
    }

    let latest_user_is_empty = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .is_some_and(|m| m.content.is_empty());

    if messages.is_empty() || latest_user_is_empty {
        return Err(RelayError::EmptyMessage);
    }

    Ok(messages)
}

fn with_context(context: &str, query: &str) -> String {
    format!("{}\n\n{}\n{}", context, USER_QUERY_MARKER, query)
}

fn prepend_context(content: &mut MessageContent, context: &str) {
    match content {
        MessageContent::Text(text) => *text = with_context(context, text),
        MessageContent::Parts(parts) => match parts.iter_mut().find(|p| p.is_text()) {
            Some(part) => {
                let query = part.text.take().unwrap_or_default();
                part.text = Some(with_context(context, &query));
            }
            None => parts.insert(0, ContentPart::text(with_context(context, ""))),
        },
    }
}
