//! Chat history and live chat delivery.

use backend_core::{Direction, Fields, Query};
use futures::stream::{BoxStream, StreamExt};
use tracing::error;

use crate::advisor::Advisor;
use crate::backend::Backend;
use crate::documents;
use crate::error::{Result, ServiceError};
use crate::models::{fields, ChatMessage, EntityKind, NewChatMessage};
use crate::subscription::Subscription;

/// The standing query behind a user's conversation: oldest first.
pub fn chat_query(user_id: &str) -> Query {
    documents::owned_query(
        EntityKind::ChatMessage,
        user_id,
        fields::TIMESTAMP,
        Direction::Ascending,
    )
}

/// The user's conversation, oldest first.
pub async fn get_chat_history(backend: &Backend, user_id: &str) -> Result<Vec<ChatMessage>> {
    documents::list(backend, &chat_query(user_id)).await
}

pub async fn add_chat_message(
    backend: &Backend,
    user_id: &str,
    message: &NewChatMessage,
) -> Result<String> {
    documents::insert_owned(
        backend,
        EntityKind::ChatMessage,
        user_id,
        message,
        Fields::new(),
        &[fields::TIMESTAMP],
    )
    .await
}

/// Stream the user's conversation: the current messages, then the full
/// list again after every change.
pub async fn watch_chat_messages(
    backend: &Backend,
    user_id: &str,
) -> Result<BoxStream<'static, Result<Vec<ChatMessage>>>> {
    let snapshots = backend.documents().listen(chat_query(user_id)).await?;
    Ok(snapshots
        .map(|snapshot| -> Result<Vec<ChatMessage>> {
            let docs = snapshot?;
            documents::decode_all(&docs)
        })
        .boxed())
}

/// Invoke `on_change` with the full conversation after every change.
///
/// Delivery is asynchronous; the first call carries the current messages.
/// Snapshots that fail to load or decode never reach `on_change`: they are
/// logged at error level and skipped. Use
/// [`subscribe_to_chat_messages_with_errors`] to observe them.
pub async fn subscribe_to_chat_messages<F>(
    backend: &Backend,
    user_id: &str,
    on_change: F,
) -> Result<Subscription>
where
    F: FnMut(Vec<ChatMessage>) + Send + 'static,
{
    let owner = user_id.to_string();
    subscribe_to_chat_messages_with_errors(backend, user_id, on_change, move |e| {
        error!("Chat subscription for {} failed to load: {}", owner, e);
    })
    .await
}

/// Like [`subscribe_to_chat_messages`], but hands failed snapshots to
/// `on_error`. Delivery continues after an error.
pub async fn subscribe_to_chat_messages_with_errors<F, E>(
    backend: &Backend,
    user_id: &str,
    mut on_change: F,
    mut on_error: E,
) -> Result<Subscription>
where
    F: FnMut(Vec<ChatMessage>) + Send + 'static,
    E: FnMut(ServiceError) + Send + 'static,
{
    let snapshots = watch_chat_messages(backend, user_id).await?;
    Ok(Subscription::for_each(snapshots, move |snapshot| match snapshot {
        Ok(messages) => on_change(messages),
        Err(e) => on_error(e),
    }))
}

/// Store the user's message and the advisor's reply. Returns both ids.
pub async fn send_with_reply(
    backend: &Backend,
    advisor: &Advisor,
    user_id: &str,
    content: &str,
) -> Result<(String, String)> {
    let question = add_chat_message(backend, user_id, &NewChatMessage::from_user(content.trim())).await?;
    let reply = advisor.respond(content).await;
    let answer = add_chat_message(backend, user_id, &reply).await?;
    Ok((question, answer))
}
