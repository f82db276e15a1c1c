/// Map a Telegram chat id to its backing session id.
///
/// One session per chat: `/reset` deletes this document, a fresh one is
/// created lazily by [`shepherd_session::SessionStore::get_or_create`] on
/// the chat's next message.
pub fn session_id_for_chat(chat_id: i64) -> String {
    format!("tg-{chat_id}")
}
