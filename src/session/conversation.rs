//! Conversation history and the query loop built on it

use crate::error::Result;
use crate::providers::{Message, Role};
use crate::session::client::LlmClient;

/// Ordered message history for one session
///
/// Seeded with the configured prompt. Messages are only ever appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates a conversation seeded with a system prompt and examples
    ///
    /// # Examples
    ///
    /// ```
    /// use shellq::providers::Message;
    /// use shellq::session::Conversation;
    ///
    /// let mut conversation = Conversation::new(vec![Message::system("be brief")]);
    /// conversation.push_user("list files");
    /// conversation.push_assistant("```\nls\n```");
    /// assert_eq!(conversation.len(), 3);
    /// assert_eq!(conversation.turns(), 1);
    /// ```
    pub fn new(prompt: Vec<Message>) -> Self {
        Self { messages: prompt }
    }

    /// Appends a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Appends an assistant reply
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages including the seeded prompt
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when there are no messages at all
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of assistant replies, seeded examples included
    pub fn turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count()
    }
}

/// A conversation bound to a client, answering one query at a time
pub struct ConversationSession {
    conversation: Conversation,
    client: LlmClient,
}

impl ConversationSession {
    /// Creates a session seeded with `prompt`
    pub fn new(client: LlmClient, prompt: Vec<Message>) -> Self {
        Self {
            conversation: Conversation::new(prompt),
            client,
        }
    }

    /// Asks one question and records the reply
    ///
    /// The user message is appended before sending. The assistant message is
    /// appended only when the stream completes.
    ///
    /// # Errors
    ///
    /// Propagates configuration and connection errors from the client
    pub async fn query<F>(&mut self, input: &str, on_update: F) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        self.conversation.push_user(input);
        let reply = self
            .client
            .stream_reply(self.conversation.messages(), on_update)
            .await?;
        self.conversation.push_assistant(reply.clone());
        Ok(reply)
    }

    /// History so far
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Provider display name
    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }
}
