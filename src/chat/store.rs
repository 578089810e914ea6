use super::models::Message;

/// Holds the transcript and the unsent input. No validation happens
/// here, callers decide what gets appended.
#[derive(Debug)]
pub struct ConversationStore {
    transcript: Vec<Message>,
    pending_input: String,
}

impl ConversationStore {
    /// The transcript is never empty, it always starts with the
    /// bot's greeting.
    pub fn new(greeting: &str) -> Self {
        Self {
            transcript: vec![Message::bot(greeting)],
            pending_input: String::new(),
        }
    }

    pub fn append(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub fn snapshot_transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn set_pending_input(&mut self, text: &str) {
        self.pending_input = text.to_string();
    }

    pub fn clear_pending_input(&mut self) {
        self.pending_input.clear();
    }

    pub fn read_pending_input(&self) -> &str {
        &self.pending_input
    }
}
