use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "bot")]
    Bot,
}

/// A single turn in the transcript. Fields are private so a message
/// can't be edited once it has been created.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    text: String,
    sender: Sender,
}

impl Message {
    pub fn new(sender: Sender, text: &str) -> Self {
        Self {
            text: text.to_string(),
            sender,
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: &str) -> Self {
        Self::new(Sender::Bot, text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }
}

/// Request body sent to the chat endpoint
#[derive(Serialize, Deserialize, Debug)]
pub struct ChatQuery {
    pub query: String,
}

/// Successful reply body from the chat endpoint
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ChatReply {
    pub response: String,
}
