//! Reusable prompts using Handlebars for templating. Strict mode is
//! on so a missing variable fails loudly instead of rendering an
//! empty string.

use std::fmt;

use handlebars::Handlebars;

#[derive(Debug)]
pub enum Prompt {
    ChatSystem,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Prompt> for String {
    fn from(item: Prompt) -> String {
        format!("{:?}", item)
    }
}

const CHAT_SYSTEM_PROMPT: &str = r"
Instructions:
- Answer concisely using the provided context.
- If you don't know, say 'I don't know'.

Context: {{context}}
";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, don't HTML escape the context
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(&Prompt::ChatSystem.to_string(), CHAT_SYSTEM_PROMPT)
        .expect("Failed to register template");
    registry
}
