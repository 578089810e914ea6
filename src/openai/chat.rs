use anyhow::{Error, Result, anyhow};

use crate::openai::{Message, Role, completion};

/// Answers a single query with no prior history. The system message
/// sets up the instructions and any context for the answer.
pub async fn chat(
    system_message: &str,
    query: &str,
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<Message, Error> {
    let history = vec![
        Message::new(Role::System, system_message),
        Message::new(Role::User, query),
    ];

    let resp = completion(&history, api_hostname, api_key, model).await?;

    let content = resp["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(anyhow!("No message received. Resp:\n\n {}", resp))?;

    tracing::debug!("Completion received for query: {}", query);

    Ok(Message::new(Role::Assistant, content))
}
