//! Non-interactive commands: `--ask` and `--check`.

use std::io::Write;

use anyhow::Result;
use legal_chat_core::{ChatClient, Conversation, Dispatcher};

/// One exchange without the terminal UI. The reply goes to `out`. Returns
/// false when the question was blank or the request failed.
pub async fn ask_once(
    dispatcher: &dyn Dispatcher,
    question: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    let mut conversation = Conversation::new();
    let Some(question) = conversation.begin(question) else {
        writeln!(err, "Nothing to ask: the question is empty")?;
        return Ok(false);
    };

    let result = dispatcher.ask(&question).await;
    let succeeded = result.is_ok();
    conversation.settle(result);

    if let Some(reply) = conversation.last() {
        writeln!(out, "{}", reply.content())?;
    }

    Ok(succeeded)
}

/// Report whether the backend answers its health endpoint.
pub async fn check_backend(
    client: &ChatClient,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    match client.health().await {
        Ok(health) => {
            writeln!(out, "{}: {} ({})", client.base_url(), health.status, health.message)?;
            Ok(true)
        }
        Err(e) => {
            writeln!(err, "{}: unreachable: {}", client.base_url(), e)?;
            Ok(false)
        }
    }
}
