//! Fix generation: document text + analyzer report -> corrected code.

use crate::{ChatError, ChatMessage, OllamaClient};

const FIX_PROMPT: &str = include_str!("../assets/fix_prompt.md");
const CODE_SLOT: &str = "{{code}}";
const REPORT_SLOT: &str = "{{report}}";

/// Fill the fix prompt with the document text and the raw analyzer report.
///
/// Slots are filled in one left-to-right pass, so slot markers appearing in
/// the code or report are left untouched.
#[must_use]
pub fn build_fix_prompt(code: &str, report: &str) -> String {
    let mut out = String::with_capacity(FIX_PROMPT.len() + code.len() + report.len());
    let mut rest = FIX_PROMPT;
    for (slot, value) in [(CODE_SLOT, code), (REPORT_SLOT, report)] {
        if let Some((head, tail)) = rest.split_once(slot) {
            out.push_str(head);
            out.push_str(value);
            rest = tail;
        }
    }
    out.push_str(rest);
    out
}

/// Ask the model for a corrected version of `code`.
///
/// The reply is returned verbatim; the model is instructed to answer with code only.
pub async fn generate_fixed_code(
    client: &OllamaClient,
    code: &str,
    report: &str,
) -> Result<String, ChatError> {
    let prompt = build_fix_prompt(code, report);
    let reply = client.chat(&[ChatMessage::user(prompt)]).await?;
    tracing::info!(
        model = client.model(),
        reply_bytes = reply.content.len(),
        "Fixed code generated"
    );
    Ok(reply.content)
}
