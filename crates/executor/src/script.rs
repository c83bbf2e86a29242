//! Script wrapping.
//!
//! Both the optional inject script and every test script are evaluated
//! through the same envelope; only the consumer of the result differs.

/// Wrap a raw script body in an asynchronous evaluation envelope.
///
/// The produced expression runs `source` inside an async function body, so
/// the script may `await` internally, and its return value or any
/// thrown/rejected error surfaces to the evaluation call once the body
/// settles. Pure string transformation; no evaluation happens here.
pub fn wrap_async(source: &str) -> String {
    format!(
        "\
(async () => {{
{source}
}})()"
    )
}
