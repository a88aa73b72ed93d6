//! Prompt template management module.
//!
//! ```ignore
//! let prompt = render_chat_system_prompt("Talento Consultores")?;
//! ```

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::context;

use crate::shared::constants::CONTACT_MARKER;

/// Render the persona prompt that leads every chat conversation.
///
/// Rendered once at startup; the result is reused verbatim for every request.
pub fn render_chat_system_prompt(company_name: &str) -> Result<String, TemplateError> {
    render_template(
        "chat/system.jinja",
        context! {
            company_name => company_name,
            contact_marker => CONTACT_MARKER,
        },
    )
}
