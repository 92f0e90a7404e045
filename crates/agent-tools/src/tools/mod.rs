//! Built-in tool implementations.

mod email;
mod outreach_knowledge;
mod outreach_memory;
mod telegram;
mod web_search;
mod whatsapp;

pub use email::Email;
pub use outreach_knowledge::OutreachKnowledge;
pub use outreach_memory::OutreachMemory;
pub use telegram::Telegram;
pub use web_search::{ResultParser, SearchHit, WebSearch};
pub use whatsapp::WhatsApp;
