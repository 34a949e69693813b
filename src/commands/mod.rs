//! On-demand chat commands
//!
//! - [`news`] - "news for game X", delivered through the shared gate
//! - [`cooldown`] - per-requester rate limiting for those requests

pub mod cooldown;
pub mod news;

pub use cooldown::CooldownBook;
pub use news::{NewsReport, NewsRequestHandler, RequestError};
