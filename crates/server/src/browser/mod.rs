//! Browser driver facade over chromiumoxide.

mod page;
mod session;

pub use page::PageDriver;
pub use session::{BrowserSession, LaunchSpec};
