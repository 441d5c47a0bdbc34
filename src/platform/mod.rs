//! External extraction capability and its platform adapters

pub mod cookies;
pub mod extractor;
pub mod ytdlp;

pub use cookies::*;
pub use extractor::*;
pub use ytdlp::*;
