//! Core functionality for tubedrop

pub mod formats;
pub mod progress;
pub mod store;
pub mod task;
pub mod video_info;
pub mod worker;

pub use formats::*;
pub use progress::*;
pub use store::*;
pub use task::*;
pub use video_info::*;
pub use worker::*;
