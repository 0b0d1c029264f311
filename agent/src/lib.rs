//! dockhand library
//!
//! Registry push → Telegram approval → single-flight Docker redeploy.

pub mod app;
pub mod deploy;
pub mod docker;
pub mod errors;
pub mod logs;
pub mod registry;
pub mod server;
pub mod telegram;
pub mod utils;
