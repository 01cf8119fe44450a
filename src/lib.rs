// Library surface for the binary and the integration tests.
pub mod analyzer;
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod frame;
pub mod identity;
pub mod leaderboard;
pub mod platform;
pub mod rank;
pub mod runtime;
pub mod session;
pub mod store;
pub mod ui;
pub mod util;

pub use error::{Error, Result};
