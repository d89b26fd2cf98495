pub mod breathe;
pub mod config;
pub mod focus;
pub mod history;
pub mod session;
pub mod stats;
pub mod task;
