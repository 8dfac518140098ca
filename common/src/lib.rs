pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod job;
pub mod mode;
pub mod record;
pub mod runner;
pub mod sweep;
pub mod units;
pub mod util;
