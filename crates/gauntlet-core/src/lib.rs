pub mod config;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod judge;
pub mod mock;
pub mod prompt;
pub mod providers;
pub mod report;
pub mod result;
pub mod review;
pub mod suite;
pub mod trace;
