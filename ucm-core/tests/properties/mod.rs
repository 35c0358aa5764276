//! Property-based tests for the UCM core library

mod config_tests;
mod favorites_tests;
mod filter_tests;
mod focus_tests;
mod history_tests;
mod list_tests;
