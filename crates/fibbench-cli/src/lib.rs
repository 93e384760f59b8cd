//! # fibbench-cli
//!
//! Report tables, JSON export, styled messages and shell completion.

pub mod completion;
pub mod export;
pub mod output;
pub mod presenter;
pub mod ui;

pub use presenter::CLIResultPresenter;
