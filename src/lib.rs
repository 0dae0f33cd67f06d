pub mod batch;
pub mod clock;
pub mod config;
pub mod event_log;
pub mod export;
pub mod fetch;
pub mod history;
pub mod identifier;
pub mod input;
