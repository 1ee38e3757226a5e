pub mod app;
pub mod config;
pub mod context;
pub mod execution;
pub mod invocation;
pub mod protocol;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod shared;
