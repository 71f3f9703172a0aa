// Library root: exposes the app modules to the binary and integration tests.

pub mod app;
pub mod config;
pub mod fpl;
pub mod protocol;
pub mod source;
pub mod summary;
