// Library root for the squad comparison engine.
//
// Everything here is pure and synchronous: snapshots go in, immutable
// comparison results come out. Fetching and rendering live elsewhere.

pub mod cache;
pub mod differential;
pub mod enrich;
pub mod error;
pub mod gameweek;
pub mod metrics;
pub mod player;
pub mod presenter;
pub mod squad;

pub use error::CoreError;
