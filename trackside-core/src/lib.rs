pub mod color;
pub mod event;
pub mod penalty;
pub mod snapshot;
pub mod sport;
pub mod team;
pub mod validate;
