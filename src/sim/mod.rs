pub mod event;
pub mod level;
pub mod session;
pub mod snapshot;
pub mod step;
