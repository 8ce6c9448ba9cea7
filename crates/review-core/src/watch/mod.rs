pub mod engine;
pub mod error;
pub mod state;

pub use engine::Watcher;
pub use error::WatchError;
pub use state::{CycleOutcome, WatchPhase, WatchState};
