mod definition_error;
mod engine_error;
mod frame_store_error;
mod recording_error;
mod replay_error;

pub use definition_error::*;
pub use engine_error::*;
pub use frame_store_error::*;
pub use recording_error::*;
pub use replay_error::*;
