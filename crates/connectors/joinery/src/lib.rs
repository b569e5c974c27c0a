pub mod connector;
pub mod state;

pub use connector::Joinery;
pub use state::{create_state, InitializationError, State};
