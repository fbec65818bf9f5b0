//! Order payment state machine and its vocabulary.

mod context;
mod events;
pub mod handlers;
mod machine;
mod state;
mod status;
pub mod table;

pub use context::{ContextOption, TransitionContext};
pub use events::Event;
pub use handlers::{Handler, HandlerError};
pub use machine::OrderMachine;
pub use state::{State, StateOutput};
pub use status::Status;
pub use table::TransitionTable;
