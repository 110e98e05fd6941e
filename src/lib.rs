pub mod calls;
pub mod types;

pub use calls::{CallService, CallServiceHandle};
pub use types::peer::PeerId;
