pub mod board;
pub mod projection;
pub mod queue;
pub mod store;

pub use board::*;
pub use projection::*;
pub use queue::*;
pub use store::*;
