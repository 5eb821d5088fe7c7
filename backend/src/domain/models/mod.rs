pub mod board;
pub mod persistence;

pub use board::*;
pub use persistence::*;
