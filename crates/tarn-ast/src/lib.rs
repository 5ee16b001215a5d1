mod loc;
pub use loc::{Location, Position};

pub mod abt;
pub mod raw;
