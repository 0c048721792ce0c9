mod kind;
pub use kind::*;

mod exercise;
pub use exercise::*;

mod log;
pub use log::*;

mod statistics;
pub use statistics::*;
