mod id;
pub use id::*;

mod column;
