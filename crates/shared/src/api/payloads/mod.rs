mod user;
pub use user::*;

mod exercise;
pub use exercise::*;

mod greeting;
pub use greeting::*;
