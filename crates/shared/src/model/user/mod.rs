mod role;
pub use role::*;

mod user;
pub use user::*;

mod new;
pub use new::*;
