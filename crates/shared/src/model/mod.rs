mod user;
pub use user::*;

mod exercise;
pub use exercise::*;

#[cfg(feature = "backend")]
mod service_version;
#[cfg(feature = "backend")]
pub use service_version::*;

pub use crate::validation::ValidateModel;
