pub mod cli;

pub mod db;

pub mod identity;

mod caller;
pub use caller::*;

mod json;
pub use json::*;

mod params;
pub use params::*;

mod state;
pub use state::*;

pub mod routes;
