pub mod error;
pub mod global_variables;
pub mod io;
pub mod post;
pub mod q4;

pub use error::FemError;
pub use global_variables::*;
