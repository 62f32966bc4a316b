pub mod error;
pub mod outcome;
pub mod service;
pub mod todo;

pub use error::*;
pub use outcome::*;
pub use service::*;
pub use todo::*;
