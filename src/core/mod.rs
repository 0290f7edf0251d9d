pub mod error;

pub use error::{PinError, Result};
