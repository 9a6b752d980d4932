pub mod cancel;
pub mod error;
pub mod types;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use types::*;
