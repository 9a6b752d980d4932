pub mod store;

pub use store::{Store, MIGRATOR};
