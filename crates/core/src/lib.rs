//! Core data types for the rate monitor.

pub mod alert;
pub mod market;
pub mod vault;

pub use alert::*;
pub use market::*;
pub use vault::*;
