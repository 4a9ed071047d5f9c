pub mod cloneperms;
pub mod speaker;
pub mod stealemoji;

pub use cloneperms::*;
pub use speaker::*;
pub use stealemoji::*;
