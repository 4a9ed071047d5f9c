pub mod info;
pub mod help;

pub use info::*;
pub use help::*;
