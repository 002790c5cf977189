pub mod management;
pub mod transfer;

pub use management::*;
pub use transfer::*;
