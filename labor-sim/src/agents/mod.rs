pub mod firm;
pub mod government;
pub mod household;

pub use firm::*;
pub use government::*;
pub use household::*;
