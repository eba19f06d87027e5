pub mod announce;
pub mod diagnostics;
pub mod health;

pub use announce::*;
pub use diagnostics::*;
pub use health::*;
