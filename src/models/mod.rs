pub mod announce;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod messages;
pub mod note;
pub mod user;

pub use announce::*;
pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use messages::*;
pub use note::*;
pub use user::*;
