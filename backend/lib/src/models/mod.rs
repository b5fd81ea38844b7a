pub mod assets;
pub mod auth;
pub mod profile;
pub mod tier;

pub use assets::*;
pub use auth::*;
pub use profile::*;
pub use tier::*;
