//! Client-side session components
//!
//! The login coordinator owns the session profile, the window manager reads it.

pub mod api;
pub mod coordinator;
pub mod session;
pub mod wallet;
pub mod windows;

pub use api::{AuthApi, HttpAuthApi};
pub use coordinator::{AuthCoordinator, AuthState, LoginError, LoginFailure};
pub use session::{ProfileView, SessionState};
pub use wallet::{LocalWallet, WalletError, WalletSigner};
pub use windows::{Entitlement, WindowId, WindowManager, WindowState};
