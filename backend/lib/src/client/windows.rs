//! Window state of the desktop UI
//!
//! Windows are opened, minimized and closed independently. Some of them are
//! reserved to token holders; opening those without holding a token is a
//! silent no-op.

use std::collections::HashMap;

use tracing::debug;

use super::session::ProfileView;
use crate::models::Profile;

/// Who may open a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Everyone,
    NftHolder,
}

impl Entitlement {
    pub fn allows(self, profile: Option<&Profile>) -> bool {
        match self {
            Entitlement::Everyone => true,
            Entitlement::NftHolder => profile.is_some_and(Profile::has_nft),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowId {
    Gallery,
    Profile,
    Holders,
    MyNfts,
}

impl WindowId {
    pub const ALL: [WindowId; 4] = [
        WindowId::Gallery,
        WindowId::Profile,
        WindowId::Holders,
        WindowId::MyNfts,
    ];

    pub fn entitlement(self) -> Entitlement {
        match self {
            WindowId::Gallery | WindowId::Profile => Entitlement::Everyone,
            WindowId::Holders | WindowId::MyNfts => Entitlement::NftHolder,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowState {
    #[default]
    Closed,
    Open,
    Minimized,
}

/// Open windows and the selected icon of one desktop
///
/// Holder windows only stay open while the session keeps a token. Once the
/// session loses it they read as closed, and they stay closed even if a
/// token comes back.
pub struct WindowManager {
    profile: ProfileView,
    windows: HashMap<WindowId, WindowState>,
    selected: Option<WindowId>,
    /// Revocation count the holder windows were opened under
    granted_at: u64,
}

impl WindowManager {
    pub fn new(profile: ProfileView) -> Self {
        let granted_at = profile.revocations();

        Self {
            profile,
            windows: HashMap::new(),
            selected: None,
            granted_at,
        }
    }

    fn entitled(&self, id: WindowId) -> bool {
        id.entitlement().allows(self.profile.current().as_ref())
    }

    /// Whether `id` may currently be shown as it was left
    fn visible(&self, id: WindowId) -> bool {
        match id.entitlement() {
            Entitlement::Everyone => true,
            Entitlement::NftHolder => {
                self.profile.revocations() == self.granted_at && self.entitled(id)
            }
        }
    }

    /// Close holder windows revoked since the last change
    fn sync(&mut self) {
        let revocations = self.profile.revocations();
        if revocations == self.granted_at {
            return;
        }

        self.windows
            .retain(|id, _| id.entitlement() == Entitlement::Everyone);
        if self
            .selected
            .is_some_and(|id| id.entitlement() != Entitlement::Everyone)
        {
            self.selected = None;
        }
        self.granted_at = revocations;
        debug!("Closed holder windows after the session lost its tokens");
    }

    /// Open `id`, or restore it if minimized
    ///
    /// Returns whether the window is open afterwards.
    pub fn open(&mut self, id: WindowId) -> bool {
        self.sync();
        if !self.entitled(id) {
            debug!(window = ?id, "Window requires holding a token");
            return false;
        }

        self.windows.insert(id, WindowState::Open);
        true
    }

    pub fn close(&mut self, id: WindowId) {
        self.sync();
        if let Some(state) = self.windows.get_mut(&id) {
            *state = WindowState::Closed;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Minimize `id` if it is open
    pub fn minimize(&mut self, id: WindowId) -> bool {
        self.sync();
        if !self.visible(id) {
            return false;
        }
        match self.windows.get_mut(&id) {
            Some(state) if *state == WindowState::Open => {
                *state = WindowState::Minimized;
                true
            }
            _ => false,
        }
    }

    /// Select the icon of `id`; holder icons need a token
    pub fn select(&mut self, id: WindowId) -> bool {
        self.sync();
        if !self.entitled(id) {
            debug!(window = ?id, "Icon requires holding a token");
            return false;
        }

        self.selected = Some(id);
        true
    }

    pub fn selected(&self) -> Option<WindowId> {
        self.selected.filter(|id| self.visible(*id))
    }

    pub fn state(&self, id: WindowId) -> WindowState {
        if !self.visible(id) {
            return WindowState::Closed;
        }
        self.windows.get(&id).copied().unwrap_or_default()
    }

    pub fn is_open(&self, id: WindowId) -> bool {
        self.state(id) == WindowState::Open
    }

    /// Windows currently open, minimized ones excluded
    pub fn open_count(&self) -> usize {
        self.windows
            .iter()
            .filter(|(id, state)| **state == WindowState::Open && self.visible(**id))
            .count()
    }

    pub fn reset(&mut self) {
        self.windows.clear();
        self.selected = None;
        self.granted_at = self.profile.revocations();
    }
}
