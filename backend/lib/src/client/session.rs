use tokio::sync::watch;

use crate::models::Profile;

#[derive(Debug, Clone, Default)]
struct Session {
    profile: Option<Profile>,
    /// Times the session went from holding a token to holding none
    revocations: u64,
}

impl Session {
    fn has_nft(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::has_nft)
    }

    fn replace(&mut self, profile: Option<Profile>) {
        let had_nft = self.has_nft();
        self.profile = profile;
        if had_nft && !self.has_nft() {
            self.revocations += 1;
        }
    }
}

/// Profile of the connected wallet, owned by the login coordinator
///
/// Everything else observes it through a [`ProfileView`].
#[derive(Debug)]
pub struct SessionState {
    session: watch::Sender<Session>,
}

impl SessionState {
    pub fn new() -> Self {
        let (session, _) = watch::channel(Session::default());
        Self { session }
    }

    pub(crate) fn publish(&self, profile: Profile) {
        self.session.send_modify(|session| session.replace(Some(profile)));
    }

    pub(crate) fn clear(&self) {
        self.session.send_if_modified(|session| {
            let had_profile = session.profile.is_some();
            session.replace(None);
            had_profile
        });
    }

    pub fn current(&self) -> Option<Profile> {
        self.session.borrow().profile.clone()
    }

    pub fn subscribe(&self) -> ProfileView {
        ProfileView {
            session: self.session.subscribe(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle on the session profile
#[derive(Debug, Clone)]
pub struct ProfileView {
    session: watch::Receiver<Session>,
}

impl ProfileView {
    pub fn current(&self) -> Option<Profile> {
        self.session.borrow().profile.clone()
    }

    pub fn has_nft(&self) -> bool {
        self.session.borrow().has_nft()
    }

    /// How many times the session lost its last token, by disconnect or refresh
    ///
    /// Anything granted to a holder must be withdrawn once this moves.
    pub fn revocations(&self) -> u64 {
        self.session.borrow().revocations
    }

    /// Wait for the next change of the profile
    ///
    /// Returns `false` once the session is gone.
    pub async fn changed(&mut self) -> bool {
        self.session.changed().await.is_ok()
    }
}
