use std::sync::Arc;

use checkin_photos::CredentialProvider;
use event_auth::TokenStore;

/// Bearer credentials read from the stored session token
#[derive(Clone)]
pub struct TokenSession {
    store: Arc<dyn TokenStore>,
}

impl TokenSession {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn is_logged_in(&self) -> bool {
        self.bearer_token().is_some()
    }
}

impl CredentialProvider for TokenSession {
    fn bearer_token(&self) -> Option<String> {
        match self.store.get_token() {
            Ok(token) => token.map(|t| t.token).filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Could not read session token: {}", e);
                None
            }
        }
    }
}
