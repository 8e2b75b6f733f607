use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use log::info;

use crate::SessionError;

/// Wallet session state for the current user.
///
/// The session only ever changes through [`WalletSession::login`] and
/// [`WalletSession::logout`]; everything else reads it. Nothing is persisted,
/// signing out simply drops the in-memory signer.
#[derive(Debug, Default)]
pub struct WalletSession {
    signer: Option<PrivateKeySigner>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the private key and open a session. Returns the account id
    /// (lowercase hex address) the wallet signs as.
    pub fn login(&mut self, private_key: &str) -> Result<String, SessionError> {
        if self.signer.is_some() {
            return Err(SessionError::AlreadySignedIn);
        }
        let signer = PrivateKeySigner::from_str(private_key.trim())?;
        let account_id = signer.address().to_string().to_lowercase();
        info!("Wallet session opened for {account_id}");
        self.signer = Some(signer);
        Ok(account_id)
    }

    pub fn logout(&mut self) {
        if let Some(account_id) = self.account_id() {
            info!("Wallet session closed for {account_id}");
        }
        self.signer = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.signer.is_some()
    }

    pub fn account_id(&self) -> Option<String> {
        self.signer
            .as_ref()
            .map(|s| s.address().to_string().to_lowercase())
    }

    pub fn signer(&self) -> Result<PrivateKeySigner, SessionError> {
        self.signer.clone().ok_or(SessionError::NotSignedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // anvil default key 0
    const ALICE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ALICE_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn login_derives_account_id() {
        let mut session = WalletSession::new();
        assert!(!session.is_signed_in());

        let account_id = session.login(ALICE_KEY).expect("valid key");
        assert_eq!(account_id, ALICE_ADDRESS);
        assert!(session.is_signed_in());
        assert_eq!(session.account_id().as_deref(), Some(ALICE_ADDRESS));
    }

    #[test]
    fn login_twice_is_rejected() {
        let mut session = WalletSession::new();
        session.login(ALICE_KEY).expect("valid key");
        let res = session.login(ALICE_KEY);
        assert!(matches!(res, Err(SessionError::AlreadySignedIn)));
    }

    #[test]
    fn invalid_key_is_rejected() {
        let mut session = WalletSession::new();
        assert!(session.login("not-a-key").is_err());
        assert!(!session.is_signed_in());
    }

    #[test]
    fn logout_clears_the_session() {
        let mut session = WalletSession::new();
        session.login(ALICE_KEY).expect("valid key");
        session.logout();
        assert!(!session.is_signed_in());
        assert_eq!(session.account_id(), None);
    }
}
