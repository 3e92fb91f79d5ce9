use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::SwapError;

use super::{Identity, IdentityProvider};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    email: String,
    display_name: Option<String>,
    salt: [u8; 16],
    digest: Vec<u8>,
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

impl Account {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            id_token: None,
        }
    }
}

/// Accounts kept in process memory, for development and tests.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize_email(email: &str) -> Result<String, SwapError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(SwapError::identity("The email address is badly formatted.")),
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn register_with_credentials(&self, email: &str, password: &str) -> Result<Identity, SwapError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SwapError::identity("Password should be at least 6 characters."));
        }

        let mut accounts = self.accounts.lock();
        if accounts.contains_key(&email) {
            return Err(SwapError::identity(
                "The email address is already in use by another account.",
            ));
        }

        let mut salt = [0u8; 16];
        rand::rng().fill_bytes(&mut salt);
        let account = Account {
            uid: Uuid::now_v7().simple().to_string(),
            email: email.clone(),
            display_name: None,
            salt,
            digest: digest(&salt, password),
        };
        let identity = account.identity();
        accounts.insert(email, account);

        tracing::info!(uid = %identity.uid, "account registered");
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SwapError> {
        let invalid = || SwapError::identity("Invalid email or password.");
        let email = normalize_email(email).map_err(|_| invalid())?;

        let accounts = self.accounts.lock();
        let account = accounts.get(&email).ok_or_else(invalid)?;
        if digest(&account.salt, password) != account.digest {
            return Err(invalid());
        }
        Ok(account.identity())
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), SwapError> {
        tracing::debug!(uid = %identity.uid, "signed out");
        Ok(())
    }

    async fn update_display_name(&self, identity: &Identity, name: &str) -> Result<Identity, SwapError> {
        let mut accounts = self.accounts.lock();
        let account = accounts
            .values_mut()
            .find(|account| account.uid == identity.uid)
            .ok_or_else(|| SwapError::identity("There is no user record corresponding to this identifier."))?;
        account.display_name = Some(name.to_owned());
        Ok(account.identity())
    }
}
