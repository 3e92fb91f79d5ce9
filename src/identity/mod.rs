mod firebase;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::SwapError;

pub use firebase::{DEFAULT_IDENTITY_URL, FirebaseIdentity};
pub use memory::MemoryIdentity;

/// Who is signed in, as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl Identity {
    /// Name snapshot written next to content this identity authors.
    pub fn author_name(&self) -> String {
        match self.display_name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name.to_owned(),
            None => self.email.split('@').next().unwrap_or_default().to_owned(),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register_with_credentials(&self, email: &str, password: &str) -> Result<Identity, SwapError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SwapError>;

    async fn sign_out(&self, identity: &Identity) -> Result<(), SwapError>;

    async fn update_display_name(&self, identity: &Identity, name: &str) -> Result<Identity, SwapError>;
}
