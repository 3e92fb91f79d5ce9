use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::SwapError;

use super::{Identity, IdentityProvider};

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountReply {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Default, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Email/password accounts through the Firebase identity toolkit REST API.
#[derive(Clone)]
pub struct FirebaseIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, SwapError> {
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, SwapError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/v1/accounts:{method}?key={}", self.base_url, self.api_key);
        let response = self.http.post(url).json(body).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        if status.is_client_error() {
            let reply: ErrorReply = response.json().await.unwrap_or_default();
            tracing::debug!(method, code = %reply.error.message, "identity provider refused");
            return Err(SwapError::identity(humanize(&reply.error.message)));
        }
        Err(SwapError::unavailable(format!(
            "identity provider answered {status}"
        )))
    }
}

fn humanize(message: &str) -> String {
    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };
    let text = match code {
        "EMAIL_EXISTS" => "The email address is already in use by another account.",
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => "Invalid email or password.",
        "INVALID_EMAIL" => "The email address is badly formatted.",
        "USER_DISABLED" => "This account has been disabled.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts, try again later.",
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => "Your sign-in has expired, sign in again.",
        _ if !detail.is_empty() => detail,
        "" => "The identity provider refused the request.",
        other => other,
    };
    text.to_owned()
}

impl From<AccountReply> for Identity {
    fn from(reply: AccountReply) -> Self {
        Identity {
            uid: reply.local_id,
            email: reply.email,
            display_name: reply.display_name.filter(|name| !name.is_empty()),
            id_token: reply.id_token,
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn register_with_credentials(&self, email: &str, password: &str) -> Result<Identity, SwapError> {
        let reply: AccountReply = self
            .call("signUp", &PasswordRequest { email, password, return_secure_token: true })
            .await?;
        tracing::info!(uid = %reply.local_id, "account registered");
        Ok(reply.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SwapError> {
        let reply: AccountReply = self
            .call("signInWithPassword", &PasswordRequest { email, password, return_secure_token: true })
            .await?;
        Ok(reply.into())
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), SwapError> {
        // tokens are bearer-only; forgetting them is all there is to do
        tracing::debug!(uid = %identity.uid, "signed out");
        Ok(())
    }

    async fn update_display_name(&self, identity: &Identity, name: &str) -> Result<Identity, SwapError> {
        let Some(id_token) = identity.id_token.as_deref() else {
            return Err(SwapError::identity("Your sign-in has expired, sign in again."));
        };
        let reply: AccountReply = self
            .call("update", &UpdateRequest { id_token, display_name: name, return_secure_token: true })
            .await?;

        let mut updated = Identity::from(reply);
        if updated.email.is_empty() {
            updated.email = identity.email.clone();
        }
        if updated.id_token.is_none() {
            updated.id_token = identity.id_token.clone();
        }
        Ok(updated)
    }
}
