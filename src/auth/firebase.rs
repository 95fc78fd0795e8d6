use std::time::{Duration, SystemTime};
use futures::future::BoxFuture;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::auth::browser::open_link;
use crate::auth::federated::{LoopbackRedirect, FEDERATED_TIMEOUT};
use crate::auth::provider::IdentityProvider;
use crate::auth::types::{Credentials, Session};
use crate::config::types::IdentityConfig;
use crate::error::AuthError;

const FEDERATED_PROVIDER_ID: &str = "google.com";
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// REST error messages and the provider codes they are reported as.
const REST_ERROR_CODES: [(&str, &str); 18] = [
    ("EMAIL_EXISTS", "auth/email-already-in-use"),
    ("EMAIL_NOT_FOUND", "auth/user-not-found"),
    ("USER_NOT_FOUND", "auth/user-not-found"),
    ("INVALID_PASSWORD", "auth/wrong-password"),
    ("INVALID_LOGIN_CREDENTIALS", "auth/invalid-credential"),
    ("INVALID_IDP_RESPONSE", "auth/invalid-credential"),
    ("INVALID_EMAIL", "auth/invalid-email"),
    ("MISSING_EMAIL", "auth/missing-email"),
    ("MISSING_PASSWORD", "auth/missing-password"),
    ("USER_DISABLED", "auth/user-disabled"),
    ("WEAK_PASSWORD", "auth/weak-password"),
    ("TOO_MANY_ATTEMPTS_TRY_LATER", "auth/too-many-requests"),
    ("OPERATION_NOT_ALLOWED", "auth/operation-not-allowed"),
    ("FEDERATED_USER_ID_ALREADY_LINKED", "auth/credential-already-in-use"),
    ("QUOTA_EXCEEDED", "auth/quota-exceeded"),
    ("TOKEN_EXPIRED", "auth/user-token-expired"),
    ("INVALID_REFRESH_TOKEN", "auth/invalid-user-token"),
    ("API key not valid", "auth/invalid-api-key"),
];

/// Refresh failures after which the refresh token can never be used again.
const SESSION_ENDING_CODES: [&str; 4] = [
    "auth/user-token-expired",
    "auth/invalid-user-token",
    "auth/user-disabled",
    "auth/user-not-found",
];

fn ends_session(err: &AuthError) -> bool {
    matches!(err, AuthError::Provider { .. })
        && err.code().is_some_and(|code| SESSION_ENDING_CODES.contains(&code))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriRequest<'a> {
    provider_id: &'a str,
    continue_uri: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriResponse {
    auth_uri: String,
    session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    request_uri: &'a str,
    session_id: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn expires_at(expires_in: Option<&str>) -> SystemTime {
    let seconds = expires_in
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_EXPIRES_IN);
    SystemTime::now() + Duration::from_secs(seconds)
}

/// Turns a REST error body into a provider error with an `auth/...` code.
pub fn rest_error(body: &str) -> AuthError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => return AuthError::provider("auth/internal-error", body),
    };

    // "WEAK_PASSWORD : Password should be at least 6 characters"
    let key = message.split(" : ").next().unwrap_or_default().trim();

    let code = REST_ERROR_CODES
        .iter()
        .find(|(rest, _)| key == *rest || key.starts_with(rest))
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| format!("auth/{}", key.to_lowercase().replace('_', "-")));

    AuthError::Provider { code, message }
}

/// Firebase Authentication through its REST API.
pub struct FirebaseIdentity {
    client: reqwest::Client,
    config: IdentityConfig,
    session: watch::Sender<Option<Session>>,
}

impl FirebaseIdentity {
    pub fn new(client: reqwest::Client, config: IdentityConfig) -> Self {
        let (session, _) = watch::channel(None);
        FirebaseIdentity { client, config, session }
    }

    fn accounts_url(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.config.auth_endpoint.trim_end_matches('/'), method)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, AuthError> {
        let response = request
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(rest_error(&body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post_accounts<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T, AuthError> {
        self.send(self.client.post(self.accounts_url(method)).json(body)).await
    }

    fn establish(&self, response: SignInResponse) -> Session {
        let session = Session {
            uid: response.local_id,
            email: response.email,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: expires_at(response.expires_in.as_deref()),
        };
        info!("Signed in as {} ({})", session.display_email(), session.uid);
        self.session.send_replace(Some(session.clone()));
        session
    }

    async fn password_request(&self, method: &str, credentials: &Credentials) -> Result<Session, AuthError> {
        let request = PasswordRequest {
            email: &credentials.email,
            password: &credentials.password,
            return_secure_token: true,
        };
        let response = self.post_accounts(method, &request).await?;
        Ok(self.establish(response))
    }

    async fn federated(&self) -> Result<Session, AuthError> {
        let redirect = LoopbackRedirect::bind().await.map_err(|err| AuthError::Federated {
            code: "auth/internal-error",
            reason: format!("Failed to listen for the sign-in redirect: {}", err),
        })?;
        let continue_uri = redirect.continue_uri();

        let auth_uri: CreateAuthUriResponse = self.post_accounts("createAuthUri", &CreateAuthUriRequest {
            provider_id: FEDERATED_PROVIDER_ID,
            continue_uri: &continue_uri,
        }).await?;

        info!("Opening browser for federated sign-in");
        open_link(&auth_uri.auth_uri).await.map_err(|err| AuthError::Federated {
            code: "auth/popup-blocked",
            reason: err.to_string(),
        })?;

        let request_uri = redirect.wait(FEDERATED_TIMEOUT).await?;

        let response = self.post_accounts("signInWithIdp", &IdpRequest {
            request_uri: &request_uri,
            session_id: &auth_uri.session_id,
            return_secure_token: true,
            return_idp_credential: true,
        }).await?;
        Ok(self.establish(response))
    }

    async fn refreshed_token(&self) -> Result<Option<String>, AuthError> {
        let current = self.session.borrow().clone();
        let session = match current {
            None => return Ok(None),
            Some(session) if !session.needs_refresh(SystemTime::now()) => return Ok(Some(session.id_token)),
            Some(session) => session,
        };

        let url = format!("{}/token", self.config.token_endpoint.trim_end_matches('/'));
        let request = self.client.post(url).form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.as_str()),
        ]);

        let response: RefreshResponse = match self.send(request).await {
            Ok(response) => response,
            Err(err) if ends_session(&err) => {
                warn!("Token refresh rejected, signing out: {}", err);
                self.session.send_replace(None);
                return Err(err);
            },
            Err(err) => {
                // the session stays, the next call tries again
                warn!("Token refresh failed: {}", err);
                return Err(err);
            },
        };

        let refreshed = Session {
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: expires_at(response.expires_in.as_deref()),
            ..session
        };
        let token = refreshed.id_token.clone();
        self.session.send_replace(Some(refreshed));
        Ok(Some(token))
    }
}

impl IdentityProvider for FirebaseIdentity {
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Session, AuthError>> {
        Box::pin(self.password_request("signInWithPassword", credentials))
    }

    fn sign_up<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Session, AuthError>> {
        Box::pin(self.password_request("signUp", credentials))
    }

    fn sign_in_federated(&self) -> BoxFuture<'_, Result<Session, AuthError>> {
        Box::pin(self.federated())
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        Box::pin(async move {
            if self.session.send_replace(None).is_some() {
                info!("Signed out");
            }
            Ok(())
        })
    }

    fn id_token(&self) -> BoxFuture<'_, Result<Option<String>, AuthError>> {
        Box::pin(self.refreshed_token())
    }

    fn sessions(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}
