use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::auth::types::{Credentials, Session};
use crate::error::AuthError;

/// An external identity provider.
///
/// The provider owns the session; callers observe it through [`IdentityProvider::sessions`],
/// which yields `None` while signed out.
pub trait IdentityProvider: Send + Sync {
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Session, AuthError>>;

    fn sign_up<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Session, AuthError>>;

    /// Sign in through a third party account (Google).
    fn sign_in_federated(&self) -> BoxFuture<'_, Result<Session, AuthError>>;

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>>;

    /// A currently valid id token, refreshed if needed. `None` while signed out.
    fn id_token(&self) -> BoxFuture<'_, Result<Option<String>, AuthError>>;

    fn sessions(&self) -> watch::Receiver<Option<Session>>;
}
