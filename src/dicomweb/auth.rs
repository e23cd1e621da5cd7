//! Authentication strategies for DICOMweb requests.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use super::RequestError;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// How requests to a target are authenticated. Exactly one strategy applies.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// HTTP Basic with a username/password pair.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>` with a user-supplied token.
    Bearer(String),
    /// Bearer token obtained from the environment's default credential chain.
    Ambient,
    Anonymous,
}

impl AuthStrategy {
    /// Pick the strategy for user-supplied credentials.
    ///
    /// A complete username/password pair wins over a token; a lone username
    /// or password is ignored.
    pub fn from_user_supplied(
        username: Option<&str>,
        password: Option<&str>,
        token: Option<&str>,
    ) -> Self {
        match (username, password, token) {
            (Some(username), Some(password), _) => AuthStrategy::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            (_, _, Some(token)) => AuthStrategy::Bearer(token.to_string()),
            _ => AuthStrategy::Anonymous,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::Basic { .. } => "basic",
            AuthStrategy::Bearer(_) => "bearer",
            AuthStrategy::Ambient => "ambient",
            AuthStrategy::Anonymous => "anonymous",
        }
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStrategy::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"********")
                .finish(),
            AuthStrategy::Bearer(_) => f.debug_tuple("Bearer").field(&"********").finish(),
            AuthStrategy::Ambient => f.write_str("Ambient"),
            AuthStrategy::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Source of ambient bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, RequestError>;
}

/// Google Application Default Credentials via `gcp_auth`.
///
/// The provider is discovered on first use, never at construction.
pub struct GcpTokenSource {
    scopes: Vec<String>,
    provider: OnceCell<Arc<dyn gcp_auth::TokenProvider>>,
}

impl GcpTokenSource {
    pub fn new(scopes: Vec<String>) -> Self {
        Self {
            scopes,
            provider: OnceCell::new(),
        }
    }
}

impl Default for GcpTokenSource {
    fn default() -> Self {
        Self::new(vec![CLOUD_PLATFORM_SCOPE.to_string()])
    }
}

#[async_trait]
impl TokenSource for GcpTokenSource {
    async fn token(&self) -> Result<String, RequestError> {
        let provider = self
            .provider
            .get_or_try_init(gcp_auth::provider)
            .await
            .map_err(|e| RequestError::Credentials(e.to_string()))?;

        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        let token = provider
            .token(&scopes)
            .await
            .map_err(|e| RequestError::Credentials(e.to_string()))?;

        debug!(scopes = ?self.scopes, "Obtained ambient access token");
        Ok(token.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pair_wins_over_token() {
        let auth = AuthStrategy::from_user_supplied(Some("alice"), Some("pw"), Some("tok"));
        assert_eq!(
            auth,
            AuthStrategy::Basic {
                username: "alice".to_string(),
                password: "pw".to_string()
            }
        );
    }

    #[test]
    fn test_token_used_without_complete_pair() {
        let user_only = AuthStrategy::from_user_supplied(Some("alice"), None, Some("tok"));
        assert_eq!(user_only, AuthStrategy::Bearer("tok".to_string()));

        let password_only = AuthStrategy::from_user_supplied(None, Some("pw"), Some("tok"));
        assert_eq!(password_only, AuthStrategy::Bearer("tok".to_string()));
    }

    #[test]
    fn test_nothing_supplied_is_anonymous() {
        assert_eq!(
            AuthStrategy::from_user_supplied(None, None, None),
            AuthStrategy::Anonymous
        );
        assert_eq!(
            AuthStrategy::from_user_supplied(Some("alice"), None, None),
            AuthStrategy::Anonymous
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let basic = AuthStrategy::from_user_supplied(Some("alice"), Some("hunter2"), None);
        let bearer = AuthStrategy::Bearer("abc.def".to_string());
        assert!(!format!("{:?}", basic).contains("hunter2"));
        assert!(!format!("{:?}", bearer).contains("abc.def"));
        assert_eq!(basic.name(), "basic");
        assert_eq!(bearer.name(), "bearer");
    }
}
