//! Identity provider client.

use std::time::Duration;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use crate::auth::{AuthError, AuthUser, IdpCredential, SecretToken};

/// Lifetime assumed when the provider omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// Configuration for the Identity Toolkit and Secure Token APIs.
#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
    /// Web API key; every call fails with `NotConfigured` without it.
    pub api_key: Option<SecretToken>,

    /// Address of the Identity Toolkit API, e.g.
    /// `"https://identitytoolkit.googleapis.com"`.
    pub identity_toolkit_url: String,

    /// Address of the Secure Token API, e.g. `"https://securetoken.googleapis.com"`.
    pub secure_token_url: String,

    pub timeout: Duration,
}

/// HTTP client for Firebase Authentication's REST surface.
#[derive(Debug, Clone)]
pub struct IdentityToolkitClient {
    config: IdentityToolkitConfig,
    http: Client,
}

impl IdentityToolkitClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: IdentityToolkitConfig) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    fn api_key(&self) -> Result<&str, AuthError> {
        self.config
            .api_key
            .as_ref()
            .map(SecretToken::expose)
            .ok_or(AuthError::NotConfigured)
    }

    fn accounts(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{method}",
            self.config.identity_toolkit_url.trim_end_matches('/')
        )
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AuthError> {
        let response = request.query(&[("key", self.api_key()?)]).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.bytes().await?;

            return Err(match serde_json::from_slice::<ErrorEnvelope>(&body) {
                Ok(envelope) => AuthError::from_code(&envelope.error.message),
                Err(_) => AuthError::Rejected {
                    code: status.to_string(),
                },
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitClient {
    async fn sign_in_with_idp(&self, credential: &IdpCredential) -> Result<AuthUser, AuthError> {
        // The provider expects the credential form-encoded inside a JSON body.
        let mut post_body = Url::parse("http://localhost").map_err(|_| AuthError::NotConfigured)?;

        {
            let mut pairs = post_body.query_pairs_mut();

            pairs.append_pair("providerId", &credential.provider_id);

            if let Some(id_token) = &credential.id_token {
                pairs.append_pair("id_token", id_token.expose());
            }

            if let Some(access_token) = &credential.access_token {
                pairs.append_pair("access_token", access_token.expose());
            }
        }

        let body = json!({
            "postBody": post_body.query().unwrap_or_default(),
            "requestUri": "http://localhost",
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });

        debug!(provider = %credential.provider_id, "signing in with identity provider");

        let response: SignInResponse = self
            .call(self.http.post(self.accounts("signInWithIdp")).json(&body))
            .await?;

        Ok(response.into_user(Timestamp::now()))
    }

    async fn send_sign_in_link(&self, email: &str, continue_url: &str) -> Result<(), AuthError> {
        let body = json!({
            "requestType": "EMAIL_SIGNIN",
            "email": email,
            "continueUrl": continue_url,
            "canHandleCodeInApp": true,
        });

        let _: serde_json::Value = self
            .call(self.http.post(self.accounts("sendOobCode")).json(&body))
            .await?;

        Ok(())
    }

    async fn sign_in_with_email_link(
        &self,
        email: &str,
        oob_code: &str,
    ) -> Result<AuthUser, AuthError> {
        let body = json!({ "email": email, "oobCode": oob_code });

        let response: SignInResponse = self
            .call(self.http.post(self.accounts("signInWithEmailLink")).json(&body))
            .await?;

        Ok(response.into_user(Timestamp::now()))
    }

    async fn refresh_session(&self, user: &AuthUser) -> Result<AuthUser, AuthError> {
        let url = format!(
            "{}/v1/token",
            self.config.secure_token_url.trim_end_matches('/')
        );

        let request = self.http.post(url).form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", user.refresh_token.expose()),
        ]);

        let response: RefreshResponse = self.call(request).await?;

        debug!(uid = %user.uid, "refreshed id token");

        Ok(AuthUser {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: expiry(Timestamp::now(), response.expires_in.as_deref()),
        })
    }
}

#[automock]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an OAuth provider credential for a session.
    async fn sign_in_with_idp(&self, credential: &IdpCredential) -> Result<AuthUser, AuthError>;

    /// Email a passwordless sign-in link that returns to `continue_url`.
    async fn send_sign_in_link(&self, email: &str, continue_url: &str) -> Result<(), AuthError>;

    /// Complete a passwordless sign-in with the link's one-time code.
    async fn sign_in_with_email_link(
        &self,
        email: &str,
        oob_code: &str,
    ) -> Result<AuthUser, AuthError>;

    /// Trade the refresh token for a new ID token.
    async fn refresh_session(&self, user: &AuthUser) -> Result<AuthUser, AuthError>;
}

fn expiry(now: Timestamp, expires_in: Option<&str>) -> Timestamp {
    let seconds = expires_in
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);

    now.checked_add(SignedDuration::from_secs(seconds))
        .unwrap_or(Timestamp::MAX)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    display_name: Option<String>,

    id_token: SecretToken,
    refresh_token: SecretToken,

    #[serde(default)]
    expires_in: Option<String>,
}

impl SignInResponse {
    fn into_user(self, now: Timestamp) -> AuthUser {
        let expires_at = expiry(now, self.expires_in.as_deref());

        AuthUser {
            uid: self.local_id,
            email: self.email.filter(|email| !email.is_empty()),
            display_name: self.display_name.filter(|name| !name.is_empty()),
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: SecretToken,
    refresh_token: SecretToken,

    #[serde(default)]
    expires_in: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, body_string_contains, method, path, query_param},
    };

    use crate::test::helpers::make_user;

    use super::*;

    fn client_for(server: &MockServer) -> Result<IdentityToolkitClient, AuthError> {
        IdentityToolkitClient::new(IdentityToolkitConfig {
            api_key: Some(SecretToken::new("test-key")),
            identity_toolkit_url: server.uri(),
            secure_token_url: server.uri(),
            timeout: Duration::from_secs(2),
        })
    }

    fn sign_in_body() -> serde_json::Value {
        json!({
            "localId": "u-1",
            "email": "layla@example.com",
            "displayName": "Layla",
            "idToken": "fresh-id",
            "refreshToken": "fresh-refresh",
            "expiresIn": "3600"
        })
    }

    #[tokio::test]
    async fn idp_sign_in_forwards_credential() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithIdp"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "postBody": "providerId=google.com&id_token=google-token",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sign_in_body()))
            .expect(1)
            .mount(&server)
            .await;

        let before = Timestamp::now();
        let user = client_for(&server)?
            .sign_in_with_idp(&IdpCredential::google(SecretToken::new("google-token")))
            .await?;

        assert_eq!(user.uid, "u-1");
        assert_eq!(user.display_name.as_deref(), Some("Layla"));
        assert_eq!(user.id_token.expose(), "fresh-id");
        assert!(user.expires_at > before);

        Ok(())
    }

    #[tokio::test]
    async fn send_link_requests_email_sign_in() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:sendOobCode"))
            .and(body_partial_json(json!({
                "requestType": "EMAIL_SIGNIN",
                "email": "layla@example.com",
                "continueUrl": "http://localhost:3000/auth/complete",
                "canHandleCodeInApp": true
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"email": "layla@example.com"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)?
            .send_sign_in_link("layla@example.com", "http://localhost:3000/auth/complete")
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn expired_link_is_classified() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithEmailLink"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "EXPIRED_OOB_CODE", "errors": []}
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)?
            .sign_in_with_email_link("layla@example.com", "code")
            .await;

        assert!(
            matches!(result, Err(AuthError::ExpiredSignInLink)),
            "expected ExpiredSignInLink, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn refresh_posts_refresh_token_form() -> TestResult {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-token-u-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id_token": "new-id",
                "refresh_token": "new-refresh",
                "expires_in": "3600",
                "token_type": "Bearer",
                "user_id": "u-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = make_user("u-1");
        let refreshed = client_for(&server)?.refresh_session(&user).await?;

        assert_eq!(refreshed.uid, user.uid);
        assert_eq!(refreshed.email, user.email);
        assert_eq!(refreshed.id_token.expose(), "new-id");

        Ok(())
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() -> TestResult {
        let client = IdentityToolkitClient::new(IdentityToolkitConfig {
            api_key: None,
            identity_toolkit_url: "http://127.0.0.1:9".to_string(),
            secure_token_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        })?;

        let result = client.send_sign_in_link("a@example.com", "http://x").await;

        assert!(
            matches!(result, Err(AuthError::NotConfigured)),
            "expected NotConfigured, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn unparseable_lifetime_uses_default() -> TestResult {
        let now = Timestamp::from_second(1_000)?;

        assert_eq!(expiry(now, Some("soon")).as_second(), 4_600);
        assert_eq!(expiry(now, Some("60")).as_second(), 1_060);

        Ok(())
    }
}
