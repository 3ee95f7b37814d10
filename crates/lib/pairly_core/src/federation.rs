//! Federation adapter: talks to external identity providers and normalizes
//! the result.
//!
//! Google logins exchange an authorization code for an `id_token`; Kakao
//! logins validate a provider bearer token against the userinfo endpoint.
//! The adapter never touches the credential store — account linkage policy
//! belongs to the session orchestrator.

use base64::Engine;
use serde::Deserialize;

use crate::auth::AuthError;
use crate::models::auth::{FederatedIdentity, Provider};

/// Google OAuth consent endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google token exchange endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Kakao userinfo endpoint.
pub const KAKAO_USERINFO_URL: &str = "https://kapi.kakao.com/v2/user/me";

/// Registered Google OAuth client settings.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// CSRF state parameter relayed through the consent redirect.
    pub state: String,
    pub auth_url: String,
    pub token_url: String,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    id_token: Option<String>,
}

/// Claims carried in a Google `id_token` payload.
#[derive(Debug, Deserialize)]
struct GoogleIdClaims {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleOAuth {
    /// Build the consent URL a deep-link client is redirected to.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state={}&prompt=select_account",
            self.auth_url,
            self.client_id,
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("profile email"),
            self.state,
        )
    }

    /// Exchange an authorization code for a normalized identity.
    ///
    /// The code may arrive percent-re-encoded by the intermediate redirect,
    /// so it is decoded before the token request is assembled.
    pub async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, AuthError> {
        let code = urlencoding::decode(code)
            .map_err(|e| AuthError::Upstream(format!("malformed authorization code: {e}")))?;

        let client = reqwest::Client::new();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code.as_ref()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let resp = client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(format!("token exchange failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Upstream(format!(
                "token exchange HTTP {status}: {body}"
            )));
        }

        let token = resp
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AuthError::Upstream(format!("token response parse error: {e}")))?;

        let id_token = token
            .id_token
            .ok_or_else(|| AuthError::Upstream("token response missing id_token".into()))?;

        let claims = decode_id_token_payload(&id_token)?;
        normalize_google_claims(claims)
    }
}

/// Decode the payload segment of a JWT without verifying the signature.
///
/// The id_token was just received over TLS from the token endpoint, which
/// is the trust anchor here; the assertion is only mined for profile data.
fn decode_id_token_payload(token: &str) -> Result<GoogleIdClaims, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::Upstream("malformed id_token".into()))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::Upstream(format!("id_token payload decode: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::Upstream(format!("id_token payload parse: {e}")))
}

/// Reject assertions without a stable subject; default the rest.
fn normalize_google_claims(claims: GoogleIdClaims) -> Result<FederatedIdentity, AuthError> {
    let subject = match claims.sub {
        Some(sub) if !sub.is_empty() => sub,
        _ => return Err(AuthError::Upstream("assertion missing subject".into())),
    };
    let email = claims.email.unwrap_or_default();
    let nickname = match claims.name {
        Some(name) if !name.is_empty() => name,
        _ => email.split('@').next().unwrap_or_default().to_string(),
    };
    Ok(FederatedIdentity {
        provider: Provider::Google,
        subject,
        email,
        nickname,
        profile_url: claims.picture,
    })
}

/// Response from Kakao's userinfo endpoint.
#[derive(Debug, Deserialize)]
struct KakaoUserResponse {
    id: Option<i64>,
    #[serde(default)]
    properties: KakaoProperties,
}

#[derive(Debug, Default, Deserialize)]
struct KakaoProperties {
    nickname: Option<String>,
    profile_image: Option<String>,
    email: Option<String>,
}

/// Validate a Kakao bearer token against the userinfo endpoint and
/// normalize the response.
pub async fn fetch_kakao_identity(access_token: &str) -> Result<FederatedIdentity, AuthError> {
    let client = reqwest::Client::new();
    let resp = client
        .get(KAKAO_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AuthError::Upstream(format!("userinfo fetch failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        return Err(AuthError::Upstream(format!("userinfo HTTP {status}")));
    }

    let user = resp
        .json::<KakaoUserResponse>()
        .await
        .map_err(|e| AuthError::Upstream(format!("userinfo parse error: {e}")))?;

    let id = user
        .id
        .ok_or_else(|| AuthError::Upstream("assertion missing subject".into()))?;

    Ok(FederatedIdentity {
        provider: Provider::Kakao,
        subject: id.to_string(),
        email: user.properties.email.unwrap_or_default(),
        nickname: user.properties.nickname.unwrap_or_default(),
        profile_url: user.properties.profile_image,
    })
}
