// In-memory AuthService for dev mode
// Decision: Use parking_lot for thread-safe access; locks are never held across an await
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// Lets the API run without an identity store. All accounts and tokens are lost
// on restart; reset tokens are logged instead of mailed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use budget_core::{
    AuthService, ErrorDetail, ExternalLoginCallback, ForgotPasswordRequest, LoginRequest,
    RegisterRequest, ResetPasswordRequest, ServiceResult, TokenResponse,
};
use parking_lot::RwLock;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use super::password::{hash_password, password_errors, verify_password};
use crate::auth::config::MAX_TOKEN_LIFETIME;

const TOKEN_TYPE: &str = "Bearer";

struct UserRecord {
    // None for accounts created through an external provider
    password_hash: Option<String>,
}

struct IssuedToken {
    user_id: Uuid,
    expires_at: Instant,
}

/// In-memory identity store for dev mode
pub struct InMemoryAuthService {
    token_lifetime: Duration,
    users: RwLock<HashMap<Uuid, UserRecord>>,
    // Normalized email -> user
    emails: RwLock<HashMap<String, Uuid>>,
    // (provider, subject) -> user
    external_logins: RwLock<HashMap<(String, String), Uuid>>,
    // Normalized email -> latest reset token
    reset_tokens: RwLock<HashMap<String, String>>,
    access_tokens: RwLock<HashMap<String, IssuedToken>>,
}

impl Default for InMemoryAuthService {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

impl InMemoryAuthService {
    /// Lifetimes above [`MAX_TOKEN_LIFETIME`] are clamped.
    pub fn new(token_lifetime: Duration) -> Self {
        Self {
            token_lifetime: token_lifetime.min(MAX_TOKEN_LIFETIME),
            users: RwLock::new(HashMap::new()),
            emails: RwLock::new(HashMap::new()),
            external_logins: RwLock::new(HashMap::new()),
            reset_tokens: RwLock::new(HashMap::new()),
            access_tokens: RwLock::new(HashMap::new()),
        }
    }

    fn issue_token(&self, user_id: Uuid) -> TokenResponse {
        let access_token = random_token();
        let now = Instant::now();
        let expires_at = now.checked_add(self.token_lifetime).unwrap_or(now);

        let mut tokens = self.access_tokens.write();
        tokens.retain(|_, issued| issued.expires_at > now);
        tokens.insert(
            access_token.clone(),
            IssuedToken {
                user_id,
                expires_at,
            },
        );
        drop(tokens);

        TokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: i64::try_from(self.token_lifetime.as_secs()).unwrap_or(i64::MAX),
        }
    }

    fn password_hash_for(&self, email: &str) -> Option<(Uuid, Option<String>)> {
        let user_id = *self.emails.read().get(email)?;
        let users = self.users.read();
        let user = users.get(&user_id)?;
        Some((user_id, user.password_hash.clone()))
    }
}

#[async_trait]
impl AuthService for InMemoryAuthService {
    async fn register(&self, request: RegisterRequest) -> ServiceResult {
        let email = normalize_email(&request.email);

        let mut errors = Vec::new();
        if !valid_email(&email) {
            errors.push("Invalid email address".to_string());
        }
        errors.extend(password_errors(&request.password, &request.confirm_password));
        if !errors.is_empty() {
            return ServiceResult::failure(
                ErrorDetail::new("InvalidRegistration", "Registration failed").with_errors(errors),
            )
            .with_status_code(400);
        }

        let password_hash = match hash_password(&request.password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!("Password hashing error: {}", e);
                return ServiceResult::failure(
                    ErrorDetail::new("RegistrationError", "Registration failed")
                        .with_error("Unable to register account"),
                )
                .with_status_code(500);
            }
        };

        let mut emails = self.emails.write();
        if emails.contains_key(&email) {
            return ServiceResult::failure(
                ErrorDetail::new("DuplicateEmail", "Registration failed")
                    .with_error("Email already registered"),
            )
            .with_status_code(409);
        }

        let user_id = Uuid::now_v7();
        self.users.write().insert(
            user_id,
            UserRecord {
                password_hash: Some(password_hash),
            },
        );
        emails.insert(email, user_id);

        tracing::info!(user_id = %user_id, "User registered");
        ServiceResult::ok().with_status_code(201)
    }

    async fn login(&self, request: LoginRequest) -> ServiceResult<TokenResponse> {
        let email = normalize_email(&request.email);
        let invalid = || {
            ServiceResult::failure(
                ErrorDetail::new("InvalidCredentials", "Login failed")
                    .with_error("Invalid email or password"),
            )
            .with_status_code(401)
        };

        let Some((user_id, Some(password_hash))) = self.password_hash_for(&email) else {
            return invalid();
        };

        match verify_password(&request.password, &password_hash) {
            Ok(true) => {}
            Ok(false) => return invalid(),
            Err(e) => {
                tracing::error!("Password verification error: {}", e);
                return invalid();
            }
        }

        tracing::debug!(user_id = %user_id, "User signed in");
        ServiceResult::success(self.issue_token(user_id)).with_status_code(200)
    }

    async fn forgot_password(&self, request: ForgotPasswordRequest) -> ServiceResult {
        let email = normalize_email(&request.email);

        // Same answer whether or not the account exists
        if self.emails.read().contains_key(&email) {
            let token = random_token();
            self.reset_tokens.write().insert(email.clone(), token.clone());
            tracing::info!(email = %email, reset_token = %token, "Password reset requested");
        } else {
            tracing::debug!(email = %email, "Password reset requested for unknown email");
        }

        ServiceResult::ok()
    }

    async fn reset_password(&self, request: ResetPasswordRequest) -> ServiceResult {
        let email = normalize_email(&request.email);

        let errors = password_errors(&request.password, &request.confirm_password);
        if !errors.is_empty() {
            return ServiceResult::failure(
                ErrorDetail::new("InvalidPasswordReset", "Password reset failed")
                    .with_errors(errors),
            )
            .with_status_code(400);
        }

        let user_id = self.emails.read().get(&email).copied();

        // Compare and consume in one step so a token redeems at most once
        let consumed = {
            let mut reset_tokens = self.reset_tokens.write();
            let matches = reset_tokens
                .get(&email)
                .is_some_and(|token| *token == request.token);
            if matches && user_id.is_some() {
                reset_tokens.remove(&email)
            } else {
                None
            }
        };

        let (Some(user_id), Some(reset_token)) = (user_id, consumed) else {
            return ServiceResult::failure(
                ErrorDetail::new("InvalidToken", "Password reset failed")
                    .with_error("Invalid or expired reset token"),
            )
            .with_status_code(400);
        };

        let password_hash = match hash_password(&request.password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!("Password hashing error: {}", e);
                // Give the token back unless a newer one was issued meanwhile
                self.reset_tokens
                    .write()
                    .entry(email)
                    .or_insert(reset_token);
                return ServiceResult::failure(
                    ErrorDetail::new("InvalidPasswordReset", "Password reset failed")
                        .with_error("Unable to reset password"),
                )
                .with_status_code(500);
            }
        };

        if let Some(user) = self.users.write().get_mut(&user_id) {
            user.password_hash = Some(password_hash);
        }
        // Sign out every session of the account
        self.access_tokens
            .write()
            .retain(|_, issued| issued.user_id != user_id);

        tracing::info!(user_id = %user_id, "Password reset");
        ServiceResult::ok()
    }

    async fn handle_external_login(
        &self,
        callback: ExternalLoginCallback,
    ) -> ServiceResult<TokenResponse> {
        let failed = |message: String| {
            ServiceResult::failure(
                ErrorDetail::new("ExternalLoginFailed", "External login failed").with_error(message),
            )
            .with_status_code(400)
        };

        if let Some(remote_error) = callback.remote_error.filter(|e| !e.is_empty()) {
            tracing::warn!(error = %remote_error, "External provider reported an error");
            return failed(format!("Error from external provider: {remote_error}"));
        }

        let Some(provider) = callback.provider.filter(|p| !p.is_empty()) else {
            return failed("Missing external login provider".to_string());
        };
        let Some(subject) = callback.code.filter(|c| !c.is_empty()) else {
            return failed("Missing authorization code".to_string());
        };

        let key = (provider.to_lowercase(), subject);
        let mut external_logins = self.external_logins.write();
        let user_id = match external_logins.get(&key) {
            Some(user_id) => *user_id,
            None => {
                let user_id = Uuid::now_v7();
                self.users.write().insert(
                    user_id,
                    UserRecord {
                        password_hash: None,
                    },
                );
                external_logins.insert(key, user_id);
                tracing::info!(user_id = %user_id, provider = %provider, "External account linked");
                user_id
            }
        };
        drop(external_logins);

        ServiceResult::success(self.issue_token(user_id)).with_status_code(200)
    }

    async fn current_user_id(&self, access_token: &str) -> Option<String> {
        let tokens = self.access_tokens.read();
        let issued = tokens.get(access_token)?;
        if Instant::now() >= issued.expires_at {
            return None;
        }
        Some(issued.user_id.to_string())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Random opaque token (64 hex characters)
fn random_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_core::Payload;

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }

    fn token_of(result: &ServiceResult<TokenResponse>) -> String {
        match result.data() {
            Some(Payload::Data(token)) => token.access_token.clone(),
            other => panic!("expected token payload, got {other:?}"),
        }
    }

    async fn login(service: &InMemoryAuthService, email: &str, password: &str) -> ServiceResult<TokenResponse> {
        service
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }

    #[test]
    fn test_email_helpers() {
        assert_eq!(normalize_email(" Ana@Example.COM "), "ana@example.com");
        assert!(valid_email("a@example.com"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("a b@example.com"));
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let service = InMemoryAuthService::default();

        let first = service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;
        assert!(first.is_success());

        let second = service
            .register(register_request("ANA@example.com", "another-pass"))
            .await;
        let error = second.error().unwrap();
        assert_eq!(error.code, "DuplicateEmail");
        assert_eq!(error.errors, vec!["Email already registered"]);
        assert_eq!(second.status_code(), Some(409));
    }

    #[tokio::test]
    async fn test_register_collects_all_validation_errors() {
        let service = InMemoryAuthService::default();
        let result = service
            .register(RegisterRequest {
                email: "nope".to_string(),
                password: "short".to_string(),
                confirm_password: "different".to_string(),
            })
            .await;

        let error = result.error().unwrap();
        assert_eq!(error.code, "InvalidRegistration");
        assert_eq!(
            error.errors,
            vec![
                "Invalid email address",
                "Password must be at least 8 characters",
                "Passwords do not match",
            ]
        );
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let service = InMemoryAuthService::new(Duration::from_secs(900));
        service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;

        let ok = login(&service, "Ana@Example.com", "correct-horse").await;
        assert!(ok.is_success());
        assert_eq!(ok.status_code(), Some(200));
        match ok.data() {
            Some(Payload::Data(token)) => {
                assert_eq!(token.token_type, "Bearer");
                assert_eq!(token.expires_in, 900);
                assert_eq!(token.access_token.len(), 64);
            }
            other => panic!("expected token payload, got {other:?}"),
        }

        let wrong = login(&service, "ana@example.com", "battery-staple").await;
        assert_eq!(wrong.error().unwrap().code, "InvalidCredentials");
        assert_eq!(wrong.status_code(), Some(401));

        let unknown = login(&service, "bob@example.com", "correct-horse").await;
        assert_eq!(unknown.error().unwrap().code, "InvalidCredentials");
    }

    #[tokio::test]
    async fn test_current_user_id() {
        let service = InMemoryAuthService::default();
        service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;
        let token = token_of(&login(&service, "ana@example.com", "correct-horse").await);

        assert!(service.current_user_id(&token).await.is_some());
        assert!(service.current_user_id("unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let service = InMemoryAuthService::new(Duration::ZERO);
        service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;
        let token = token_of(&login(&service, "ana@example.com", "correct-horse").await);

        assert!(service.current_user_id(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_lifetime_is_clamped() {
        let service = InMemoryAuthService::new(Duration::MAX);
        service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;

        let result = login(&service, "ana@example.com", "correct-horse").await;
        match result.data() {
            Some(Payload::Data(token)) => {
                assert_eq!(token.expires_in, MAX_TOKEN_LIFETIME.as_secs() as i64);
                assert!(service.current_user_id(&token.access_token).await.is_some());
            }
            other => panic!("expected token payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_tokens_are_pruned() {
        let service = InMemoryAuthService::new(Duration::ZERO);
        service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;

        login(&service, "ana@example.com", "correct-horse").await;
        login(&service, "ana@example.com", "correct-horse").await;
        login(&service, "ana@example.com", "correct-horse").await;

        // Only the token issued last survives until the next issue
        assert_eq!(service.access_tokens.read().len(), 1);
    }

    #[tokio::test]
    async fn test_forgot_password_never_reveals_accounts() {
        let service = InMemoryAuthService::default();
        let result = service
            .forgot_password(ForgotPasswordRequest {
                email: "ghost@example.com".to_string(),
            })
            .await;
        assert!(result.is_success());
        assert!(service.reset_tokens.read().is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let service = InMemoryAuthService::default();
        service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;
        let old_token = token_of(&login(&service, "ana@example.com", "correct-horse").await);

        service
            .forgot_password(ForgotPasswordRequest {
                email: "ana@example.com".to_string(),
            })
            .await;
        let reset_token = service
            .reset_tokens
            .read()
            .get("ana@example.com")
            .cloned()
            .unwrap();

        let reset = |token: &str| ResetPasswordRequest {
            email: "ana@example.com".to_string(),
            token: token.to_string(),
            password: "battery-staple".to_string(),
            confirm_password: "battery-staple".to_string(),
        };

        let wrong = service.reset_password(reset("not-the-token")).await;
        assert_eq!(wrong.error().unwrap().code, "InvalidToken");

        let ok = service.reset_password(reset(&reset_token)).await;
        assert!(ok.is_success());

        // Token is single use and old sessions are revoked
        let again = service.reset_password(reset(&reset_token)).await;
        assert_eq!(again.error().unwrap().code, "InvalidToken");
        assert!(service.current_user_id(&old_token).await.is_none());

        assert!(!login(&service, "ana@example.com", "correct-horse").await.is_success());
        assert!(login(&service, "ana@example.com", "battery-staple").await.is_success());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resets_redeem_token_once() {
        let service = std::sync::Arc::new(InMemoryAuthService::default());
        service
            .register(register_request("ana@example.com", "correct-horse"))
            .await;
        service
            .forgot_password(ForgotPasswordRequest {
                email: "ana@example.com".to_string(),
            })
            .await;
        let reset_token = service
            .reset_tokens
            .read()
            .get("ana@example.com")
            .cloned()
            .unwrap();

        let attempts: Vec<_> = ["first-password", "second-password", "third-password"]
            .into_iter()
            .map(|password| {
                let service = service.clone();
                let token = reset_token.clone();
                tokio::spawn(async move {
                    service
                        .reset_password(ResetPasswordRequest {
                            email: "ana@example.com".to_string(),
                            token,
                            password: password.to_string(),
                            confirm_password: password.to_string(),
                        })
                        .await
                        .is_success()
                })
            })
            .collect();

        let mut succeeded = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);
        assert!(service.reset_tokens.read().is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_validates_new_password() {
        let service = InMemoryAuthService::default();
        let result = service
            .reset_password(ResetPasswordRequest {
                email: "ana@example.com".to_string(),
                token: "whatever".to_string(),
                password: "short".to_string(),
                confirm_password: "short".to_string(),
            })
            .await;
        assert_eq!(result.error().unwrap().code, "InvalidPasswordReset");
    }

    #[tokio::test]
    async fn test_external_login_remote_error() {
        let service = InMemoryAuthService::default();
        let result = service
            .handle_external_login(ExternalLoginCallback {
                provider: Some("Facebook".to_string()),
                code: Some("abc".to_string()),
                remote_error: Some("access_denied".to_string()),
                ..Default::default()
            })
            .await;

        let error = result.error().unwrap();
        assert_eq!(error.code, "ExternalLoginFailed");
        assert_eq!(error.errors, vec!["Error from external provider: access_denied"]);
    }

    #[tokio::test]
    async fn test_external_login_requires_code() {
        let service = InMemoryAuthService::default();
        let result = service
            .handle_external_login(ExternalLoginCallback {
                provider: Some("Facebook".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(
            result.error().unwrap().errors,
            vec!["Missing authorization code"]
        );
    }

    #[tokio::test]
    async fn test_external_login_links_account_once() {
        let service = InMemoryAuthService::default();
        let callback = || ExternalLoginCallback {
            provider: Some("Facebook".to_string()),
            code: Some("subject-1".to_string()),
            ..Default::default()
        };

        let first = token_of(&service.handle_external_login(callback()).await);
        let second = token_of(&service.handle_external_login(callback()).await);

        assert_ne!(first, second);
        assert_eq!(
            service.current_user_id(&first).await,
            service.current_user_id(&second).await
        );
        assert_eq!(service.external_logins.read().len(), 1);
    }
}
