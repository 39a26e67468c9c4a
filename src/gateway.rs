//! Auth Gateway: the single entry point surfaces use for register, login,
//! logout and the session predicates.
//!
//! Each mutating call tries the remote collaborator and falls back to the
//! local Credential Store + Token Issuer through `FallbackPolicy`. Callers
//! cannot tell which path served them; the choice is only logged.

use std::sync::Arc;
use tracing::{info, warn};

use crate::credentials::UserRepository;
use crate::errors::AuthError;
use crate::fallback::FallbackPolicy;
use crate::models::{LoginRequest, LoginResponse, NewUser, RegisterRequest, Role, UserSummary};
use crate::remote::RemoteAuth;
use crate::session::{Session, SessionState};
use crate::token::TokenIssuer;

pub struct AuthGateway {
    remote: Option<Arc<dyn RemoteAuth>>,
    users: Arc<dyn UserRepository>,
    session: SessionState,
    issuer: TokenIssuer,
    policy: FallbackPolicy,
}

impl AuthGateway {
    pub fn new(remote: Option<Arc<dyn RemoteAuth>>, users: Arc<dyn UserRepository>, session: SessionState) -> Self {
        Self {
            remote,
            users,
            session,
            issuer: TokenIssuer::default(),
            policy: FallbackPolicy,
        }
    }

    pub fn with_issuer(mut self, issuer: TokenIssuer) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Register a user; role defaults to USER.
    pub async fn register(&self, req: RegisterRequest) -> Result<UserSummary, AuthError> {
        require("username", &req.username)?;
        require("email", &req.email)?;
        require("password", &req.password)?;
        let req = RegisterRequest {
            role: Some(req.role.unwrap_or_default()),
            ..req
        };

        let body = &req;
        let remote = self
            .remote
            .as_deref()
            .map(|r| async move { r.register(body).await.map(|resp| resp.user) });
        let served = self
            .policy
            .run("register", remote, || self.register_locally(&req))
            .await?;

        info!("registered user {} ({:?})", served.value.username, served.source);
        Ok(served.value)
    }

    fn register_locally(&self, req: &RegisterRequest) -> Result<UserSummary, AuthError> {
        if self.users.find_by_username_or_email(&req.username, &req.email).is_some() {
            return Err(AuthError::DuplicateUser);
        }
        let user = self.users.append(NewUser {
            username: req.username.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
            role: req.role.unwrap_or_default(),
        });
        Ok(user.summary())
    }

    /// Log in and persist the session. On failure the session is left as it was.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthError> {
        let remote = self.remote.as_deref().map(|r| r.login(&req));
        let served = self
            .policy
            .run("login", remote, || self.login_locally(&req))
            .await?;
        let response = served.value;

        self.session.set(&Session {
            token: response.token.clone(),
            role: response.user.role,
            user_id: response.user.id,
            username: response.user.username.clone(),
        })?;
        info!("user {} logged in as {} ({:?})", response.user.username, response.user.role, served.source);
        Ok(response)
    }

    fn login_locally(&self, req: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let user = self
            .users
            .find_by_username_and_password(&req.username, &req.password)
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(LoginResponse {
            token: self.issuer.issue(&user),
            user: user.summary(),
        })
    }

    /// Clears the session unconditionally. No remote call.
    pub fn logout(&self) {
        if let Err(e) = self.session.clear() {
            warn!("failed to clear session: {}", e);
        }
        info!("logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    pub fn user_role(&self) -> Role {
        self.session.role()
    }

    pub fn current_user(&self) -> Option<Session> {
        self.session.current()
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(())
    }
}
