use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpMessage, HttpRequest,
};

use crate::api::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    fn from_header(value: Option<&str>) -> Self {
        match value {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Identity of the caller as asserted by the upstream gateway headers.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: String,
    pub role: Role,
}

impl CallerContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner a new upload is recorded under. Only admins may name a target.
    pub fn owner_for(&self, target_user_id: Option<&str>) -> String {
        match target_user_id {
            Some(target) if self.is_admin() && !target.is_empty() => target.to_string(),
            _ => self.user_id.clone(),
        }
    }

    pub fn can_manage(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

/// Trusts `X-User-ID` / `X-Role` without verification; real authentication
/// happens in front of this service.
pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let user_id = req
        .headers()
        .get("X-User-ID")
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let Some(user_id) = user_id else {
        return Err(error::Error::unauthorized("unauthorized: missing user_id").into());
    };

    let role = Role::from_header(req.headers().get("X-Role").and_then(|h| h.to_str().ok()));

    req.extensions_mut().insert(CallerContext::new(user_id, role));

    next.call(req).await
}

pub fn get_extensions<T>(req: &HttpRequest) -> Result<T, error::Error>
where
    T: Clone + 'static,
{
    req.extensions()
        .get::<T>()
        .cloned()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))
}
