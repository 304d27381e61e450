//! Request and session context for association operations.
//!
//! The session context carries the parameters that used to be read from
//! ambient application state: the active tenant domain, the display
//! identity, and the flags that gate association loading. Passing them
//! explicitly keeps the store testable without a surrounding application.

use uuid::Uuid;

/// Per-operation request context, used for logging and request tracking.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request.
    pub request_id: String,
}

impl RequestContext {
    /// Create a request context with a specific request ID.
    pub fn new(request_id: String) -> Self {
        Self { request_id }
    }

    /// Create a request context with a generated request ID.
    pub fn with_generated_id() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::with_generated_id()
    }
}

/// The session the association store operates on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Domain of the tenant the session is currently acting in.
    pub tenant_domain: String,
    /// Login name of the session owner.
    pub username: String,
    /// Email of the session owner, preferred over `username` for display.
    pub email: Option<String>,
    /// Privileged users bypass association loading entirely.
    pub is_privileged: bool,
    /// Whether the association feature is enabled for this deployment.
    pub associations_enabled: bool,
}

impl SessionContext {
    /// Create a session for a regular user with associations enabled.
    pub fn new(tenant_domain: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            tenant_domain: tenant_domain.into(),
            username: username.into(),
            email: None,
            is_privileged: false,
            associations_enabled: true,
        }
    }

    /// Set the session owner's email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Mark the session as belonging to a privileged user.
    pub fn privileged(mut self) -> Self {
        self.is_privileged = true;
        self
    }

    /// Disable association loading for this session.
    pub fn without_associations(mut self) -> Self {
        self.associations_enabled = false;
        self
    }

    /// Display identity: the email when present, otherwise the username.
    pub fn display_identity(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.username)
    }

    /// Whether association loading should run at all for this session.
    pub fn loads_associations(&self) -> bool {
        !self.is_privileged && self.associations_enabled
    }
}
