//! Route protection.
//!
//! Pages like the admin dashboard are only rendered for the right session.
//! While the session is still resolving nothing is decided, so a returning
//! admin is never bounced to the home page before their profile is read.

use super::SessionView;

/// Where rejected visitors are sent.
pub const HOME_ROUTE: &str = "/";

/// Who may see a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any signed-in user.
    SignedIn,
    /// Signed-in admins only.
    Admin,
}

/// What to do with a request for a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is not resolved yet; render a placeholder.
    Loading,
    /// Render the route.
    Render,
    /// Navigate away.
    Redirect(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGuard {
    access: Access,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(access: Access) -> Self {
        Self { access }
    }

    #[must_use]
    pub const fn admin() -> Self {
        Self::new(Access::Admin)
    }

    #[must_use]
    pub const fn signed_in() -> Self {
        Self::new(Access::SignedIn)
    }

    #[must_use]
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Decide for the current `view`.
    #[must_use]
    pub const fn decide(&self, view: &SessionView) -> GuardDecision {
        if !view.is_ready {
            return GuardDecision::Loading;
        }
        let allowed = match self.access {
            Access::SignedIn => view.is_logged_in,
            Access::Admin => view.is_logged_in && view.is_admin,
        };
        if allowed {
            GuardDecision::Render
        } else {
            GuardDecision::Redirect(HOME_ROUTE)
        }
    }
}
