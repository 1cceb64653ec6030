//! The authentication endpoints the client treats specially.

use std::fmt;

/// Endpoints whose responses change the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEndpoint {
    /// `POST /sign-in`
    SignIn,
    /// `POST /sign-up`
    SignUp,
    /// `POST /sign-out`
    SignOut,
    /// `POST /refresh-token`
    RefreshToken,
    /// `POST /authenticate/google`
    GoogleAuth,
    /// `POST /reset-password`
    ResetPassword,
}

impl AuthEndpoint {
    const ALL: [Self; 6] = [
        Self::SignIn,
        Self::SignUp,
        Self::SignOut,
        Self::RefreshToken,
        Self::GoogleAuth,
        Self::ResetPassword,
    ];

    /// Returns the route of this endpoint.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::SignIn => "/sign-in",
            Self::SignUp => "/sign-up",
            Self::SignOut => "/sign-out",
            Self::RefreshToken => "/refresh-token",
            Self::GoogleAuth => "/authenticate/google",
            Self::ResetPassword => "/reset-password",
        }
    }

    /// Classifies a route (as returned by `RequestSpec::route`).
    ///
    /// The route must be exactly an endpoint path, optionally below an
    /// `/api` or `/api/v<N>` prefix; absolute URLs are matched on their
    /// path. Nested resources that merely end like an endpoint, such as
    /// `/users/42/reset-password`, are not auth endpoints.
    #[must_use]
    pub fn classify(route: &str) -> Option<Self> {
        let path = strip_api_prefix(url_path(route));
        Self::ALL.into_iter().find(|endpoint| endpoint.path() == path)
    }

    /// Returns true for endpoints whose success response carries a new session.
    #[must_use]
    pub const fn issues_session(self) -> bool {
        matches!(self, Self::SignIn | Self::SignUp | Self::GoogleAuth)
    }

    /// Returns true for endpoints that must never be replayed after a token
    /// refresh: replaying them is meaningless or would recurse.
    #[must_use]
    pub const fn skips_refresh(self) -> bool {
        matches!(
            self,
            Self::SignIn | Self::SignOut | Self::RefreshToken | Self::ResetPassword
        )
    }
}

/// Drops the scheme and authority of an absolute URL.
fn url_path(route: &str) -> &str {
    route.split_once("://").map_or(route, |(_, rest)| {
        rest.find('/').map_or("/", |start| &rest[start..])
    })
}

fn strip_api_prefix(path: &str) -> &str {
    let Some(rest) = path.strip_prefix("/api").filter(|rest| rest.starts_with('/')) else {
        return path;
    };
    match rest[1..].split_once('/') {
        Some((version, _)) if is_version(version) => &rest[1 + version.len()..],
        _ => rest,
    }
}

fn is_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

impl fmt::Display for AuthEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
