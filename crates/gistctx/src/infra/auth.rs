//! Locating a GitHub token for authenticated gists.

use std::env;
use std::fmt;

/// Personal access token. The secret is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Return the first non-empty token found in `vars`, checked in order.
pub fn token_from_env<S: AsRef<str>>(vars: &[S]) -> Option<AuthToken> {
    token_from_lookup(vars, |name| env::var(name).ok())
}

fn token_from_lookup<S, F>(vars: &[S], lookup: F) -> Option<AuthToken>
where
    S: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    vars.iter().find_map(|name| {
        let value = lookup(name.as_ref())?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            tracing::debug!(source = name.as_ref(), "using GitHub token from environment");
            Some(AuthToken::new(trimmed))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "EMPTY_TOKEN" => Some("  ".into()),
            "GH_TOKEN" => Some(" ghp_second \n".into()),
            "GITHUB_TOKEN" => Some("ghp_third".into()),
            _ => None,
        }
    }

    #[test]
    fn picks_first_non_empty_variable() {
        let token = token_from_lookup(&["MISSING", "EMPTY_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"], lookup);
        assert_eq!(token, Some(AuthToken::new("ghp_second")));
    }

    #[test]
    fn returns_none_when_nothing_is_set() {
        assert_eq!(token_from_lookup(&["MISSING"], lookup), None);
    }

    #[test]
    fn debug_hides_secret() {
        assert_eq!(format!("{:?}", AuthToken::new("ghp_secret")), "AuthToken(***)");
    }
}
