use std::fmt;

use serde::Deserialize;

use super::MigrationError;

/// Space credentials exactly as the operator typed them into the form.
#[derive(Clone, Deserialize)]
pub struct SpaceForm {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub space_id: String,
    #[serde(default)]
    pub token: String,
}

/// A validated workspace. Immutable for the duration of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Space {
    pub domain: String,
    pub space_id: i64,
    pub token: String,
}

impl SpaceForm {
    /// `role` names the side of the migration ("source" / "target") in messages.
    pub fn validate(&self, role: &str, domain_suffix: &str) -> Result<Space, MigrationError> {
        let domain = normalize_domain(&self.domain, domain_suffix);
        if domain.is_empty() {
            return Err(MigrationError::Validation(format!("{role} domain is required")));
        }

        let token = self.token.trim();
        if token.is_empty() {
            return Err(MigrationError::Validation(format!("{role} token is required")));
        }

        let space_id = self.space_id.trim();
        if space_id.is_empty() {
            return Err(MigrationError::Validation(format!("{role} space ID is required")));
        }
        let space_id = space_id.parse::<i64>().map_err(|_| {
            MigrationError::Validation(format!("{role} space ID must be numeric, got {space_id:?}"))
        })?;

        Ok(Space {
            domain,
            space_id,
            token: token.to_string(),
        })
    }
}

impl Space {
    /// `scheme` is `https` for the hosted product; self-hosted instances may
    /// be served over plain `http`.
    pub fn base_url(&self, scheme: &str) -> String {
        format!("{scheme}://{}/api/latest", self.domain)
    }
}

// Tokens never end up in logs.
impl fmt::Debug for SpaceForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceForm")
            .field("domain", &self.domain)
            .field("space_id", &self.space_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Space")
            .field("domain", &self.domain)
            .field("space_id", &self.space_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Strips scheme and path, and appends `suffix` to bare subdomains
/// (`acme` becomes `acme.kaiten.ru`). `localhost` and hosts with an explicit
/// port are taken as given.
pub fn normalize_domain(raw: &str, suffix: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let host = without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if host.is_empty()
        || suffix.is_empty()
        || host.ends_with(suffix)
        || host.contains('.')
        || host.contains(':')
        || host == "localhost"
    {
        return host;
    }

    format!("{host}{suffix}")
}
