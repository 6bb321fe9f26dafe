use serde::{Deserialize, Serialize};

/// Constant sentinel handed out instead of a real authorization token.
/// The game only needs *a* stable identifier per player, not a verifiable one.
pub const OFFLINE_ACCESS_TOKEN: &str = "offline";

const IDENTITY_LEN: usize = 32;
const PAD_CHAR: char = '0';

/// Per-launch identity, constructed once after authentication and passed
/// explicitly into every downstream operation. There is no ambient
/// "current user" state anywhere in the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
}

impl Session {
    pub fn for_user(username: &str) -> Self {
        Self {
            username: username.to_string(),
            uuid: normalize_username(username),
            access_token: OFFLINE_ACCESS_TOKEN.to_string(),
        }
    }
}

/// Derive the pseudo-identity for a username: lowercase, keep only ASCII
/// alphanumerics, pad with `'0'` to exactly 32 characters, truncate to 32.
///
/// Two usernames that normalize to the same string share an identity. That
/// collision is accepted behavior, not something to silently repair.
pub fn normalize_username(username: &str) -> String {
    let mut identity: String = username
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    identity.truncate(IDENTITY_LEN);
    while identity.len() < IDENTITY_LEN {
        identity.push(PAD_CHAR);
    }
    identity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_exactly_32_chars() {
        for name in ["", "a", "Steve", "x".repeat(100).as_str(), "Çå-éß!"] {
            assert_eq!(normalize_username(name).len(), 32, "input: {name:?}");
        }
    }

    #[test]
    fn only_lowercase_alphanumerics_and_pad() {
        let id = normalize_username("Herr Müller_99!");
        assert!(id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn deterministic() {
        assert_eq!(normalize_username("Steve"), normalize_username("Steve"));
    }

    #[test]
    fn punctuation_variants_collide() {
        // Accepted ambiguity: distinct usernames may share one identity.
        assert_eq!(normalize_username("Steve!"), normalize_username("st-eve"));
        assert_eq!(normalize_username("Steve"), normalize_username("STEVE"));
    }

    #[test]
    fn long_names_truncate_before_padding() {
        let id = normalize_username(&"ab".repeat(40));
        assert_eq!(id, "ab".repeat(16));
    }

    #[test]
    fn session_uses_derived_identity() {
        let session = Session::for_user("Steve");
        assert_eq!(session.uuid, normalize_username("Steve"));
        assert_eq!(session.access_token, OFFLINE_ACCESS_TOKEN);
        assert_eq!(session.username, "Steve");
    }
}
