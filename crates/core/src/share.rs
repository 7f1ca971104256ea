//! Share-link capability tokens and access rules.
//!
//! A share link grants anonymous read access to one page, optionally its
//! subtree, until it is revoked, expires, or exhausts its view or unique-IP
//! quota. Only the SHA-256 of the token is ever persisted.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use rand::Rng;
use serde::Serialize;

use crate::error::CoreError;
use crate::hashing::sha256_hex;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of a freshly issued token (alphanumeric, ~256 bits of entropy).
pub const TOKEN_LENGTH: usize = 43;

/// Shortest token accepted on lookup.
pub const TOKEN_MIN_LENGTH: usize = 40;

/// Longest token accepted on lookup.
pub const TOKEN_MAX_LENGTH: usize = 50;

/// Maximum stored user-agent length in characters.
pub const MAX_USER_AGENT_LENGTH: usize = 500;

/// Maximum stored length of an address that does not parse as an IP.
pub const MAX_IP_LENGTH: usize = 45;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// The result of issuing a new share token.
pub struct GeneratedShareToken {
    /// The raw token, returned to the creator exactly once.
    pub plaintext: String,
    /// The SHA-256 hex digest stored in `share_links.token_hash`.
    pub hash: String,
}

/// Generate a new random share token and its storage hash.
pub fn generate_share_token() -> GeneratedShareToken {
    let token: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let hash = hash_share_token(&token);
    GeneratedShareToken {
        plaintext: token,
        hash,
    }
}

/// Compute the storage hash of a raw token.
pub fn hash_share_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Cheap shape check applied before any database lookup.
///
/// Accepts the URL-safe base64 alphabet so older links keep resolving.
pub fn is_well_formed_token(token: &str) -> bool {
    (TOKEN_MIN_LENGTH..=TOKEN_MAX_LENGTH).contains(&token.len())
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Public URL for a raw token.
pub fn share_url(site_url: &str, token: &str) -> String {
    format!("{}/s/{token}", site_url.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Access rules
// ---------------------------------------------------------------------------

/// Why a share-link access was refused.
///
/// These are expected outcomes, not failures: the caller renders a message
/// for each. An unknown token is reported separately as not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareDenial {
    Revoked,
    Expired,
    ViewLimitReached,
    IpLimitReached,
    PageNotAccessible,
}

impl ShareDenial {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Revoked => "SHARE_REVOKED",
            Self::Expired => "SHARE_EXPIRED",
            Self::ViewLimitReached => "SHARE_VIEW_LIMIT",
            Self::IpLimitReached => "SHARE_IP_LIMIT",
            Self::PageNotAccessible => "SHARE_PAGE_NOT_ACCESSIBLE",
        }
    }

    /// Whether the link can never admit anyone again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Revoked | Self::Expired | Self::ViewLimitReached)
    }
}

impl fmt::Display for ShareDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Revoked => "This share link has been revoked by the owner",
            Self::Expired => "This share link has expired",
            Self::ViewLimitReached => "This share link has reached its maximum number of views",
            Self::IpLimitReached => {
                "This share link has reached its maximum number of unique visitors"
            }
            Self::PageNotAccessible => "This page is not accessible through this share link",
        };
        f.write_str(msg)
    }
}

/// Display status of a link as seen by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareLinkStatus {
    Active,
    Revoked,
    Expired,
    ViewLimitReached,
    /// The unique address cap is full. Addresses already seen are still
    /// admitted; only new visitors are refused.
    IpLimitReached,
}

/// The quota fields of a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLimits {
    pub is_revoked: bool,
    pub expires_at: Option<Timestamp>,
    pub max_views: Option<i32>,
    pub view_count: i32,
    pub max_unique_ips: Option<i32>,
}

impl ShareLimits {
    /// Link-wide checks, in order: revoked, expired, view quota.
    pub fn check(&self, now: Timestamp) -> Result<(), ShareDenial> {
        if self.is_revoked {
            return Err(ShareDenial::Revoked);
        }
        if self.expires_at.is_some_and(|at| now > at) {
            return Err(ShareDenial::Expired);
        }
        if self.max_views.is_some_and(|max| self.view_count >= max) {
            return Err(ShareDenial::ViewLimitReached);
        }
        Ok(())
    }

    /// Whether admission depends on the requesting address.
    pub fn limits_ips(&self) -> bool {
        self.max_unique_ips.is_some()
    }

    /// Per-address check. A previously seen address is always admitted; a
    /// new one only while the unique count is below the cap.
    pub fn check_ip(&self, seen_before: bool, unique_ips: i64) -> Result<(), ShareDenial> {
        match self.max_unique_ips {
            Some(max) if !seen_before && unique_ips >= i64::from(max) => {
                Err(ShareDenial::IpLimitReached)
            }
            _ => Ok(()),
        }
    }

    /// Owner-facing status given the current number of distinct visitors.
    pub fn status(&self, now: Timestamp, unique_ips: i64) -> ShareLinkStatus {
        match self.check(now).and_then(|()| self.check_ip(false, unique_ips)) {
            Ok(()) => ShareLinkStatus::Active,
            Err(ShareDenial::Revoked) => ShareLinkStatus::Revoked,
            Err(ShareDenial::Expired) => ShareLinkStatus::Expired,
            Err(ShareDenial::IpLimitReached) => ShareLinkStatus::IpLimitReached,
            Err(_) => ShareLinkStatus::ViewLimitReached,
        }
    }
}

/// How a requested page relates to the link's own page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareScope {
    /// The request targets the linked page itself.
    LinkedPage,
    /// A different page was requested and the link covers children; the
    /// caller must confirm it is a true descendant.
    NeedsDescendantCheck,
    /// A different page was requested and the link does not cover children.
    Denied,
}

/// Classify a request against the link's page slug.
pub fn share_scope(
    linked_slug: &str,
    requested: Option<&str>,
    include_children: bool,
) -> ShareScope {
    match requested {
        None => ShareScope::LinkedPage,
        Some(slug) if slug.is_empty() || slug.eq_ignore_ascii_case(linked_slug) => {
            ShareScope::LinkedPage
        }
        Some(_) if include_children => ShareScope::NeedsDescendantCheck,
        Some(_) => ShareScope::Denied,
    }
}

// ---------------------------------------------------------------------------
// Issue parameters
// ---------------------------------------------------------------------------

/// Reject non-positive quota values.
pub fn validate_quota(field: &str, value: Option<i32>) -> Result<(), CoreError> {
    match value {
        Some(v) if v < 1 => Err(CoreError::Validation(format!(
            "{field}: must be at least 1"
        ))),
        _ => Ok(()),
    }
}

/// Parse a lifetime such as `30m`, `24h`, `7d` or `1h30m`.
///
/// Units: `s`, `m`, `h`, `d`, `w`. Empty input means "never expires".
pub fn parse_expires_in(input: &str) -> Result<Option<chrono::Duration>, CoreError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let invalid = || CoreError::Validation(format!("expires_in: invalid duration '{input}'"));

    let mut total = chrono::Duration::zero();
    let mut digits = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let amount: i64 = digits.parse().map_err(|_| invalid())?;
        digits.clear();
        let part = match c {
            's' => chrono::Duration::try_seconds(amount),
            'm' => chrono::Duration::try_minutes(amount),
            'h' => chrono::Duration::try_hours(amount),
            'd' => chrono::Duration::try_days(amount),
            'w' => chrono::Duration::try_weeks(amount),
            _ => None,
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;
    }
    if !digits.is_empty() || total <= chrono::Duration::zero() {
        return Err(invalid());
    }
    Ok(Some(total))
}

// ---------------------------------------------------------------------------
// Client sanitization
// ---------------------------------------------------------------------------

/// Canonicalize a client address before it is stored.
///
/// Accepts bare addresses, `ip:port`, bracketed IPv6 and zone suffixes.
/// IPv4-mapped IPv6 addresses collapse to IPv4 so one client counts once.
/// Unparseable input is kept verbatim, truncated to [`MAX_IP_LENGTH`].
pub fn sanitize_ip(raw: &str) -> String {
    let raw = raw.trim();

    let parsed = raw
        .parse::<SocketAddr>()
        .map(|sa| sa.ip())
        .ok()
        .or_else(|| {
            let unbracketed = raw.trim_start_matches('[').trim_end_matches(']');
            let without_zone = unbracketed.split('%').next().unwrap_or(unbracketed);
            without_zone.parse::<IpAddr>().ok()
        });

    match parsed {
        Some(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Some(ip) => ip.to_string(),
        None => raw.chars().take(MAX_IP_LENGTH).collect(),
    }
}

/// Bound a user-agent string to [`MAX_USER_AGENT_LENGTH`] characters.
pub fn truncate_user_agent(user_agent: &str) -> String {
    user_agent.chars().take(MAX_USER_AGENT_LENGTH).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    fn limits() -> ShareLimits {
        ShareLimits {
            is_revoked: false,
            expires_at: None,
            max_views: None,
            view_count: 0,
            max_unique_ips: None,
        }
    }

    // -- tokens --------------------------------------------------------------

    #[test]
    fn generated_token_is_well_formed_and_hashed() {
        let token = generate_share_token();
        assert_eq!(token.plaintext.len(), TOKEN_LENGTH);
        assert!(is_well_formed_token(&token.plaintext));
        assert_eq!(token.hash, hash_share_token(&token.plaintext));
        assert_ne!(token.hash, token.plaintext);
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_share_token().plaintext, generate_share_token().plaintext);
    }

    #[test]
    fn token_shape_check() {
        assert!(!is_well_formed_token("short"));
        assert!(!is_well_formed_token(&"a".repeat(51)));
        assert!(!is_well_formed_token(&format!("{}!", "a".repeat(42))));
        assert!(is_well_formed_token(&format!("{}-_", "a".repeat(41))));
    }

    #[test]
    fn share_url_trims_trailing_slash() {
        assert_eq!(share_url("https://wiki.example/", "abc"), "https://wiki.example/s/abc");
    }

    // -- limits --------------------------------------------------------------

    #[test]
    fn fresh_link_is_active() {
        assert_eq!(limits().check(Utc::now()), Ok(()));
        assert_eq!(limits().status(Utc::now(), 0), ShareLinkStatus::Active);
    }

    #[test]
    fn revoked_wins_over_other_states() {
        let l = ShareLimits {
            is_revoked: true,
            expires_at: Some(Utc::now() - Duration::hours(1)),
            max_views: Some(1),
            view_count: 5,
            ..limits()
        };
        assert_eq!(l.check(Utc::now()), Err(ShareDenial::Revoked));
    }

    #[test]
    fn expired_after_deadline() {
        let now = Utc::now();
        let l = ShareLimits {
            expires_at: Some(now),
            ..limits()
        };
        assert_eq!(l.check(now), Ok(()));
        assert_eq!(l.check(now + Duration::seconds(1)), Err(ShareDenial::Expired));
    }

    #[test]
    fn view_limit_reached_at_cap() {
        let l = ShareLimits {
            max_views: Some(2),
            view_count: 2,
            ..limits()
        };
        assert_eq!(l.check(Utc::now()), Err(ShareDenial::ViewLimitReached));
        assert!(ShareDenial::ViewLimitReached.is_terminal());
    }

    #[test]
    fn ip_cap_admits_known_addresses_only() {
        let l = ShareLimits {
            max_unique_ips: Some(1),
            ..limits()
        };
        assert!(l.limits_ips());
        assert_eq!(l.check_ip(false, 0), Ok(()));
        assert_eq!(l.check_ip(true, 1), Ok(()));
        assert_eq!(l.check_ip(false, 1), Err(ShareDenial::IpLimitReached));
        assert!(!ShareDenial::IpLimitReached.is_terminal());
    }

    #[test]
    fn full_ip_cap_shows_in_status() {
        let l = ShareLimits {
            max_unique_ips: Some(2),
            ..limits()
        };
        let now = Utc::now();
        assert_eq!(l.status(now, 1), ShareLinkStatus::Active);
        assert_eq!(l.status(now, 2), ShareLinkStatus::IpLimitReached);

        let revoked = ShareLimits {
            is_revoked: true,
            ..l
        };
        assert_eq!(revoked.status(now, 2), ShareLinkStatus::Revoked);
    }

    // -- scope ---------------------------------------------------------------

    #[test]
    fn scope_classification() {
        assert_eq!(share_scope("docs", None, false), ShareScope::LinkedPage);
        assert_eq!(share_scope("docs", Some("DOCS"), false), ShareScope::LinkedPage);
        assert_eq!(share_scope("docs", Some("docs/a"), false), ShareScope::Denied);
        assert_eq!(
            share_scope("docs", Some("docs/a"), true),
            ShareScope::NeedsDescendantCheck
        );
    }

    // -- issue parameters ----------------------------------------------------

    #[test]
    fn quota_must_be_positive() {
        assert!(validate_quota("max_views", None).is_ok());
        assert!(validate_quota("max_views", Some(1)).is_ok());
        assert_matches!(validate_quota("max_views", Some(0)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn expires_in_parsing() {
        assert_eq!(parse_expires_in("").unwrap(), None);
        assert_eq!(parse_expires_in("24h").unwrap(), Some(Duration::hours(24)));
        assert_eq!(parse_expires_in("7d").unwrap(), Some(Duration::days(7)));
        assert_eq!(
            parse_expires_in("1h30m").unwrap(),
            Some(Duration::minutes(90))
        );
        assert!(parse_expires_in("0h").is_err());
        assert!(parse_expires_in("10").is_err());
        assert!(parse_expires_in("h").is_err());
        assert!(parse_expires_in("5y").is_err());
    }

    // -- sanitization --------------------------------------------------------

    #[test]
    fn ip_forms_are_canonicalized() {
        assert_eq!(sanitize_ip(" 10.0.0.1 "), "10.0.0.1");
        assert_eq!(sanitize_ip("10.0.0.1:5123"), "10.0.0.1");
        assert_eq!(sanitize_ip("[::1]:8080"), "::1");
        assert_eq!(sanitize_ip("fe80::1%eth0"), "fe80::1");
        assert_eq!(sanitize_ip("::ffff:192.168.1.9"), "192.168.1.9");
        assert_eq!(sanitize_ip("2001:DB8::1"), "2001:db8::1");
    }

    #[test]
    fn garbage_ip_is_truncated() {
        let junk = "x".repeat(80);
        assert_eq!(sanitize_ip(&junk).len(), MAX_IP_LENGTH);
    }

    #[test]
    fn user_agent_truncated_on_char_boundary() {
        let ua = "é".repeat(MAX_USER_AGENT_LENGTH + 5);
        assert_eq!(truncate_user_agent(&ua).chars().count(), MAX_USER_AGENT_LENGTH);
        assert_eq!(truncate_user_agent("curl/8"), "curl/8");
    }
}
