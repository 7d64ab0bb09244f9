use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;

/// A stored paste and its expiry rules.
#[derive(Debug, Clone)]
pub struct Paste {
    pub key: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: Option<u64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<u64>,
    pub views: u64,
}

impl Paste {
    /// Build a fresh paste with no views. Returns `None` if the TTL pushes the
    /// expiry time out of range.
    pub fn new(
        key: String,
        content: String,
        created_at: DateTime<Utc>,
        ttl_seconds: Option<u64>,
        max_views: Option<u64>,
    ) -> Option<Self> {
        let expires_at = match ttl_seconds {
            Some(ttl) => Some(expiry_time(created_at, ttl)?),
            None => None,
        };

        Some(Paste {
            key,
            content,
            created_at,
            ttl_seconds,
            expires_at,
            max_views,
            views: 0,
        })
    }

    /// Whether the TTL has run out. The expiry instant itself is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| now > expires_at)
    }

    /// Whether every allowed view has been used up.
    pub fn is_exhausted(&self) -> bool {
        self.max_views.map_or(false, |max_views| self.views >= max_views)
    }

    pub fn remaining_views(&self) -> Option<u64> {
        self.max_views
            .map(|max_views| max_views.saturating_sub(self.views))
    }

    pub fn view(&self) -> PasteView {
        PasteView {
            content: self.content.clone(),
            remaining_views: self.remaining_views(),
            expires_at: self.expires_at.map(format_timestamp),
        }
    }
}

/// What a successful fetch hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteView {
    pub content: String,
    pub remaining_views: Option<u64>,
    pub expires_at: Option<String>,
}

fn expiry_time(created_at: DateTime<Utc>, ttl_seconds: u64) -> Option<DateTime<Utc>> {
    let millis = i64::try_from(ttl_seconds).ok()?.checked_mul(1000)?;
    created_at.checked_add_signed(Duration::milliseconds(millis))
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn created_at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_704_067_200_000).unwrap()
    }

    #[test]
    fn ttl_sets_expiry() {
        let paste = Paste::new("abcd1234".into(), "hi".into(), created_at(), Some(1), None).unwrap();
        assert_eq!(paste.expires_at, Some(created_at() + Duration::milliseconds(1000)));
        assert_eq!(
            paste.view().expires_at.as_deref(),
            Some("2024-01-01T00:00:01.000Z")
        );
    }

    #[test]
    fn expiry_is_exclusive_of_the_deadline() {
        let paste = Paste::new("abcd1234".into(), "hi".into(), created_at(), Some(1), None).unwrap();
        let deadline = paste.expires_at.unwrap();
        assert!(!paste.is_expired_at(deadline));
        assert!(paste.is_expired_at(deadline + Duration::milliseconds(1)));
    }

    #[test]
    fn no_ttl_never_expires() {
        let paste = Paste::new("abcd1234".into(), "hi".into(), created_at(), None, None).unwrap();
        assert!(!paste.is_expired_at(created_at() + Duration::days(365 * 100)));
        assert_eq!(paste.view().expires_at, None);
    }

    #[test]
    fn out_of_range_ttl_is_rejected() {
        assert!(Paste::new("abcd1234".into(), "hi".into(), created_at(), Some(u64::MAX), None).is_none());
    }

    #[test]
    fn remaining_views_clamps_at_zero() {
        let mut paste =
            Paste::new("abcd1234".into(), "hi".into(), created_at(), None, Some(2)).unwrap();
        assert_eq!(paste.remaining_views(), Some(2));
        assert!(!paste.is_exhausted());

        paste.views = 2;
        assert_eq!(paste.remaining_views(), Some(0));
        assert!(paste.is_exhausted());

        paste.views = 3;
        assert_eq!(paste.remaining_views(), Some(0));
    }

    #[test]
    fn unlimited_paste_has_no_remaining_views() {
        let mut paste = Paste::new("abcd1234".into(), "hi".into(), created_at(), None, None).unwrap();
        paste.views = 1_000;
        assert_eq!(paste.remaining_views(), None);
        assert!(!paste.is_exhausted());
    }
}
