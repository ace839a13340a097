//! Typed mapping for joined profile shapes
//!
//! Relationship fetches attach a nested profile to participant,
//! message, and comment rows. The join can come back whole, absent,
//! or partial, so every consumer goes through one tagged mapping
//! instead of ad hoc shape guards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public identity card carried by joined profile data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCard {
    pub id: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileCard {
    /// Minimal card carrying only an id, used when the joined
    /// profile is missing or unusable
    pub fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            avatar_url: None,
        }
    }
}

/// Outcome of resolving a joined profile shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Joined<T> {
    /// Join returned a usable record
    Present(T),
    /// No joined row at all
    Missing,
    /// A row came back but its identifying field is unusable
    Malformed,
}

impl<T> Joined<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Joined::Present(_))
    }

    /// The record, or `fallback` when the join was missing/malformed
    pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Joined::Present(value) => value,
            Joined::Missing | Joined::Malformed => fallback(),
        }
    }
}

impl Joined<ProfileCard> {
    /// Classify the nullable columns of a LEFT-joined profile.
    ///
    /// All columns null means no profile row existed for the join key
    /// (`Missing`). A null or empty id with other fields set means the
    /// row is unusable (`Malformed`). Anything with a non-empty id is
    /// `Present`, however sparse the rest is.
    pub fn from_columns(
        id: Option<String>,
        name: Option<String>,
        avatar_url: Option<String>,
    ) -> Self {
        match id {
            Some(id) if !id.trim().is_empty() => Joined::Present(ProfileCard {
                id,
                name,
                avatar_url,
            }),
            Some(_) => Joined::Malformed,
            None => {
                if name.is_none() && avatar_url.is_none() {
                    Joined::Missing
                } else {
                    Joined::Malformed
                }
            }
        }
    }
}

/// True when `last_seen` falls within the online window ending now
pub fn is_online(last_seen: Option<DateTime<Utc>>, window_seconds: i64) -> bool {
    match last_seen {
        Some(seen) => Utc::now() - seen <= chrono::Duration::seconds(window_seconds),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_join_is_present() {
        let joined = Joined::from_columns(
            Some("p1".to_string()),
            Some("Ana".to_string()),
            Some("https://media.example.com/avatars/a.webp".to_string()),
        );
        assert_eq!(
            joined,
            Joined::Present(ProfileCard {
                id: "p1".to_string(),
                name: Some("Ana".to_string()),
                avatar_url: Some("https://media.example.com/avatars/a.webp".to_string()),
            })
        );
    }

    #[test]
    fn sparse_join_with_id_is_still_present() {
        let joined = Joined::from_columns(Some("p1".to_string()), None, None);
        assert!(joined.is_present());
    }

    #[test]
    fn all_null_join_is_missing() {
        assert_eq!(
            Joined::<ProfileCard>::from_columns(None, None, None),
            Joined::Missing
        );
    }

    #[test]
    fn partial_join_without_id_is_malformed() {
        assert_eq!(
            Joined::<ProfileCard>::from_columns(None, Some("Ana".to_string()), None),
            Joined::Malformed
        );
    }

    #[test]
    fn blank_id_is_malformed() {
        assert_eq!(
            Joined::<ProfileCard>::from_columns(Some("  ".to_string()), None, None),
            Joined::Malformed
        );
    }

    #[test]
    fn fallback_keeps_participant_id() {
        let card = Joined::<ProfileCard>::from_columns(None, Some("Ana".to_string()), None)
            .unwrap_or_else(|| ProfileCard::bare("u42"));
        assert_eq!(card.id, "u42");
        assert_eq!(card.name, None);
        assert_eq!(card.avatar_url, None);
    }

    #[test]
    fn online_window() {
        assert!(!is_online(None, 300));
        assert!(is_online(Some(Utc::now()), 300));
        assert!(!is_online(
            Some(Utc::now() - chrono::Duration::seconds(600)),
            300
        ));
    }
}
