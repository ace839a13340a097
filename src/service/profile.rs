//! Profile service
//!
//! Own-profile lifecycle, public profiles, the landing-page community
//! grid, avatar upload, and the proxied city lookup used by the
//! profile editor.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::data::{is_online, Database, LanguageLevel, Profile};
use crate::error::AppError;
use crate::storage::MediaStorage;

/// Editable profile fields, applied as a wholesale update
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub native_languages: Vec<String>,
    #[serde(default)]
    pub language_levels: Vec<LanguageLevel>,
    #[serde(default)]
    pub interested_in: Vec<String>,
    #[serde(default)]
    pub looking_for: Vec<String>,
}

/// A member card on the community grid
#[derive(Debug, Clone, Serialize)]
pub struct CommunityMember {
    pub id: String,
    pub name: String,
    pub age: Option<i64>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub is_online: bool,
    pub native_languages: Vec<String>,
    pub language_levels: Vec<LanguageLevel>,
}

/// Profile service
pub struct ProfileService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
    http_client: reqwest::Client,
    config: Arc<AppConfig>,
}

impl ProfileService {
    pub fn new(
        db: Arc<Database>,
        storage: Arc<MediaStorage>,
        http_client: reqwest::Client,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            storage,
            http_client,
            config,
        }
    }

    /// The user's own profile, creating an empty row on first access
    pub async fn get_own(&self, user_id: &str) -> Result<Profile, AppError> {
        if let Some(profile) = self.db.get_profile(user_id).await? {
            return Ok(profile);
        }

        let created = self.db.insert_profile_if_missing(user_id).await?;
        if created {
            tracing::info!(user_id = %user_id, "Created empty profile on first access");
        }
        self.db.get_profile(user_id).await?.ok_or(AppError::NotFound)
    }

    /// A member's public profile
    pub async fn get_public(&self, id: &str) -> Result<Profile, AppError> {
        self.db.get_profile(id).await?.ok_or(AppError::NotFound)
    }

    /// Apply a wholesale update of the editable field set
    pub async fn update(&self, user_id: &str, update: ProfileUpdate) -> Result<Profile, AppError> {
        let mut profile = self.get_own(user_id).await?;

        profile.name = update.name;
        profile.age = update.age;
        profile.city = update.city;
        profile.country = update.country;
        profile.bio = update.bio;
        profile.gender = update.gender;
        profile.native_languages = update.native_languages;
        profile.language_levels = update.language_levels;
        profile.interested_in = update.interested_in;
        profile.looking_for = update.looking_for;
        profile.updated_at = Utc::now();

        self.db.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Member cards for the landing-page grid, newest members first.
    ///
    /// Render defaults applied here: a missing name shows as
    /// "Anonymous" and location is built from city and country.
    pub async fn community_grid(&self) -> Result<Vec<CommunityMember>, AppError> {
        let limit = self.config.community.grid_limit;
        let window = self.config.community.online_window_seconds;
        let profiles = self.db.list_profiles(limit).await?;

        let members = profiles
            .into_iter()
            .map(|profile| CommunityMember {
                name: profile
                    .name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "Anonymous".to_string()),
                location: format_location(profile.city.as_deref(), profile.country.as_deref()),
                is_online: is_online(profile.last_seen, window),
                id: profile.id,
                age: profile.age,
                avatar_url: profile.avatar_url,
                native_languages: profile.native_languages,
                language_levels: profile.language_levels,
            })
            .collect();

        Ok(members)
    }

    /// Upload a new avatar and point the profile at its public URL.
    ///
    /// The previous avatar, if it lived in our bucket, is deleted
    /// best-effort afterwards.
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::Validation("avatar file is empty".to_string()));
        }

        let previous = self.get_own(user_id).await?.avatar_url;
        let (_, url) = self.storage.upload_avatar(user_id, data, content_type).await?;
        self.db
            .update_profile_avatar(user_id, &url, Utc::now())
            .await?;

        if let Some(old_key) = previous
            .as_deref()
            .filter(|old| *old != url)
            .and_then(|old| self.storage.key_for_public_url(old))
        {
            if let Err(error) = self.storage.delete(&old_key).await {
                tracing::warn!(
                    user_id = %user_id,
                    key = %old_key,
                    error = %error,
                    "Failed to delete replaced avatar"
                );
            }
        }

        Ok(url)
    }

    /// Record profile activity for online-status derivation
    pub async fn touch_last_seen(&self, user_id: &str) -> Result<(), AppError> {
        self.db.touch_last_seen(user_id, Utc::now()).await
    }

    /// City suggestions for the profile editor.
    ///
    /// Proxies the external city API when a key is configured; any
    /// failure falls back to synthesized suggestions so the editor
    /// keeps working offline.
    pub async fn search_cities(&self, query: &str, country: Option<&str>) -> Vec<String> {
        let query = query.trim();
        if query.len() < 3 {
            return Vec::new();
        }

        match self.fetch_cities(query, country).await {
            Ok(cities) if !cities.is_empty() => cities,
            Ok(_) => synthesized_cities(query, country),
            Err(error) => {
                tracing::warn!(query = %query, error = %error, "City lookup failed, synthesizing");
                synthesized_cities(query, country)
            }
        }
    }

    async fn fetch_cities(
        &self,
        query: &str,
        country: Option<&str>,
    ) -> Result<Vec<String>, AppError> {
        #[derive(Deserialize)]
        struct CityRow {
            name: String,
        }

        let api_key = self
            .config
            .city_search
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("city_search.api_key is not set".to_string()))?;

        let mut request = self
            .http_client
            .get(&self.config.city_search.endpoint)
            .header("X-Api-Key", api_key)
            .query(&[("name", query), ("limit", "5")]);
        if let Some(country) = country {
            request = request.query(&[("country", country)]);
        }

        let rows: Vec<CityRow> = request.send().await?.error_for_status()?.json().await?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }
}

fn format_location(city: Option<&str>, country: Option<&str>) -> Option<String> {
    match (
        city.map(str::trim).filter(|c| !c.is_empty()),
        country.map(str::trim).filter(|c| !c.is_empty()),
    ) {
        (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
        (Some(city), None) => Some(city.to_string()),
        (None, Some(country)) => Some(country.to_string()),
        (None, None) => None,
    }
}

fn synthesized_cities(query: &str, country: Option<&str>) -> Vec<String> {
    let names = [
        format!("{} City", query),
        format!("{} Town", query),
        format!("New {}", query),
        format!("{}ville", query),
    ];
    names
        .into_iter()
        .map(|name| match country {
            Some(country) if !country.trim().is_empty() => format!("{}, {}", name, country),
            _ => name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_city_and_country() {
        assert_eq!(
            format_location(Some("Lyon"), Some("France")),
            Some("Lyon, France".to_string())
        );
        assert_eq!(format_location(Some("Lyon"), None), Some("Lyon".to_string()));
        assert_eq!(
            format_location(None, Some("France")),
            Some("France".to_string())
        );
        assert_eq!(format_location(None, None), None);
        assert_eq!(format_location(Some("  "), Some("")), None);
    }

    #[test]
    fn synthesized_cities_carry_country() {
        let cities = synthesized_cities("Spring", Some("US"));
        assert_eq!(cities.len(), 4);
        assert_eq!(cities[0], "Spring City, US");
        assert!(cities.iter().all(|c| c.ends_with(", US")));

        let bare = synthesized_cities("Spring", None);
        assert_eq!(bare[3], "Springville");
    }
}
