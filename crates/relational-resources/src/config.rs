//! # Platform Configuration
//!
//! Limits and sizes shared by every actor. Built once at startup and handed to the actors as
//! `Arc<PlatformConfig>` inside their context.

use std::str::FromStr;

/// Tunable limits of the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    /// Request queue capacity of every actor (default: 32)
    pub actor_buffer: usize,
    /// Max ids per bulk admin operation (default: 50)
    pub bulk_limit: usize,
    /// Max ids per bulk favorite operation (default: 20)
    pub favorite_bulk_limit: usize,
    /// Max users per invitation batch (default: 10)
    pub invite_batch_limit: usize,
    /// How long authors may edit comments and messages (default: 15 minutes)
    pub edit_window_minutes: i64,
    /// Lower bound for an activity's capacity (default: 2)
    pub min_participants: u32,
    /// Upper bound for an activity's capacity (default: 50)
    pub max_participants: u32,
    /// Capacity of an activity created without one (default: 10)
    pub default_max_participants: u32,
    /// Length of activity access codes (default: 6)
    pub access_code_length: usize,
    /// Length of the random slug suffix (default: 6)
    pub slug_suffix_length: usize,
    /// Max minutes per recorded activity session (default: 480)
    pub max_session_minutes: u32,
    /// Max minutes per recorded progression entry (default: 300)
    pub max_progress_minutes: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            actor_buffer: 32,
            bulk_limit: 50,
            favorite_bulk_limit: 20,
            invite_batch_limit: 10,
            edit_window_minutes: 15,
            min_participants: 2,
            max_participants: 50,
            default_max_participants: 10,
            access_code_length: 6,
            slug_suffix_length: 6,
            max_session_minutes: 480,
            max_progress_minutes: 300,
        }
    }
}

impl PlatformConfig {
    /// Create config from `RR_*` environment variables, keeping the default for any variable
    /// that is unset or does not parse.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        override_from_env("RR_ACTOR_BUFFER", &mut config.actor_buffer);
        override_from_env("RR_BULK_LIMIT", &mut config.bulk_limit);
        override_from_env("RR_FAVORITE_BULK_LIMIT", &mut config.favorite_bulk_limit);
        override_from_env("RR_INVITE_BATCH_LIMIT", &mut config.invite_batch_limit);
        override_from_env("RR_EDIT_WINDOW_MINUTES", &mut config.edit_window_minutes);
        override_from_env(
            "RR_DEFAULT_MAX_PARTICIPANTS",
            &mut config.default_max_participants,
        );
        override_from_env("RR_ACCESS_CODE_LENGTH", &mut config.access_code_length);

        // the default capacity must itself be a valid capacity
        config.default_max_participants = config
            .default_max_participants
            .clamp(config.min_participants, config.max_participants);
        config.actor_buffer = config.actor_buffer.max(1);

        config
    }
}

fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse::<T>() {
            Ok(parsed) => *slot = parsed,
            Err(_) => tracing::warn!(key, value = %val, "Ignoring unparsable setting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_platform_limits() {
        let config = PlatformConfig::default();
        assert_eq!(config.bulk_limit, 50);
        assert_eq!(config.favorite_bulk_limit, 20);
        assert_eq!(config.invite_batch_limit, 10);
        assert_eq!(config.edit_window_minutes, 15);
        assert_eq!(
            (config.min_participants, config.max_participants),
            (2, 50)
        );
        assert_eq!(config.default_max_participants, 10);
        assert_eq!(config.access_code_length, 6);
    }

    #[test]
    fn test_env_overrides_and_bad_values() {
        // the only test touching these variables
        std::env::set_var("RR_BULK_LIMIT", "5");
        std::env::set_var("RR_EDIT_WINDOW_MINUTES", "not-a-number");
        std::env::set_var("RR_DEFAULT_MAX_PARTICIPANTS", "500");

        let config = PlatformConfig::from_env();
        assert_eq!(config.bulk_limit, 5);
        assert_eq!(config.edit_window_minutes, 15);
        assert_eq!(config.default_max_participants, 50);

        std::env::remove_var("RR_BULK_LIMIT");
        std::env::remove_var("RR_EDIT_WINDOW_MINUTES");
        std::env::remove_var("RR_DEFAULT_MAX_PARTICIPANTS");
    }
}
