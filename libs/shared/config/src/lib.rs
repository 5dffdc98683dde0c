use std::env;

use chrono::NaiveTime;
use tracing::warn;

/// Language used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Some(Locale::En),
            "vi" | "vi-vn" => Some(Locale::Vi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub locale: Locale,
    pub clinic_opening_time: NaiveTime,
    pub clinic_closing_time: NaiveTime,
    pub slot_minutes: u32,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            locale: Locale::En,
            clinic_opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            clinic_closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            locale: env::var("APP_LOCALE")
                .ok()
                .and_then(|value| {
                    let parsed = Locale::parse(&value);
                    if parsed.is_none() {
                        warn!("APP_LOCALE '{}' not supported, using default", value);
                    }
                    parsed
                })
                .unwrap_or(defaults.locale),
            clinic_opening_time: time_from_env("CLINIC_OPENING_TIME", defaults.clinic_opening_time),
            clinic_closing_time: time_from_env("CLINIC_CLOSING_TIME", defaults.clinic_closing_time),
            slot_minutes: env::var("CLINIC_SLOT_MINUTES")
                .ok()
                .and_then(|value| value.parse::<u32>().ok().filter(|minutes| *minutes > 0))
                .unwrap_or_else(|| {
                    warn!("CLINIC_SLOT_MINUTES not set or invalid, using default");
                    defaults.slot_minutes
                }),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if config.clinic_opening_time >= config.clinic_closing_time {
            warn!(
                "Clinic opening time {} is not before closing time {}, no free slots will be offered",
                config.clinic_opening_time, config.clinic_closing_time
            );
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn time_from_env(key: &str, default: NaiveTime) -> NaiveTime {
    match env::var(key) {
        Ok(value) => NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
            .unwrap_or_else(|_| {
                warn!("{} '{}' is not a valid time, using default {}", key, value, default);
                default
            }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parsing_accepts_regional_tags() {
        assert_eq!(Locale::parse("VI-vn"), Some(Locale::Vi));
        assert_eq!(Locale::parse(" en "), Some(Locale::En));
        assert_eq!(Locale::parse("fr"), None);
    }

    #[test]
    fn default_clinic_hours() {
        let config = AppConfig::default();
        assert_eq!(config.clinic_opening_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(config.clinic_closing_time, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(config.slot_minutes, 30);
        assert!(!config.is_configured());
    }
}
