// src/config.rs
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_MODEL_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Persona instruction sent ahead of the conversation. `{date}` is replaced
/// with the current date on every call.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an AI travel assistant that helps users book flights, hotels, and activities.
You can communicate in multiple languages including English and Hindi.

When users ask about travel, ask clarifying questions about:
- Their destination
- Travel dates
- Number of travelers
- Budget constraints
- Preferences (e.g., direct flights, hotel amenities)

When recommending options:
- Suggest 2-3 options with different price points
- Mention key features of each option
- Ask which option they prefer

For flight bookings, collect:
- Full name
- Email
- Phone number
- Date of birth

For hotel bookings, collect:
- Check-in/check-out dates
- Number of rooms
- Special requests

Keep your responses concise and focused on helping the user complete their travel booking.
If the user switches languages, respond in that language.

Current date: {date}";

/// Bounds of the simulated latency before a rule-based reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackDelay {
    pub min: Duration,
    pub max: Duration,
}

impl Default for FallbackDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(300),
            max: Duration::from_millis(800),
        }
    }
}

impl FallbackDelay {
    pub fn disabled() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }
}

#[derive(Clone, Debug)]
pub struct ResponderConfig {
    pub api_key: Option<String>,
    pub model_endpoint: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system_prompt: String,
    pub request_timeout: Duration,
    pub fallback_delay: FallbackDelay,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            temperature: 0.7,
            max_output_tokens: 800,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            request_timeout: Duration::from_secs(30),
            fallback_delay: FallbackDelay::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub responder: ResponderConfig,
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ResponderConfig::default();

        // An empty key means "not configured".
        let api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        let min_ms = parse_or(
            &lookup,
            "FALLBACK_DELAY_MIN_MS",
            defaults.fallback_delay.min.as_millis() as u64,
        )?;
        let max_ms = parse_or(
            &lookup,
            "FALLBACK_DELAY_MAX_MS",
            defaults.fallback_delay.max.as_millis() as u64,
        )?;
        if min_ms > max_ms {
            return Err(ConfigError::Invalid {
                key: "FALLBACK_DELAY_MIN_MS",
                value: min_ms.to_string(),
                reason: format!("greater than FALLBACK_DELAY_MAX_MS ({max_ms})"),
            });
        }

        let responder = ResponderConfig {
            api_key,
            model_endpoint: lookup("GEMINI_MODEL_ENDPOINT").unwrap_or(defaults.model_endpoint),
            temperature: parse_or(&lookup, "GEMINI_TEMPERATURE", defaults.temperature)?,
            max_output_tokens: parse_or(
                &lookup,
                "GEMINI_MAX_OUTPUT_TOKENS",
                defaults.max_output_tokens,
            )?,
            system_prompt: lookup("ASSISTANT_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "GEMINI_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            fallback_delay: FallbackDelay {
                min: Duration::from_millis(min_ms),
                max: Duration::from_millis(max_ms),
            },
        };

        Ok(Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            responder,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
