use crate::domain::{Cents, FeeSchedule, TimeMs};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub rules: BusinessRules,
    pub batch_concurrency: usize,
}

/// Fixed business inputs to every tenure, queue and payout computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessRules {
    pub signup_fee: Cents,
    pub monthly_fee: Cents,
    pub payout_threshold: Cents,
    pub reward_per_winner: Cents,
    pub payout_required_months: i64,
    pub launch_date: TimeMs,
    pub grace_period_days: i64,
}

impl BusinessRules {
    pub fn fees(&self) -> FeeSchedule {
        FeeSchedule {
            signup_fee: self.signup_fee,
            monthly_fee: self.monthly_fee,
        }
    }
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            signup_fee: Cents(30_000),
            monthly_fee: Cents(2_500),
            payout_threshold: Cents(10_000_000),
            reward_per_winner: Cents(10_000_000),
            payout_required_months: 12,
            // 2025-01-01T00:00:00Z
            launch_date: TimeMs::new(1_735_689_600_000),
            grace_period_days: 30,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let batch_concurrency = parse_int(&env_map, "BATCH_CONCURRENCY", 8)?;
        if batch_concurrency < 1 {
            return Err(ConfigError::InvalidValue(
                "BATCH_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let rules = parse_business_rules(&env_map)?;

        Ok(Config {
            port,
            database_path,
            rules,
            batch_concurrency: batch_concurrency as usize,
        })
    }
}

fn parse_business_rules(env_map: &HashMap<String, String>) -> Result<BusinessRules, ConfigError> {
    let defaults = BusinessRules::default();

    let signup_fee = parse_amount(env_map, "SIGNUP_FEE", defaults.signup_fee)?;
    let monthly_fee = parse_amount(env_map, "MONTHLY_FEE", defaults.monthly_fee)?;
    if signup_fee == monthly_fee {
        // Payment kind is inferred from the amount, so the two must differ.
        return Err(ConfigError::InvalidValue(
            "MONTHLY_FEE".to_string(),
            "must differ from SIGNUP_FEE".to_string(),
        ));
    }

    let payout_required_months =
        parse_int(env_map, "PAYOUT_REQUIRED_MONTHS", defaults.payout_required_months)?;
    if payout_required_months < 0 {
        return Err(ConfigError::InvalidValue(
            "PAYOUT_REQUIRED_MONTHS".to_string(),
            "must not be negative".to_string(),
        ));
    }

    let grace_period_days = parse_int(env_map, "GRACE_PERIOD_DAYS", defaults.grace_period_days)?;
    if grace_period_days < 0 {
        return Err(ConfigError::InvalidValue(
            "GRACE_PERIOD_DAYS".to_string(),
            "must not be negative".to_string(),
        ));
    }

    let launch_date = match env_map.get("LAUNCH_DATE") {
        Some(raw) => parse_launch_date(raw).ok_or_else(|| {
            ConfigError::InvalidValue(
                "LAUNCH_DATE".to_string(),
                "must be YYYY-MM-DD or RFC 3339".to_string(),
            )
        })?,
        None => defaults.launch_date,
    };

    Ok(BusinessRules {
        signup_fee,
        monthly_fee,
        payout_threshold: parse_amount(env_map, "PAYOUT_THRESHOLD", defaults.payout_threshold)?,
        reward_per_winner: parse_amount(env_map, "REWARD_PER_WINNER", defaults.reward_per_winner)?,
        payout_required_months,
        launch_date,
        grace_period_days,
    })
}

fn parse_amount(
    env_map: &HashMap<String, String>,
    key: &str,
    default: Cents,
) -> Result<Cents, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    let amount = Cents::from_major_str(raw)
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))?;
    if !amount.is_positive() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be positive".to_string(),
        ));
    }
    Ok(amount)
}

fn parse_int(env_map: &HashMap<String, String>, key: &str, default: i64) -> Result<i64, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a valid integer".to_string())
        }),
        None => Ok(default),
    }
}

fn parse_launch_date(raw: &str) -> Option<TimeMs> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(TimeMs::from_datetime(dt.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(TimeMs::from_datetime(midnight))
}
