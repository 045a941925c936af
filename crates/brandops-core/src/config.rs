use crate::app_config::{AppConfig, AuditStorageKind, Environment};
use crate::audit::AuditSeverity;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Used by tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing and validation logic is decoupled from the process environment
/// so tests can drive it with a plain `HashMap`.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false/1/0/yes/no".to_string(),
            )
        })
    };

    let parse_ratio = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(var, format!("{value} is outside [0, 1]")));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("BRANDOPS_ENV", "development"))?;
    let bind_addr = parse_addr("BRANDOPS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("BRANDOPS_LOG_LEVEL", "info");
    let service_id = or_default("BRANDOPS_SERVICE_ID", "brandops-core");

    let db_max_connections = parse_u32("BRANDOPS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("BRANDOPS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("BRANDOPS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let audit_enabled = parse_bool("BRANDOPS_AUDIT_ENABLED", "true")?;
    let audit_storage = parse_storage_kind(&or_default("BRANDOPS_AUDIT_STORAGE", "postgres"))?;
    let audit_log_level = or_default("BRANDOPS_AUDIT_LOG_LEVEL", "info")
        .parse::<AuditSeverity>()
        .map_err(|e| invalid("BRANDOPS_AUDIT_LOG_LEVEL", e))?;
    let audit_batch_size = parse_usize("BRANDOPS_AUDIT_BATCH_SIZE", "100")?;
    if audit_batch_size == 0 {
        return Err(invalid(
            "BRANDOPS_AUDIT_BATCH_SIZE",
            "must be at least 1".to_string(),
        ));
    }
    let audit_flush_interval_ms = parse_u64("BRANDOPS_AUDIT_FLUSH_INTERVAL_MS", "5000")?;
    let audit_max_buffer_size = parse_usize("BRANDOPS_AUDIT_MAX_BUFFER_SIZE", "10000")?;
    let audit_anonymize = parse_bool("BRANDOPS_AUDIT_ANONYMIZE", "true")?;
    let audit_retention_days = parse_u32("BRANDOPS_AUDIT_RETENTION_DAYS", "365")?;
    let audit_storage_timeout_ms = parse_u64("BRANDOPS_AUDIT_STORAGE_TIMEOUT_MS", "5000")?;

    let context_ttl_ms = parse_u64("BRANDOPS_CONTEXT_TTL_MS", "300000")?;
    let context_max_size = parse_usize("BRANDOPS_CONTEXT_MAX_SIZE", "500")?;
    let context_refresh_interval_ms = parse_u64("BRANDOPS_CONTEXT_REFRESH_INTERVAL_MS", "60000")?;
    let context_fallback_to_cache = parse_bool("BRANDOPS_CONTEXT_FALLBACK_TO_CACHE", "true")?;
    let context_escalation_threshold =
        parse_ratio("BRANDOPS_CONTEXT_ESCALATION_THRESHOLD", "0.2")?;
    let context_load_timeout_ms = parse_u64("BRANDOPS_CONTEXT_LOAD_TIMEOUT_MS", "10000")?;

    let compliance_min_score = parse_ratio("BRANDOPS_COMPLIANCE_MIN_SCORE", "0.7")?;
    let retention_cron = or_default("BRANDOPS_RETENTION_CRON", "0 0 3 * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        service_id,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        audit_enabled,
        audit_storage,
        audit_log_level,
        audit_batch_size,
        audit_flush_interval_ms,
        audit_max_buffer_size,
        audit_anonymize,
        audit_retention_days,
        audit_storage_timeout_ms,
        context_ttl_ms,
        context_max_size,
        context_refresh_interval_ms,
        context_fallback_to_cache,
        context_escalation_threshold,
        context_load_timeout_ms,
        compliance_min_score,
        retention_cron,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BRANDOPS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_storage_kind(s: &str) -> Result<AuditStorageKind, ConfigError> {
    match s {
        "postgres" => Ok(AuditStorageKind::Postgres),
        "memory" => Ok(AuditStorageKind::Memory),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BRANDOPS_AUDIT_STORAGE".to_string(),
            reason: format!("unknown audit storage '{other}'"),
        }),
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
