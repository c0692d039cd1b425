use crate::app_config::{AppConfig, Environment, UrlForm};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// configuration pointed at a local chromedriver.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("OZPRICE_ENV", "development"))?;
    let log_level = or_default("OZPRICE_LOG_LEVEL", "info");
    let webdriver_url = or_default("OZPRICE_WEBDRIVER_URL", "http://localhost:9515");
    let base_url = or_default("OZPRICE_BASE_URL", "https://www.ozon.ru")
        .trim_end_matches('/')
        .to_string();
    let url_form = parse_url_form(&or_default("OZPRICE_URL_FORM", "composer_api"))?;

    let max_articles_per_request = parse_usize("OZPRICE_MAX_ARTICLES_PER_REQUEST", "50")?;
    let max_retries = parse_u32("OZPRICE_MAX_RETRIES", "3")?;
    let retry_delay_ms = parse_u64("OZPRICE_RETRY_DELAY_MS", "2000")?;
    let inter_article_delay_ms = parse_u64("OZPRICE_INTER_ARTICLE_DELAY_MS", "1000")?;
    let post_navigation_delay_ms = parse_u64("OZPRICE_POST_NAVIGATION_DELAY_MS", "2000")?;
    let payload_timeout_secs = parse_u64("OZPRICE_PAYLOAD_TIMEOUT_SECS", "30")?;
    let document_ready_timeout_secs = parse_u64("OZPRICE_DOCUMENT_READY_TIMEOUT_SECS", "10")?;
    let poll_interval_ms = parse_u64("OZPRICE_POLL_INTERVAL_MS", "500")?;
    let page_load_timeout_secs = parse_u64("OZPRICE_PAGE_LOAD_TIMEOUT_SECS", "30")?;
    let driver_request_timeout_secs = parse_u64("OZPRICE_DRIVER_REQUEST_TIMEOUT_SECS", "60")?;
    let markup_fallback = parse_bool("OZPRICE_MARKUP_FALLBACK", "false")?;

    if max_articles_per_request == 0 {
        return Err(ConfigError::Validation(
            "OZPRICE_MAX_ARTICLES_PER_REQUEST must be at least 1".to_string(),
        ));
    }
    if poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "OZPRICE_POLL_INTERVAL_MS must be greater than 0".to_string(),
        ));
    }
    if driver_request_timeout_secs <= page_load_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "OZPRICE_DRIVER_REQUEST_TIMEOUT_SECS ({driver_request_timeout_secs}) must exceed \
             OZPRICE_PAGE_LOAD_TIMEOUT_SECS ({page_load_timeout_secs})"
        )));
    }

    Ok(AppConfig {
        env,
        log_level,
        webdriver_url,
        base_url,
        url_form,
        max_articles_per_request,
        max_retries,
        retry_delay_ms,
        inter_article_delay_ms,
        post_navigation_delay_ms,
        payload_timeout_secs,
        document_ready_timeout_secs,
        poll_interval_ms,
        page_load_timeout_secs,
        driver_request_timeout_secs,
        markup_fallback,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "OZPRICE_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_url_form(s: &str) -> Result<UrlForm, ConfigError> {
    match s {
        "product_page" => Ok(UrlForm::ProductPage),
        "composer_api" => Ok(UrlForm::ComposerApi),
        other => Err(ConfigError::InvalidEnvVar {
            var: "OZPRICE_URL_FORM".to_string(),
            reason: format!("expected product_page or composer_api, got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
