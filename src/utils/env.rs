/// Get environment variable with SAAS_ prefix, falling back to unprefixed version
///
/// Checks `SAAS_{key}` first, then `{key}`.
///
/// # Examples
///
/// ```rust
/// use saas_catalog::utils::get_env_with_prefix;
///
/// // Checks SAAS_TRIAL_DAYS first, then TRIAL_DAYS
/// let days = get_env_with_prefix("TRIAL_DAYS");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("SAAS_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse a boolean flag from the environment.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` (case-insensitive).
/// Unknown values yield `None` so callers keep their default.
pub fn get_env_flag(key: &str) -> Option<bool> {
    let raw = get_env_with_prefix(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("SAAS_ENV_TEST_VAR", "prefixed_value");
        }
        assert_eq!(get_env_with_prefix("ENV_TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("SAAS_ENV_TEST_VAR");
        }

        unsafe {
            std::env::set_var("ENV_FALLBACK_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("ENV_FALLBACK_VAR"), Some("unprefixed_value".to_string()));
        unsafe {
            std::env::remove_var("ENV_FALLBACK_VAR");
        }

        assert_eq!(get_env_with_prefix("ENV_NON_EXISTENT_VAR"), None);
    }

    #[test]
    fn test_get_env_flag() {
        unsafe {
            std::env::set_var("SAAS_ENV_FLAG_ON", "Yes");
            std::env::set_var("SAAS_ENV_FLAG_OFF", "0");
            std::env::set_var("SAAS_ENV_FLAG_JUNK", "maybe");
        }
        assert_eq!(get_env_flag("ENV_FLAG_ON"), Some(true));
        assert_eq!(get_env_flag("ENV_FLAG_OFF"), Some(false));
        assert_eq!(get_env_flag("ENV_FLAG_JUNK"), None);
        assert_eq!(get_env_flag("ENV_FLAG_MISSING"), None);
        unsafe {
            std::env::remove_var("SAAS_ENV_FLAG_ON");
            std::env::remove_var("SAAS_ENV_FLAG_OFF");
            std::env::remove_var("SAAS_ENV_FLAG_JUNK");
        }
    }
}
