//! Environment variable interpolation for configuration files

use super::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
});

/// Interpolate `${VAR}` references using the process environment
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    interpolate_with(content, |name| std::env::var(name).ok())
}

/// Interpolate `${VAR}` references using an arbitrary lookup
///
/// The first unresolved variable is reported as [`ConfigError::EnvVarNotFound`].
pub fn interpolate_with<F>(content: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = None;

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        match lookup(var_name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    if let Some(var) = missing {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    Ok(result.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_interpolate_env_vars() {
        let content = "api_key: ${TEST_VAR}";
        let result = interpolate_with(content, lookup(&[("TEST_VAR", "test_value")])).unwrap();
        assert_eq!(result, "api_key: test_value");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "api_key: ${MISSING_VAR}";
        let result = interpolate_with(content, lookup(&[]));

        if let Err(ConfigError::EnvVarNotFound { var }) = result {
            assert_eq!(var, "MISSING_VAR");
        } else {
            panic!("Expected EnvVarNotFound error");
        }
    }

    #[test]
    fn test_multiple_env_vars() {
        let content = "key1: ${VAR1}, key2: ${VAR2}, again: ${VAR1}";
        let result =
            interpolate_with(content, lookup(&[("VAR1", "value1"), ("VAR2", "value2")])).unwrap();
        assert_eq!(result, "key1: value1, key2: value2, again: value1");
    }

    #[test]
    fn test_lowercase_placeholder_is_left_alone() {
        let content = "note: ${not_a_var}";
        let result = interpolate_with(content, lookup(&[])).unwrap();
        assert_eq!(result, content);
    }
}
