//! `${VAR}` expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// An unset variable without a default is an error naming `field`.
/// Strings without `${` are returned as written.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    // Unset variables resolve to `None` so `:-` defaults apply; a reference
    // without a default is reported afterwards.
    let mut unset = Vec::new();
    let expanded = shellexpand::env_with_context_no_errors(value, |name| {
        let found = std::env::var(name).ok();
        if found.is_none() {
            unset.push(name.to_owned());
        }
        found
    })
    .into_owned();

    if let Some(name) = unset
        .iter()
        .find(|name| value.contains(&format!("${{{name}}}")))
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        });
    }

    Ok(expanded)
}
