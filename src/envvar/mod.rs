use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("valid placeholder regex"))
}

pub fn is_defined(opt: &Option<String>) -> bool {
    opt.as_ref().map(|s| !s.is_empty()).unwrap_or(false)
}

/// Replaces `${VAR_NAME}` references with the environment variable's value.
/// Returns an error if any referenced variable is not set.
pub fn resolve_env_placeholders(input: &str) -> Result<String> {
    let mut resolved = input.to_string();
    for caps in placeholder_re().captures_iter(input) {
        let var_name = &caps[1];
        let env_val = std::env::var(var_name)
            .with_context(|| format!("Environment variable '{var_name}' is not set"))?;
        resolved = resolved.replace(&caps[0], &env_val);
    }
    Ok(resolved)
}

/// [`resolve_env_placeholders`] lifted over an optional value
pub fn resolve_optional(input: Option<String>) -> Result<Option<String>> {
    input.map(|s| resolve_env_placeholders(&s)).transpose()
}
