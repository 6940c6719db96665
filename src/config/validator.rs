use std::collections::HashSet;

use crate::error::{AppError, Result};

use super::{ApiConfig, CheckConfig, Config};

/// Validate a probe configuration and surface every issue at once.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_api(&config.api, &mut issues);
    validate_checks(&config.checks, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "probe config invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_api(api: &ApiConfig, issues: &mut Vec<String>) {
    let base_url = api.base_url.trim();
    if base_url.is_empty() {
        issues.push("api.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        issues.push(format!(
            "api.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if api.timeout_secs == 0 {
        issues.push("api.timeout_secs must be greater than zero".to_string());
    }

    if api.dump_limit == 0 {
        issues.push("api.dump_limit must be greater than zero".to_string());
    }
}

fn validate_checks(checks: &[CheckConfig], issues: &mut Vec<String>) {
    if checks.is_empty() {
        issues.push("at least one check must be configured".to_string());
        return;
    }

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();

    for (idx, check) in checks.iter().enumerate() {
        let name = check.name.trim();
        if name.is_empty() {
            issues.push(format!("checks[{idx}].name must not be empty"));
        } else if !seen.insert(name.to_lowercase()) {
            duplicates.push(name.to_string());
        }

        if check.endpoint.trim().is_empty() {
            issues.push(format!("checks[{idx}].endpoint must not be empty"));
        }
    }

    if !duplicates.is_empty() {
        issues.push(format!(
            "checks contain duplicate names: {}",
            duplicates.join(", ")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::View;

    #[test]
    fn accepts_builtin_config() {
        validate_config(&Config::builtin()).expect("builtin config should be valid");
    }

    #[test]
    fn rejects_duplicate_check_names() {
        let mut config = Config::builtin();
        let mut copy = config.checks[0].clone();
        copy.name = "CHART".to_string();
        config.checks.push(copy);

        let err = validate_config(&config).expect_err("validation should fail");
        let message = err.to_string();
        assert!(
            message.contains("duplicate names"),
            "unexpected error message: {message}"
        );
    }

    #[test]
    fn collects_every_api_issue() {
        let mut config = Config::builtin();
        config.api.base_url = "ftp://example.com".to_string();
        config.api.timeout_secs = 0;
        config.api.dump_limit = 0;

        let message = validate_config(&config)
            .expect_err("validation should fail")
            .to_string();
        assert!(message.contains("http://"), "unexpected error message: {message}");
        assert!(message.contains("timeout_secs"), "unexpected error message: {message}");
        assert!(message.contains("dump_limit"), "unexpected error message: {message}");
    }

    #[test]
    fn rejects_empty_endpoint_and_empty_batch() {
        let mut config = Config::builtin();
        config.checks = vec![CheckConfig {
            name: "blank".to_string(),
            endpoint: "  ".to_string(),
            query: Default::default(),
            view: View::RawDump,
        }];
        let err = validate_config(&config).expect_err("validation should fail");
        assert!(err.to_string().contains("endpoint must not be empty"));

        config.checks.clear();
        let err = validate_config(&config).expect_err("validation should fail");
        assert!(err.to_string().contains("at least one check"));
    }
}
