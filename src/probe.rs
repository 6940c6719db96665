use chrono::{DateTime, Local};
use log::{info, warn};

use crate::client::ApiClient;
use crate::config::CheckConfig;
use crate::inspect::{inspect_with_limit, InspectionResult, View, RAW_DUMP_LIMIT};

/// Result of one named check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub endpoint: String,
    pub view: View,
    pub result: InspectionResult,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.result.success
    }
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub started_at: DateTime<Local>,
    pub outcomes: Vec<CheckOutcome>,
}

impl ProbeReport {
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }
}

/// Runs a batch of checks one after another against a borrowed client.
pub struct ProbeRunner<'a, C: ApiClient + ?Sized> {
    client: &'a C,
    dump_limit: usize,
}

impl<'a, C: ApiClient + ?Sized> ProbeRunner<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self::with_dump_limit(client, RAW_DUMP_LIMIT)
    }

    pub fn with_dump_limit(client: &'a C, dump_limit: usize) -> Self {
        Self { client, dump_limit }
    }

    pub async fn run(&self, checks: &[CheckConfig]) -> ProbeReport {
        let started_at = Local::now();
        let mut outcomes = Vec::with_capacity(checks.len());

        for check in checks {
            outcomes.push(self.run_check(check).await);
        }

        ProbeReport {
            started_at,
            outcomes,
        }
    }

    pub async fn run_check(&self, check: &CheckConfig) -> CheckOutcome {
        info!(
            "Running check `{}` ({} via {})",
            check.name, check.view, check.endpoint
        );

        let result = match self.client.call(&check.endpoint, &check.query).await {
            Ok(response) => inspect_with_limit(Some(&response), check.view, self.dump_limit),
            Err(err) => {
                warn!(
                    "Check `{}` could not reach {}: {}",
                    check.name,
                    check.endpoint,
                    err.describe()
                );
                InspectionResult::from_fault(&err)
            }
        };

        info!(
            "Check `{}` {}",
            check.name,
            if result.success { "passed" } else { "failed" }
        );

        CheckOutcome {
            name: check.name.clone(),
            endpoint: check.endpoint.clone(),
            view: check.view,
            result,
        }
    }
}
