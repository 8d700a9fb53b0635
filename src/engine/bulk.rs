//! Bulk variants: run an operation over every registered link with per-item
//! isolation and an aggregate tally. Relink fans out one rayon worker per
//! link; every worker fills its own outcome slot, so the aggregate never
//! depends on which worker finished last.

use rayon::prelude::*;
use tracing::{error, info};

use super::{LinkEngine, RelinkOutcome};

/// Tally of a bulk operation. Partial failure is a normal outcome, not an
/// error: callers read the counts.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug)]
pub struct BulkFailure {
    pub name: String,
    pub error: String,
}

impl BulkReport {
    fn tally(outcomes: Vec<(String, Result<(), String>)>) -> Self {
        let mut report = BulkReport {
            total: outcomes.len(),
            ..Default::default()
        };
        for (name, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded += 1,
                Err(error) => {
                    report.failed += 1;
                    report.failures.push(BulkFailure { name, error });
                }
            }
        }
        report
    }
}

impl LinkEngine {
    /// Reconcile every registered link, one worker per link.
    pub fn relink_all(&self) -> BulkReport {
        let names: Vec<String> = self.registry().links().into_keys().collect();
        let outcomes: Vec<(String, Result<(), String>)> = names
            .into_par_iter()
            .map(|name| {
                let outcome = match self.relink(&name) {
                    Ok(RelinkOutcome::Intact) => {
                        info!(name = %name, "Link intact");
                        Ok(())
                    }
                    Ok(RelinkOutcome::Repaired) => {
                        info!(name = %name, "Link repaired");
                        Ok(())
                    }
                    Err(e) => {
                        let msg = format!("{e:#}");
                        error!(name = %name, error = %msg, "Relink failed");
                        Err(msg)
                    }
                };
                (name, outcome)
            })
            .collect();

        BulkReport::tally(outcomes)
    }

    /// Remove every registered link, one at a time: move-backs are heavy and
    /// failure-prone, so they don't race each other.
    pub fn remove_all(&self) -> BulkReport {
        let names: Vec<String> = self.registry().links().into_keys().collect();
        let outcomes: Vec<(String, Result<(), String>)> = names
            .into_iter()
            .map(|name| {
                let outcome = match self.remove(&name) {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        let msg = format!("{e:#}");
                        error!(name = %name, error = %msg, "Remove failed");
                        Err(msg)
                    }
                };
                (name, outcome)
            })
            .collect();

        BulkReport::tally(outcomes)
    }
}
