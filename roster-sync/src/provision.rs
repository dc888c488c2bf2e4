//! Secret assignment and account mutation.
//!
//! New accounts get a secret, a `set_password` call, and one
//! `enable_service` call per configured service. Existing accounts with a
//! blank secret only get a secret and `set_password`.
//!
//! Every directory call is isolated: a failure becomes a
//! [`OutcomeStatus::Failed`] outcome and the batch continues. In
//! [`ExecutionMode::DryRun`] no call is issued; each would-be call yields a
//! [`OutcomeStatus::Simulated`] outcome.

use roster_core::{ExecutionMode, StudentRecord, Username};

use crate::directory::AccountDirectory;
use crate::report::{Operation, OutcomeStatus, ProvisioningOutcome};
use crate::secret::{SecretSource, SECRET_MASK};

pub struct Provisioner<D, S> {
    directory: D,
    secrets: S,
    mode: ExecutionMode,
    services: Vec<String>,
}

impl<D: AccountDirectory, S: SecretSource> Provisioner<D, S> {
    pub fn new(directory: D, secrets: S, mode: ExecutionMode, services: Vec<String>) -> Self {
        Self {
            directory,
            secrets,
            mode,
            services,
        }
    }

    /// Provision `new_records` (always) and `existing` records whose secret is
    /// blank. New records are processed first.
    pub fn provision(
        &mut self,
        new_records: &mut [StudentRecord],
        existing: &mut [StudentRecord],
    ) -> Vec<ProvisioningOutcome> {
        let mut outcomes = Vec::new();
        for record in new_records.iter_mut() {
            self.provision_new(record, &mut outcomes);
        }
        for record in existing.iter_mut().filter(|r| r.needs_secret()) {
            self.backfill(record, &mut outcomes);
        }
        outcomes
    }

    fn provision_new(&mut self, record: &mut StudentRecord, outcomes: &mut Vec<ProvisioningOutcome>) {
        self.assign_and_set_password(record, outcomes);
        for service in &self.services {
            let operation = Operation::EnableService(service.clone());
            let status = match self.mode {
                ExecutionMode::DryRun => OutcomeStatus::Simulated,
                ExecutionMode::Live => match self.directory.enable_service(&record.username, service) {
                    Ok(()) => OutcomeStatus::Succeeded,
                    Err(err) => OutcomeStatus::Failed {
                        detail: err.to_string(),
                    },
                },
            };
            outcomes.push(log_outcome(&record.username, operation, status));
        }
    }

    fn backfill(&mut self, record: &mut StudentRecord, outcomes: &mut Vec<ProvisioningOutcome>) {
        tracing::info!(username = %record.username, "backfilling missing password");
        self.assign_and_set_password(record, outcomes);
    }

    /// Assign a fresh secret and push it to the directory. A secret the
    /// directory refused is cleared again so the next run retries it.
    fn assign_and_set_password(
        &mut self,
        record: &mut StudentRecord,
        outcomes: &mut Vec<ProvisioningOutcome>,
    ) {
        let secret = self.secrets.generate_secret();
        tracing::debug!(username = %record.username, "assigned password {SECRET_MASK}");

        let status = match self.mode {
            ExecutionMode::DryRun => OutcomeStatus::Simulated,
            ExecutionMode::Live => match self.directory.set_password(&record.username, &secret) {
                Ok(()) => OutcomeStatus::Succeeded,
                Err(err) => OutcomeStatus::Failed {
                    detail: err.to_string(),
                },
            },
        };
        record.secret = match status {
            OutcomeStatus::Failed { .. } => None,
            _ => Some(secret),
        };
        outcomes.push(log_outcome(&record.username, Operation::SetPassword, status));
    }
}

fn log_outcome(username: &Username, operation: Operation, status: OutcomeStatus) -> ProvisioningOutcome {
    let outcome = ProvisioningOutcome {
        username: username.clone(),
        operation,
        status,
    };
    match &outcome.status {
        OutcomeStatus::Failed { .. } => tracing::warn!("{outcome}"),
        OutcomeStatus::Simulated => tracing::info!("[dry-run] {outcome}"),
        OutcomeStatus::Succeeded => tracing::info!("{outcome}"),
    }
    outcome
}
