//! Declared-set validation
//!
//! The whole declared set is scanned before anything is mutated. A single
//! record with an unrecognized state invalidates the entire run.

use crate::error::{Error, InvalidState, Result};
use crate::record::{DeclaredRecord, DesiredState};
use tracing::error;

/// A declared record whose state has been checked
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRecord<'a> {
    pub record: &'a DeclaredRecord,
    pub state: DesiredState,
}

/// Validate every declared record's state
///
/// Returns the records paired with their parsed state, in input order, or
/// [`Error::InvalidState`] listing every offending record.
pub fn validate(declared: &[DeclaredRecord]) -> Result<Vec<ValidatedRecord<'_>>> {
    let mut validated = Vec::with_capacity(declared.len());
    let mut violations = Vec::new();

    for record in declared {
        match record.desired_state() {
            Some(state) => validated.push(ValidatedRecord { record, state }),
            None => {
                error!("Invalid record state: {:?} for {}", record.state, record.name);
                violations.push(InvalidState {
                    name: record.name.clone(),
                    value: record.state.clone(),
                });
            }
        }
    }

    if !violations.is_empty() {
        return Err(Error::InvalidState(violations));
    }

    Ok(validated)
}
