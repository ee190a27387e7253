use std::fmt::Display;

//--------------------------------------  UnhandledDifference -------------------------------------------------------
/// A difference between a stored order and an incoming snapshot in a field the merge engine has no
/// defined handling for. Never applied silently; surfaced on the merge outcome so the operator loop
/// can decide whether to continue or halt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledDifference {
    pub field: &'static str,
    pub stored: String,
    pub incoming: String,
}

impl Display for UnhandledDifference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: stored '{}' != incoming '{}'", self.field, self.stored, self.incoming)
    }
}

//--------------------------------------     MergeOutcome     --------------------------------------------------------
/// Result of merging one order snapshot into the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No row existed for (order id, vendor, status); the order and all dependents were inserted.
    Inserted { surrogate_id: i64 },
    /// The row existed and at least one field or collection was brought up to date.
    Updated {
        surrogate_id: i64,
        /// Scalar fields that received an individual update.
        changed_fields: Vec<&'static str>,
        /// Dependent collections that were deleted and reinserted as a whole.
        replaced_collections: Vec<&'static str>,
        /// Differences the engine has no handling for. Nothing was written for these.
        unhandled: Vec<UnhandledDifference>,
    },
    /// The row existed and the snapshot carried no new information; nothing was written.
    Unchanged { surrogate_id: i64 },
}

impl MergeOutcome {
    pub fn surrogate_id(&self) -> i64 {
        match self {
            MergeOutcome::Inserted { surrogate_id }
            | MergeOutcome::Updated { surrogate_id, .. }
            | MergeOutcome::Unchanged { surrogate_id } => *surrogate_id,
        }
    }

    pub fn unhandled(&self) -> &[UnhandledDifference] {
        match self {
            MergeOutcome::Updated { unhandled, .. } => unhandled,
            _ => &[],
        }
    }
}

//--------------------------------------     GmvWriteStats    --------------------------------------------------------
/// Write tally of one GMV recomputation. A month whose stored value already equals the newly
/// computed one is skipped, which is what makes recomputation idempotent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GmvWriteStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}
