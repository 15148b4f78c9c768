//! Instruction-by-instruction comparison of two loaded traces.

use std::collections::BTreeSet;
use std::fmt;

use kanata_log::{Cycle, InstrId, InstructionRecord, Trace};
use metrics::counter;

use crate::StageSet;

/// Which of the two traces is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Cycles of one checked stage that disagree between the traces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDelta {
    pub stage: String,
    pub left: Option<Cycle>,
    pub right: Option<Cycle>,
}

/// Something noticed while walking the instruction ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// The instruction exists in only one trace.
    Missing { id: InstrId, missing_from: Side },
    /// Both traces label the instruction, differently. Advisory only.
    LabelMismatch {
        id: InstrId,
        left: String,
        right: String,
    },
    /// At least one checked stage was entered at a different cycle.
    StageTiming {
        id: InstrId,
        label: String,
        deltas: Vec<StageDelta>,
    },
}

impl Finding {
    #[must_use]
    pub const fn id(&self) -> InstrId {
        match self {
            Self::Missing { id, .. }
            | Self::LabelMismatch { id, .. }
            | Self::StageTiming { id, .. } => *id,
        }
    }

    /// Whether this finding counts as a difference.
    #[must_use]
    pub const fn is_divergence(&self) -> bool {
        !matches!(self, Self::LabelMismatch { .. })
    }

    const fn kind(&self) -> DivergenceKind {
        match self {
            Self::Missing { .. } => DivergenceKind::Presence,
            Self::LabelMismatch { .. } => DivergenceKind::Label,
            Self::StageTiming { .. } => DivergenceKind::StageTiming,
        }
    }
}

/// Type of finding, used for metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceKind {
    Presence,
    Label,
    StageTiming,
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => write!(f, "presence"),
            Self::Label => write!(f, "label"),
            Self::StageTiming => write!(f, "stage_timing"),
        }
    }
}

/// Result of comparing two traces.
#[derive(Debug, Default)]
pub struct TraceComparison {
    /// Number of distinct instruction ids across both traces.
    pub checked: usize,
    /// Number of ids that differ in presence or stage timing.
    pub divergent: usize,
    /// Lowest id that differs.
    pub first_divergence: Option<InstrId>,
    /// Findings in ascending id order.
    pub findings: Vec<Finding>,
}

impl TraceComparison {
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.first_divergence.is_none()
    }

    /// Process exit code: 0 when identical, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.is_identical() { 0 } else { 1 }
    }

    fn push(&mut self, finding: Finding) {
        counter!("kanata_divergences_total", "kind" => finding.kind().to_string()).increment(1);
        if finding.is_divergence() {
            self.divergent += 1;
            if self.first_divergence.is_none() {
                self.first_divergence = Some(finding.id());
            }
        }
        self.findings.push(finding);
    }
}

/// Compare two traces over the union of their instruction ids.
///
/// Ids are visited in ascending numeric order. An id missing from either
/// trace is a difference and its stages are not compared. Differing labels
/// are reported but never count as a difference; only presence and the
/// cycles of the stages in `stages` do.
#[must_use]
pub fn diff_traces(left: &Trace, right: &Trace, stages: &StageSet) -> TraceComparison {
    let all_ids: BTreeSet<InstrId> = left.ids().chain(right.ids()).collect();
    let mut result = TraceComparison {
        checked: all_ids.len(),
        ..TraceComparison::default()
    };

    for id in all_ids {
        let (l, r) = match (left.get(id), right.get(id)) {
            (Some(l), Some(r)) => (l, r),
            (None, _) => {
                result.push(Finding::Missing {
                    id,
                    missing_from: Side::Left,
                });
                continue;
            }
            (_, None) => {
                result.push(Finding::Missing {
                    id,
                    missing_from: Side::Right,
                });
                continue;
            }
        };

        if !l.label.is_empty() && !r.label.is_empty() && l.label != r.label {
            result.push(Finding::LabelMismatch {
                id,
                left: l.label.clone(),
                right: r.label.clone(),
            });
        }

        let deltas = stage_deltas(l, r, stages);
        if !deltas.is_empty() {
            result.push(Finding::StageTiming {
                id,
                label: l.label.clone(),
                deltas,
            });
        }
    }

    counter!("kanata_instructions_checked_total").increment(result.checked as u64);
    result
}

/// Checked stages whose cycles differ; an absent stage only equals another absent one.
fn stage_deltas(
    left: &InstructionRecord,
    right: &InstructionRecord,
    stages: &StageSet,
) -> Vec<StageDelta> {
    stages
        .iter()
        .filter_map(|stage| {
            let (l, r) = (left.stage(stage), right.stage(stage));
            (l != r).then(|| StageDelta {
                stage: stage.to_string(),
                left: l,
                right: r,
            })
        })
        .collect()
}
