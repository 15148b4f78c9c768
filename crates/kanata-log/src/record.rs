use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use crate::{Cycle, InstrId, LineError};

/// Timing of one dynamic instruction within a trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionRecord {
    /// Identifier assigned by the tracer.
    pub id: InstrId,
    /// Disassembly text, empty when the trace never labelled the instruction.
    pub label: String,
    stages: FxHashMap<String, Cycle>,
}

impl InstructionRecord {
    /// Create a record with no label and no stages.
    #[must_use]
    pub fn new(id: InstrId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Absolute cycle at which `stage` was first entered.
    #[must_use]
    pub fn stage(&self, stage: &str) -> Option<Cycle> {
        self.stages.get(stage).copied()
    }

    /// Record that `stage` was entered at `cycle`.
    ///
    /// Only the first occurrence of a stage is kept. Returns `false` (and
    /// leaves the record untouched) when the stage was already recorded.
    pub fn enter_stage(&mut self, stage: &str, cycle: Cycle) -> bool {
        if let Entry::Vacant(slot) = self.stages.entry(stage.to_string()) {
            slot.insert(cycle);
            true
        } else {
            false
        }
    }

    /// Iterate over `(stage, cycle)` pairs in unspecified order.
    pub fn stages(&self) -> impl Iterator<Item = (&str, Cycle)> {
        self.stages.iter().map(|(stage, &cycle)| (stage.as_str(), cycle))
    }

    /// Number of distinct stages recorded.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// A line the loader skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number.
    pub line: usize,
    /// The raw line as read from the file.
    pub text: String,
    pub error: LineError,
}

/// All instruction records of one trace file.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    /// Name used in diagnostics (usually the file path).
    pub source: String,
    records: FxHashMap<InstrId, InstructionRecord>,
    warnings: Vec<ParseWarning>,
    lines: usize,
}

impl Trace {
    /// Create an empty trace.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Get the record for `id`, creating an empty one if absent.
    pub fn record_mut(&mut self, id: InstrId) -> &mut InstructionRecord {
        self.records
            .entry(id)
            .or_insert_with(|| InstructionRecord::new(id))
    }

    #[must_use]
    pub fn get(&self, id: InstrId) -> Option<&InstructionRecord> {
        self.records.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: InstrId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of instructions in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Instruction ids in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = InstrId> + '_ {
        self.records.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &InstructionRecord> {
        self.records.values()
    }

    /// Lines skipped because they could not be decoded.
    #[must_use]
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Number of lines read, including blank and ignored ones.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }

    pub(crate) fn push_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    pub(crate) const fn set_lines(&mut self, lines: usize) {
        self.lines = lines;
    }
}
