//! Console report of a trace comparison.

use std::io::{self, Write};

use console::style;
use kanata_log::{Cycle, Trace};

use crate::{Finding, Side, StageDelta, StageSet, TraceComparison};

/// Width of the rules framing the first-difference block.
const RULE_WIDTH: usize = 70;

/// Marker appended to a differing stage row.
pub const DIFF_MARKER: &str = " <-- DIFF";

/// Writes the human-readable comparison report.
pub struct Reporter<W: Write> {
    out: W,
    left_name: String,
    right_name: String,
    color: bool,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter naming the two traces `left_name` and `right_name`.
    #[must_use]
    pub fn new(out: W, left_name: impl Into<String>, right_name: impl Into<String>) -> Self {
        Self {
            out,
            left_name: left_name.into(),
            right_name: right_name.into(),
            color: false,
        }
    }

    /// Enable or disable ANSI styling.
    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Announce which stages will be compared.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn stages(&mut self, stages: &StageSet) -> io::Result<()> {
        writeln!(self.out, "Checking stages: {stages}")?;
        writeln!(self.out)
    }

    /// Announce that a trace is about to be parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn parsing(&mut self, side: Side) -> io::Result<()> {
        let name = side_name(side, &self.left_name, &self.right_name);
        writeln!(self.out, "Parsing {name}...")
    }

    /// Report the instruction count of both traces.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn counts(&mut self, left: &Trace, right: &Trace) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Found {} instructions in {}", left.len(), self.left_name)?;
        writeln!(self.out, "Found {} instructions in {}", right.len(), self.right_name)
    }

    /// Report every finding in id order, then the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn comparison(&mut self, result: &TraceComparison) -> io::Result<()> {
        for finding in &result.findings {
            match finding {
                Finding::Missing { id, missing_from } => {
                    let name = side_name(*missing_from, &self.left_name, &self.right_name);
                    writeln!(self.out)?;
                    writeln!(self.out, "Instruction {id} missing in {name}")?;
                }
                Finding::LabelMismatch { id, left, right } => {
                    writeln!(self.out)?;
                    let warning = style("Warning:").yellow().force_styling(self.color);
                    writeln!(self.out, "{warning} Instruction {id} has different labels:")?;
                    writeln!(self.out, "  {}: {left}", self.left_name)?;
                    writeln!(self.out, "  {}: {right}", self.right_name)?;
                }
                Finding::StageTiming { id, label, deltas } => {
                    if result.first_divergence == Some(*id) {
                        self.first_difference(*id, label, deltas)?;
                    }
                }
            }
        }
        self.summary(result)
    }

    fn first_difference(&mut self, id: i64, label: &str, deltas: &[StageDelta]) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out)?;
        writeln!(self.out, "{rule}")?;
        writeln!(
            self.out,
            "{}",
            style("FIRST DIFFERENCE FOUND")
                .red()
                .bold()
                .force_styling(self.color)
        )?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "Instruction ID: {id}")?;
        if !label.is_empty() {
            writeln!(self.out, "Instruction:    {label}")?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "Stage timing differences:")?;
        writeln!(
            self.out,
            "{:<10} {:>20} {:>20}",
            "Stage", self.left_name, self.right_name
        )?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        for delta in deltas {
            let marker = if delta.left == delta.right {
                String::new()
            } else {
                style(DIFF_MARKER).red().force_styling(self.color).to_string()
            };
            writeln!(
                self.out,
                "{:<10} {:>20} {:>20}{marker}",
                delta.stage,
                cycle_text(delta.left),
                cycle_text(delta.right)
            )?;
        }
        writeln!(self.out, "{rule}")?;
        writeln!(self.out)
    }

    fn summary(&mut self, result: &TraceComparison) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", style("Summary:").bold().force_styling(self.color))?;
        writeln!(self.out, "  Total instructions checked: {}", result.checked)?;
        writeln!(self.out, "  Instructions with differences: {}", result.divergent)?;
        match result.first_divergence {
            Some(id) => writeln!(self.out, "  First difference at instruction ID: {id}")?,
            None => writeln!(
                self.out,
                "  {}",
                style("No differences found!").green().force_styling(self.color)
            )?,
        }
        self.out.flush()
    }
}

const fn side_name<'a>(side: Side, left: &'a str, right: &'a str) -> &'a str {
    match side {
        Side::Left => left,
        Side::Right => right,
    }
}

fn cycle_text(cycle: Option<Cycle>) -> String {
    cycle.map_or_else(|| "N/A".to_string(), |c| c.to_string())
}
