use crate::{Cycle, InstrId, LineError};

/// Field separator of the Kanata log.
pub const FIELD_SEPARATOR: char = '\t';

/// A decoded Kanata event.
///
/// Only the events that affect stage timing are modelled; every other code
/// is accepted and ignored by [`Event::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// `C <delta>`: advance the running cycle counter.
    CycleAdvance(Cycle),
    /// `C= <value>`: overwrite the running cycle counter.
    CycleSet(Cycle),
    /// `I <id> <tid> <inum>`: introduce an instruction.
    Init { id: InstrId },
    /// `L <id> <tid> <text...>`: attach a label to an instruction.
    Label { id: InstrId, text: String },
    /// `S <id> <relative_cycle> <stage>`: an instruction entered a stage.
    Stage {
        id: InstrId,
        relative: Cycle,
        stage: &'a str,
    },
}

impl<'a> Event<'a> {
    /// Decode one raw log line.
    ///
    /// Returns `Ok(None)` for blank lines, lines with fewer than two fields
    /// and unknown event codes. Every field an event needs is converted
    /// before the event is returned, so an `Err` never carries partial state.
    ///
    /// # Errors
    ///
    /// Returns a [`LineError`] when a required field is missing or is not an
    /// integer.
    pub fn parse(line: &'a str) -> Result<Option<Self>, LineError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let Some((&code, args)) = fields.split_first() else {
            return Ok(None);
        };
        if args.is_empty() {
            return Ok(None);
        }

        let event = match code {
            "C" => Self::CycleAdvance(int_field(args, 0, "C", "cycle delta")?),
            "C=" => Self::CycleSet(int_field(args, 0, "C=", "cycle value")?),
            "I" => Self::Init {
                id: int_field(args, 0, "I", "instruction id")?,
            },
            "L" => Self::Label {
                id: int_field(args, 0, "L", "instruction id")?,
                text: args.get(2..).map(|text| text.join(" ")).unwrap_or_default(),
            },
            "S" => {
                require(args, 3, "S")?;
                Self::Stage {
                    id: int_field(args, 0, "S", "instruction id")?,
                    relative: int_field(args, 1, "S", "relative cycle")?,
                    stage: args[2],
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

const fn require(args: &[&str], expected: usize, code: &'static str) -> Result<(), LineError> {
    if args.len() < expected {
        return Err(LineError::MissingField {
            code,
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn int_field(
    args: &[&str],
    index: usize,
    code: &'static str,
    field: &'static str,
) -> Result<i64, LineError> {
    require(args, index + 1, code)?;
    let raw = args[index].trim();
    raw.parse::<i64>().map_err(|source| LineError::InvalidInteger {
        field,
        value: raw.to_string(),
        source,
    })
}
