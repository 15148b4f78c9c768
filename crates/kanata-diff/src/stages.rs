use std::collections::BTreeSet;
use std::fmt;

/// Stages compared when none are requested.
pub const DEFAULT_STAGES: [&str; 6] = ["IF", "WB", "RN", "EX", "PNR", "CO"];

/// The set of pipeline stages whose cycles are compared.
///
/// Kept sorted so reports list stages in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSet(BTreeSet<String>);

impl StageSet {
    /// Build a stage set from `-s/--stages` values.
    ///
    /// Each value is split on commas and the union of all tokens is taken.
    /// No values at all selects [`DEFAULT_STAGES`]; values that contain only
    /// empty tokens yield `None`.
    pub fn from_args<S: AsRef<str>>(values: &[S]) -> Option<Self> {
        if values.is_empty() {
            return Some(Self::default());
        }
        let stages: BTreeSet<String> = values
            .iter()
            .flat_map(|value| value.as_ref().split(','))
            .map(str::trim)
            .filter(|stage| !stage.is_empty())
            .map(String::from)
            .collect();
        if stages.is_empty() {
            None
        } else {
            Some(Self(stages))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.0.contains(stage)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StageSet {
    fn default() -> Self {
        Self(DEFAULT_STAGES.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for StageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for StageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(stage)?;
        }
        Ok(())
    }
}
