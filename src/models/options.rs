use serde::{Deserialize, Serialize};

/// Question type codes in canonical display and output order.
///
/// The first eight are the codes embedded in the question set files. `M` is
/// the synthetic "Memory Verse totals" group, computed as the per-column
/// sum of the `Q`, `R`, and `V` categories.
pub const QUESTION_TYPE_CODES: [char; 9] = ['A', 'G', 'I', 'Q', 'R', 'S', 'X', 'V', 'M'];

/// Options read fresh from the form each time a run is requested.
///
/// Not part of [`crate::models::AppState`]: the form owns these between
/// runs, and reset restores the form to these defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Field separator for the output table. Blank falls back to a comma.
    pub delimiter: String,
    /// Tournament name used to exclude records from other tournaments.
    /// Empty disables the filter.
    pub tournament: String,
    /// One flag per entry of [`QUESTION_TYPE_CODES`].
    pub type_flags: [bool; 9],
    /// Append a per-round breakdown after the overall table.
    pub display_individual_rounds: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            tournament: String::new(),
            type_flags: [true; 9],
            display_individual_rounds: false,
        }
    }
}

impl RunOptions {
    /// Delimiter with the blank-entry fallback applied.
    pub fn effective_delimiter(&self) -> String {
        if self.delimiter.is_empty() {
            ",".to_string()
        } else {
            self.delimiter.clone()
        }
    }

    /// The enabled subset of [`QUESTION_TYPE_CODES`], canonical order
    /// preserved.
    pub fn selected_type_codes(&self) -> Vec<char> {
        Self::codes_for(&self.type_flags)
    }

    /// The enabled subset of [`QUESTION_TYPE_CODES`] for a flag array.
    pub fn codes_for(type_flags: &[bool; 9]) -> Vec<char> {
        QUESTION_TYPE_CODES
            .iter()
            .zip(type_flags.iter())
            .filter(|(_, &enabled)| enabled)
            .map(|(&code, _)| code)
            .collect()
    }
}
