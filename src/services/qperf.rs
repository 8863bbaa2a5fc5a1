use crate::models::Readiness;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;

use super::engine::{ComputeEngine, EngineError, RunRequest, RunResult};

/// Question type codes that can appear in a question set file.
///
/// `M` is not in this list: it is a synthetic column group summed from the
/// `Q`, `R`, and `V` tallies at render time.
const BASE_TYPE_CODES: [char; 8] = ['A', 'G', 'I', 'Q', 'R', 'S', 'X', 'V'];

fn base_type_index(code: char) -> Option<usize> {
    BASE_TYPE_CODES.iter().position(|&c| c == code)
}

/// Toss-up and bonus counters for one quizzer and one question type
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TypeTally {
    toss_attempts: f32,
    toss_correct: f32,
    bonus_attempts: f32,
    bonus_correct: f32,
}

impl TypeTally {
    fn add(&mut self, other: &TypeTally) {
        self.toss_attempts += other.toss_attempts;
        self.toss_correct += other.toss_correct;
        self.bonus_attempts += other.bonus_attempts;
        self.bonus_correct += other.bonus_correct;
    }
}

/// Scoring events recognized in QuizMachine records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    TossCorrect,
    TossError,
    BonusCorrect,
    BonusError,
}

/// One scorable row from a QuizMachine record file
///
/// QuizMachine wraps text values in single quotes; the quotes are kept as
/// written so round keys and quizzer names compare byte-for-byte against
/// the question set map and the output rows.
#[derive(Debug, Clone)]
struct QuizRecord {
    tournament: String,
    round: String,
    /// Question number, zero-based
    question: usize,
    quizzer: String,
    team: usize,
    event: EventKind,
}

impl QuizRecord {
    /// Parse a CSV row into a scorable record
    ///
    /// Returns `None` for rows that do not carry one of the four scoring
    /// event codes or whose question number does not parse to a positive
    /// integer. Such rows are not errors; QuizMachine files interleave
    /// scoring events with other bookkeeping rows.
    fn from_row(row: &csv::StringRecord) -> Option<Self> {
        let event = match row.get(10)? {
            "'TC'" => EventKind::TossCorrect,
            "'TE'" => EventKind::TossError,
            "'BC'" => EventKind::BonusCorrect,
            "'BE'" => EventKind::BonusError,
            _ => return None,
        };

        let question = row
            .get(5)?
            .trim_matches('\'')
            .parse::<usize>()
            .ok()?
            .checked_sub(1)?;

        Some(Self {
            tournament: row.get(1).unwrap_or("").to_string(),
            round: row.get(4).unwrap_or("").to_string(),
            question,
            quizzer: row.get(7).unwrap_or("").to_string(),
            team: row.get(8).unwrap_or("").parse().unwrap_or(0),
            event,
        })
    }
}

/// In-process scoring engine for QuizMachine records
///
/// Parses the selected question set files for per-round question types,
/// scores the selected record files against them, and renders the
/// per-quizzer performance table.
///
/// # Question set format
///
/// Question set files are RTF exports from the Set Maker tool. The parser
/// works on the raw RTF text:
///
/// - `set_marker` finds `SET #n` markers that open a new round
///   - Pattern: `SET #([A-Za-z0-9]+)`
///   - The captured number is stored quoted (`'n'`) to match the round
///     column of the record files
/// - fragments between `\tab` control words carry the questions; every
///   even-indexed non-empty fragment holds its question's type code as the
///   second-to-last character
///
/// # Design Philosophy
///
/// - **Stateless**: All operations take explicit parameters; no hidden state
/// - **Framework-agnostic**: No GUI dependencies, works with any UI or CLI
/// - **Synchronous**: Callers dispatch `run` off the UI thread
pub struct QperfEngine {
    /// Regex for detecting "SET #n" round markers in question set files
    set_marker: Regex,
}

impl QperfEngine {
    /// Create a new QperfEngine with compiled regex patterns
    pub fn new() -> Self {
        Self {
            set_marker: Regex::new(r"SET #([A-Za-z0-9]+)").expect("Invalid set marker regex"),
        }
    }

    /// Parse every selected question set file into a round -> types map
    ///
    /// Within a file a repeated round number silently keeps the last
    /// occurrence; across files the first file wins and a warning is
    /// recorded.
    fn read_question_sets(
        &self,
        paths: &[Utf8PathBuf],
        warnings: &mut Vec<String>,
    ) -> Result<HashMap<String, Vec<char>>, EngineError> {
        let mut sets: HashMap<String, Vec<char>> = HashMap::new();

        for path in paths {
            if !matches!(path.extension(), Some(ext) if ext.eq_ignore_ascii_case("rtf")) {
                tracing::debug!("Skipping non-rtf question file: {}", path);
                continue;
            }

            let content = fs::read_to_string(path)?;
            for (round, types) in self.parse_question_file(&content) {
                if sets.contains_key(&round) {
                    let warning = format!(
                        "Warning: Duplicate question set number: {}, using only the first.",
                        round
                    );
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                } else {
                    sets.insert(round, types);
                }
            }
        }

        Ok(sets)
    }

    /// Extract per-round question types from one question set file
    fn parse_question_file(&self, content: &str) -> HashMap<String, Vec<char>> {
        let mut sets: HashMap<String, Vec<char>> = HashMap::new();
        let mut round: Option<String> = None;
        let mut types: Vec<char> = Vec::new();

        for (i, part) in content.split("\\tab").enumerate() {
            // A marker can sit anywhere in a fragment, so check every one
            if let Some(caps) = self.set_marker.captures(part) {
                if let Some(current) = round.take() {
                    if !types.is_empty() {
                        sets.insert(current, std::mem::take(&mut types));
                    }
                }
                types.clear();
                round = Some(format!("'{}'", &caps[1]));
            }

            // Type codes sit at the second-to-last character of every
            // even-indexed fragment once a round is open
            if i % 2 == 0 && round.is_some() {
                let chars: Vec<char> = part.chars().collect();
                if chars.len() > 1 {
                    types.push(chars[chars.len() - 2]);
                }
            }
        }

        if let Some(current) = round {
            sets.insert(current, types);
        }

        sets
    }

    /// Read and filter the scorable records from every selected log file
    fn read_records(
        log_paths: &[Utf8PathBuf],
        tournament: &str,
    ) -> Result<Vec<QuizRecord>, EngineError> {
        let wanted = Self::normalize_tournament(tournament);
        let mut records = Vec::new();

        for path in log_paths {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(path)?;

            for row in reader.records() {
                let row = row?;
                let Some(record) = QuizRecord::from_row(&row) else {
                    continue;
                };
                if let Some(ref label) = wanted {
                    if &record.tournament != label {
                        continue;
                    }
                }
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Quote a tournament label the way the record files store it
    ///
    /// Returns `None` for a blank label, which disables the filter.
    fn normalize_tournament(raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }
        let mut label = raw.to_string();
        if !label.starts_with('\'') {
            label.insert(0, '\'');
        }
        if !label.ends_with('\'') {
            label.push('\'');
        }
        Some(label)
    }

    /// Quizzer names grouped by team number, then flattened
    ///
    /// Row order in the output table follows this roster: every quizzer of
    /// team 1 before every quizzer of team 2, first appearance first.
    fn quizzer_roster(records: &[QuizRecord]) -> Vec<String> {
        let mut by_team: Vec<Vec<String>> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for record in records {
            if record.team >= by_team.len() {
                by_team.resize(record.team + 1, Vec::new());
            }
            if seen.insert(record.quizzer.clone()) {
                by_team[record.team].push(record.quizzer.clone());
            }
        }

        by_team.into_iter().flatten().collect()
    }

    /// Score records into per-quizzer, per-type tallies
    ///
    /// Returns the tallies and the rounds that had records but no question
    /// set, in first-seen order. Records for those rounds are skipped.
    fn score(
        records: &[QuizRecord],
        roster: &[String],
        sets: &HashMap<String, Vec<char>>,
    ) -> (Vec<[TypeTally; 8]>, Vec<String>) {
        let mut tallies = vec![[TypeTally::default(); 8]; roster.len()];
        let mut missing: Vec<String> = Vec::new();

        for record in records {
            if !sets.contains_key(&record.round) {
                if !missing.contains(&record.round) {
                    missing.push(record.round.clone());
                }
                continue;
            }

            let Some(quizzer_index) = roster.iter().position(|name| name == &record.quizzer)
            else {
                continue;
            };

            let code = Self::question_type(sets, &record.round, record.question);
            // Unknown codes score as general questions
            let type_index = base_type_index(code).unwrap_or(1);

            let cell = &mut tallies[quizzer_index][type_index];
            match record.event {
                EventKind::TossCorrect => {
                    cell.toss_attempts += 1.0;
                    cell.toss_correct += 1.0;
                }
                EventKind::TossError => {
                    cell.toss_attempts += 1.0;
                }
                EventKind::BonusCorrect => {
                    cell.bonus_attempts += 1.0;
                    cell.bonus_correct += 1.0;
                }
                EventKind::BonusError => {
                    cell.bonus_attempts += 1.0;
                }
            }
        }

        (tallies, missing)
    }

    /// Look up the type of a question within a round
    fn question_type(sets: &HashMap<String, Vec<char>>, round: &str, question: usize) -> char {
        // Question 21 is always a general question regardless of the set
        if question + 1 == 21 {
            return 'G';
        }
        sets.get(round)
            .and_then(|types| types.get(question))
            .copied()
            .unwrap_or('G')
    }

    /// Group records by round, preserving first-seen round order
    fn records_by_round(records: &[QuizRecord]) -> IndexMap<String, Vec<QuizRecord>> {
        let mut by_round: IndexMap<String, Vec<QuizRecord>> = IndexMap::new();
        for record in records {
            by_round
                .entry(record.round.clone())
                .or_default()
                .push(record.clone());
        }
        by_round
    }

    /// Tally for one output column group
    ///
    /// `M` is the Memory Verse totals group: the `Q`, `R`, and `V` tallies
    /// summed.
    fn cell(code: char, row: &[TypeTally; 8]) -> TypeTally {
        if code == 'M' {
            let mut total = TypeTally::default();
            for memory_code in ['Q', 'R', 'V'] {
                if let Some(index) = base_type_index(memory_code) {
                    total.add(&row[index]);
                }
            }
            total
        } else {
            base_type_index(code)
                .map(|index| row[index])
                .unwrap_or_default()
        }
    }

    /// Render one performance table
    ///
    /// Header row then one row per quizzer; four columns per selected type
    /// (toss-up attempts/correct, bonus attempts/correct) formatted with
    /// one decimal place; fields joined by the delimiter.
    fn render_table(
        roster: &[String],
        tallies: &[[TypeTally; 8]],
        selected: &[char],
        delimiter: &str,
    ) -> String {
        let mut table = String::new();

        let mut header = vec!["Quizzer".to_string()];
        for code in selected {
            header.push(format!("{} QA", code));
            header.push(format!("{} QC", code));
            header.push(format!("{} BA", code));
            header.push(format!("{} BC", code));
        }
        table.push_str(&header.join(delimiter));
        table.push('\n');

        for (i, name) in roster.iter().enumerate() {
            let mut fields = vec![name.clone()];
            for code in selected {
                let cell = Self::cell(*code, &tallies[i]);
                fields.push(format!("{:.1}", cell.toss_attempts));
                fields.push(format!("{:.1}", cell.toss_correct));
                fields.push(format!("{:.1}", cell.bonus_attempts));
                fields.push(format!("{:.1}", cell.bonus_correct));
            }
            table.push_str(&fields.join(delimiter));
            table.push('\n');
        }

        table
    }
}

impl ComputeEngine for QperfEngine {
    fn run(&self, request: &RunRequest) -> Result<RunResult, EngineError> {
        for path in &request.question_paths {
            if !path.exists() {
                tracing::error!("Question set path does not exist: {}", path);
                return Err(EngineError::QuestionPathMissing(path.clone()));
            }
        }
        for path in &request.log_paths {
            if !path.is_file() {
                tracing::error!("Record path is not a file: {}", path);
                return Err(EngineError::RecordPathMissing(path.clone()));
            }
        }

        let mut warnings = Vec::new();

        let sets = self.read_question_sets(&request.question_paths, &mut warnings)?;
        tracing::debug!(
            "Parsed {} question sets from {} files",
            sets.len(),
            request.question_paths.len()
        );

        let records = Self::read_records(&request.log_paths, &request.tournament)?;
        if records.is_empty() {
            return Err(EngineError::NoRecords);
        }
        tracing::info!("Scoring {} records", records.len());

        let roster = Self::quizzer_roster(&records);
        let selected = request.selected_type_codes();

        let (tallies, missing) = Self::score(&records, &roster, &sets);
        if !missing.is_empty() {
            warnings
                .push("Warning: Some records were skipped due to missing question sets".to_string());
            warnings.push(format!("Skipped Rounds: {:?}", missing));
            warnings.push(
                "If your question sets are not named correctly, please rename them to match the round numbers in the quiz data file"
                    .to_string(),
            );

            let mut found: Vec<_> = sets.keys().collect();
            found.sort();
            tracing::warn!(
                "Records referenced rounds {:?} but only sets {:?} were parsed",
                missing,
                found
            );
        }

        let mut output = Self::render_table(&roster, &tallies, &selected, &request.delimiter);

        if request.display_individual_rounds {
            for (round, round_records) in Self::records_by_round(&records) {
                if !sets.contains_key(&round) {
                    continue;
                }
                let round_roster = Self::quizzer_roster(&round_records);
                let (round_tallies, _) = Self::score(&round_records, &round_roster, &sets);

                output.push('\n');
                output.push_str(&format!("Round {}\n", round.trim_matches('\'')));
                output.push_str(&Self::render_table(
                    &round_roster,
                    &round_tallies,
                    &selected,
                    &request.delimiter,
                ));
            }
        }

        Ok(RunResult {
            status_message: "Success".to_string(),
            warnings,
            readiness: Readiness::ReadyToSave,
            output,
        })
    }
}

impl Default for QperfEngine {
    fn default() -> Self {
        Self::new()
    }
}
