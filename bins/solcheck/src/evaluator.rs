/// Run Evaluator - Result Model and Comparator
///
/// **Core Responsibility:**
/// Hold the per-input-file runs produced by the engine and decide whether
/// each one matched its expected output.
///
/// **Critical Properties:**
/// - Knows nothing about processes or the filesystem layout
/// - Pure function: (captured output, expected output, outcome) → status
///
/// **Comparison Rules:**
/// - Exact string equality after UTF-8 decoding
/// - No whitespace trimming, no line-ending normalization
/// - A run whose process did not complete never matches

use solcheck_common::types::CaseType;
use std::path::PathBuf;

/// How the process behind a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed,
    RuntimeError { exit_code: Option<i32>, stderr: String },
    TimedOut,
    LaunchFailed { message: String },
}

/// Where the expected value of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedSource {
    /// Read from a stored expected-output file
    Stored,
    /// No stored answer; the captured output is its own baseline
    Captured,
}

/// One execution of a solution against one input file
#[derive(Debug, Clone)]
pub struct Run {
    pub case: CaseType,
    pub input_file: PathBuf,
    pub actual_output: String,
    pub expected_output: String,
    pub expected_source: ExpectedSource,
    pub outcome: ExecutionOutcome,
}

/// Ordered, append-only batch of runs for one solution
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    runs: Vec<Run>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_run(&mut self, run: Run) {
        self.runs.push(run);
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// True when every run matched; vacuously true for an empty batch
    pub fn all_matched(&self) -> bool {
        self.runs.iter().all(compare)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Matched,
    Mismatch,
    RuntimeError,
    TimedOut,
    LaunchFailed,
}

impl RunStatus {
    /// Verdict word printed in front of a failing case
    pub fn verdict(&self) -> &'static str {
        match self {
            RunStatus::Matched => "PASSED",
            RunStatus::Mismatch => "FAILED",
            RunStatus::RuntimeError | RunStatus::LaunchFailed => "CRASHED",
            RunStatus::TimedOut => "TIMED OUT",
        }
    }
}

/// Evaluate a single run
///
/// Execution failures take priority over output comparison.
pub fn evaluate_run(run: &Run) -> RunStatus {
    match run.outcome {
        ExecutionOutcome::RuntimeError { .. } => RunStatus::RuntimeError,
        ExecutionOutcome::TimedOut => RunStatus::TimedOut,
        ExecutionOutcome::LaunchFailed { .. } => RunStatus::LaunchFailed,
        ExecutionOutcome::Completed => {
            if run.actual_output == run.expected_output {
                RunStatus::Matched
            } else {
                RunStatus::Mismatch
            }
        }
    }
}

pub fn compare(run: &Run) -> bool {
    evaluate_run(run) == RunStatus::Matched
}
