/// Solution Tester - High-Level Orchestration
///
/// **Responsibility:**
/// For one (problem, user) pair, discover solution files, drive
/// Compile → Run → Compare for each, and produce a single verdict.
///
/// **Architecture:**
/// 1. Layout resolves every path (solcheck_common::layout)
/// 2. ProcessEngine compiles and runs (engine.rs)
/// 3. Evaluator judges each run (evaluator.rs)
/// 4. Mismatches are reported, optionally with an HTML diff (diff.rs)
///
/// A user passes a problem iff at least one solution file was found and
/// every found solution matched on every input.

use crate::diff::{open_in_browser, render_html_diff};
use crate::engine::{CompileOutcome, ProcessEngine};
use crate::evaluator::{evaluate_run, Run, RunResults, RunStatus};
use anyhow::{Context, Result};
use solcheck_common::layout::Layout;
use solcheck_common::types::{CaseInput, CaseType, LanguageDefinition};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Per-invocation switches
#[derive(Debug, Clone, Copy, Default)]
pub struct TestOptions {
    pub skip_sample: bool,
    pub skip_corner: bool,
    pub html_diffs: bool,
    pub open_diffs: bool,
}

/// One failing run, as reported on the console
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub user: String,
    pub problem: u32,
    pub language: String,
    pub case: CaseType,
    pub status: RunStatus,
    pub diff_file: Option<PathBuf>,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}'s problem {} solution in {}",
            self.status.verdict(),
            self.case,
            self.user,
            self.problem,
            self.language
        )
    }
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// Compile step failed; nothing was run
    CompileFailed(CompileOutcome),
    Ran(RunResults),
    /// The harness itself failed while running this attempt
    HarnessError(String),
}

/// One (problem, user, language) solution attempt
#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub language: String,
    pub source_file: PathBuf,
    pub outcome: AttemptOutcome,
}

impl AttemptReport {
    pub fn correct(&self) -> bool {
        matches!(&self.outcome, AttemptOutcome::Ran(results) if results.all_matched())
    }

    pub fn results(&self) -> Option<&RunResults> {
        match &self.outcome {
            AttemptOutcome::Ran(results) => Some(results),
            _ => None,
        }
    }
}

/// Verdict for one (problem, user) pair
#[derive(Debug, Clone)]
pub struct SolutionVerdict {
    pub problem: u32,
    pub user: String,
    pub registered: bool,
    pub attempts: Vec<AttemptReport>,
    pub failures: Vec<FailureReport>,
}

impl SolutionVerdict {
    fn new(problem: u32, user: &str, registered: bool) -> Self {
        Self {
            problem,
            user: user.to_string(),
            registered,
            attempts: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.registered && !self.attempts.is_empty() && self.attempts.iter().all(AttemptReport::correct)
    }
}

pub struct SolutionTester<'a> {
    layout: Layout<'a>,
    engine: ProcessEngine<'a>,
    options: TestOptions,
}

impl<'a> SolutionTester<'a> {
    pub fn new(layout: Layout<'a>, engine: ProcessEngine<'a>, options: TestOptions) -> Self {
        Self {
            layout,
            engine,
            options,
        }
    }

    /// Inputs for a problem: sample, corner, generated, in that order
    pub fn collect_inputs(&self, problem: u32) -> Vec<CaseInput> {
        CaseType::ALL
            .into_iter()
            .filter(|case| match case {
                CaseType::Sample => !self.options.skip_sample,
                CaseType::Corner => !self.options.skip_corner,
                CaseType::Generated => true,
            })
            .map(|case| CaseInput {
                case,
                path: self.layout.case_input_file(problem, case),
            })
            .filter(|input| input.path.is_file())
            .collect()
    }

    /// Solution files in the user's directory, sorted by file name
    fn discover_solutions(&self, problem: u32, user_dir: &Path) -> Result<Vec<(String, &'a LanguageDefinition)>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(user_dir).with_context(|| format!("Failed to list {}", user_dir.display()))? {
            let entry = entry.with_context(|| format!("Failed to list {}", user_dir.display()))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        let languages = &self.layout.config().languages.languages;
        let mut found = Vec::new();
        for name in names {
            for language in languages {
                if name == self.layout.solution_file_name(problem, language) {
                    found.push((name.clone(), language));
                }
            }
        }

        Ok(found)
    }

    #[tracing::instrument(skip(self))]
    pub async fn test_solution(&self, problem: u32, user: &str) -> Result<SolutionVerdict> {
        if !self.layout.is_registered(user) {
            println!("{} is not a valid user", user);
            return Ok(SolutionVerdict::new(problem, user, false));
        }

        let mut verdict = SolutionVerdict::new(problem, user, true);

        let output_dir = self.layout.user_output_dir(user);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

        let user_dir = self.layout.user_dir(user);
        let user_dir = fs::canonicalize(&user_dir)
            .with_context(|| format!("Failed to resolve {}", user_dir.display()))?;

        let inputs = self.collect_inputs(problem);
        let solutions = self.discover_solutions(problem, &user_dir)?;

        info!(inputs = inputs.len(), solutions = solutions.len(), "Testing solutions");

        for (file_name, language) in solutions {
            let concrete = language.substitute(&self.layout.config().variables, &file_name, &user_dir);
            let source_file = user_dir.join(&file_name);

            let compiled = self.engine.compile(&concrete).await;
            if !compiled.is_success() {
                println!(
                    "COMPILE FAILED: {}'s problem {} solution in {}",
                    user, problem, language.name
                );
                verdict.attempts.push(AttemptReport {
                    language: language.name.clone(),
                    source_file,
                    outcome: AttemptOutcome::CompileFailed(compiled),
                });
                continue;
            }

            let results = match self.engine.run(&concrete, &output_dir, &inputs).await {
                Ok(results) => results,
                Err(e) => {
                    error!(language = %language.name, error = %format!("{:#}", e), "Run stage failed");
                    println!("ERROR: {}'s problem {} solution in {}: {:#}", user, problem, language.name, e);
                    verdict.attempts.push(AttemptReport {
                        language: language.name.clone(),
                        source_file,
                        outcome: AttemptOutcome::HarnessError(format!("{:#}", e)),
                    });
                    continue;
                }
            };

            for run in results.runs() {
                let status = evaluate_run(run);
                if status == RunStatus::Matched {
                    continue;
                }

                let diff_file = if status == RunStatus::Mismatch && self.options.html_diffs {
                    self.write_diff(user, problem, &language.name, run).await
                } else {
                    None
                };

                let failure = FailureReport {
                    user: user.to_string(),
                    problem,
                    language: language.name.clone(),
                    case: run.case,
                    status,
                    diff_file,
                };
                println!("{}", failure);
                verdict.failures.push(failure);
            }

            let attempt = AttemptReport {
                language: language.name.clone(),
                source_file,
                outcome: AttemptOutcome::Ran(results),
            };
            info!(language = %attempt.language, correct = attempt.correct(), "Attempt finished");
            verdict.attempts.push(attempt);
        }

        if verdict.attempts.is_empty() {
            println!("{} does not have problem {}!", user, problem);
        }

        Ok(verdict)
    }

    /// Write (and optionally open) the HTML diff for a mismatching run
    async fn write_diff(&self, user: &str, problem: u32, language: &str, run: &Run) -> Option<PathBuf> {
        let path = self.layout.diff_file(user, problem, run.case, language);
        let title = format!("{}'s problem {} {} case in {}", user, problem, run.case.slug(), language);
        let html = render_html_diff(&title, "Your output", &run.actual_output, "Expected output", &run.expected_output);

        if let Err(e) = tokio::fs::write(&path, html).await {
            warn!(path = %path.display(), error = %e, "Failed to write HTML diff");
            return None;
        }

        if self.options.open_diffs {
            if let Err(e) = open_in_browser(&path) {
                warn!(error = %format!("{:#}", e), "Failed to open HTML diff");
            }
        }

        Some(path)
    }
}
