/// Execution Engine - Compile and Run Stages
///
/// **Core Responsibility:**
/// Invoke a concrete language definition's commands as child processes and
/// capture raw outputs.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to execute (argv, stdin redirection, capture)
/// - Engine does NOT evaluate correctness
/// - Engine returns runs for the Evaluator to judge
///
/// **Failure Policy:**
/// - A nonzero compile exit is an outcome, not an error
/// - A run that exits nonzero, cannot be spawned, or exceeds the timeout is
///   recorded with the output captured from that process only (empty if
///   nothing was captured); no value from an earlier input is reused
/// - Harness I/O failures (unreadable input, unwritable output dir) are errors

use crate::evaluator::{ExecutionOutcome, ExpectedSource, Run, RunResults};
use anyhow::{Context, Result};
use solcheck_common::layout::Layout;
use solcheck_common::types::{CaseInput, CommandTemplate, LanguageDefinition};
use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Result of the compile stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Interpreted language, nothing was spawned
    NotRequired,
    Succeeded,
    Failed { exit_code: Option<i32> },
    LaunchFailed { message: String },
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::NotRequired | CompileOutcome::Succeeded)
    }
}

/// Raw capture of one child process
struct Captured {
    stdout: String,
    outcome: ExecutionOutcome,
    execution_time_ms: u64,
}

/// Local process execution engine
///
/// Runs are strictly sequential. `run_timeout` bounds each run; without it
/// a hanging solution blocks the harness.
pub struct ProcessEngine<'a> {
    layout: Layout<'a>,
    run_timeout: Option<Duration>,
}

impl<'a> ProcessEngine<'a> {
    pub fn new(layout: Layout<'a>, run_timeout: Option<Duration>) -> Self {
        Self { layout, run_timeout }
    }

    /// Compile a solution if its language needs it
    #[tracing::instrument(skip(self, language), fields(language = %language.name))]
    pub async fn compile(&self, language: &LanguageDefinition) -> CompileOutcome {
        let Some(step) = &language.compile else {
            debug!("No compile step");
            return CompileOutcome::NotRequired;
        };

        debug!(command = %step.command.display_line(), "Compiling");
        let start = Instant::now();

        // Compiler diagnostics go straight to the console
        let status = Command::new(&step.command.program)
            .args(&step.command.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await;

        let compilation_time_ms = start.elapsed().as_millis() as u64;

        match status {
            Ok(status) if status.success() => {
                info!(compilation_time_ms, "Compilation succeeded");
                CompileOutcome::Succeeded
            }
            Ok(status) => {
                warn!(compilation_time_ms, exit_code = ?status.code(), "Compilation failed");
                CompileOutcome::Failed {
                    exit_code: status.code(),
                }
            }
            Err(e) => {
                warn!(program = %step.command.program, error = %e, "Failed to launch compiler");
                CompileOutcome::LaunchFailed {
                    message: format!("Failed to launch {}: {}", step.command.program, e),
                }
            }
        }
    }

    /// Run a compiled/interpreted solution once per input file
    ///
    /// Captured output is saved to `output_dir` under the expected-output
    /// file name. When no expected-output file exists next to the input,
    /// the captured output becomes the expected value.
    #[tracing::instrument(skip(self, language, inputs), fields(language = %language.name, inputs = inputs.len()))]
    pub async fn run(
        &self,
        language: &LanguageDefinition,
        output_dir: &Path,
        inputs: &[CaseInput],
    ) -> Result<RunResults> {
        let mut results = RunResults::new();

        for input in inputs {
            let expected_path = self.layout.expected_output_path(&input.path);
            let save_name = expected_path
                .file_name()
                .with_context(|| format!("No file name in {}", expected_path.display()))?;
            let save_path = output_dir.join(save_name);

            let stdin = tokio::fs::File::open(&input.path)
                .await
                .with_context(|| format!("Failed to open input file {}", input.path.display()))?
                .into_std()
                .await;

            debug!(case = %input.case, command = %language.run.display_line(), "Running");
            let captured = self.execute(&language.run, stdin).await;

            tokio::fs::write(&save_path, &captured.stdout)
                .await
                .with_context(|| format!("Failed to save output to {}", save_path.display()))?;

            let stored = tokio::fs::metadata(&expected_path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);

            let (expected_output, expected_source) = if stored {
                let bytes = tokio::fs::read(&expected_path)
                    .await
                    .with_context(|| format!("Failed to read {}", expected_path.display()))?;
                (String::from_utf8_lossy(&bytes).into_owned(), ExpectedSource::Stored)
            } else {
                (captured.stdout.clone(), ExpectedSource::Captured)
            };

            match &captured.outcome {
                ExecutionOutcome::Completed => {
                    debug!(case = %input.case, execution_ms = captured.execution_time_ms, "Run completed");
                }
                ExecutionOutcome::RuntimeError { exit_code, stderr } => {
                    warn!(
                        case = %input.case,
                        exit_code = ?exit_code,
                        stderr = stderr.lines().next().unwrap_or(""),
                        "Run exited with an error"
                    );
                }
                ExecutionOutcome::TimedOut => {
                    warn!(case = %input.case, execution_ms = captured.execution_time_ms, "Run timed out");
                }
                ExecutionOutcome::LaunchFailed { message } => {
                    warn!(case = %input.case, error = %message, "Run could not be launched");
                }
            }

            results.add_run(Run {
                case: input.case,
                input_file: input.path.clone(),
                actual_output: captured.stdout,
                expected_output,
                expected_source,
                outcome: captured.outcome,
            });
        }

        Ok(results)
    }

    async fn execute(&self, command: &CommandTemplate, stdin: File) -> Captured {
        let start = Instant::now();

        let spawned = Command::new(&command.program)
            .args(&command.arguments)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return Captured {
                    stdout: String::new(),
                    outcome: ExecutionOutcome::LaunchFailed {
                        message: format!("Failed to launch {}: {}", command.program, e),
                    },
                    execution_time_ms: 0,
                }
            }
        };

        let wait = child.wait_with_output();
        let waited = match self.run_timeout {
            // Dropping the future drops the child, which kills it
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => {
                    return Captured {
                        stdout: String::new(),
                        outcome: ExecutionOutcome::TimedOut,
                        execution_time_ms: start.elapsed().as_millis() as u64,
                    }
                }
            },
            None => wait.await,
        };

        let execution_time_ms = start.elapsed().as_millis() as u64;

        let output = match waited {
            Ok(output) => output,
            Err(e) => {
                return Captured {
                    stdout: String::new(),
                    outcome: ExecutionOutcome::LaunchFailed {
                        message: format!("Failed to wait for {}: {}", command.program, e),
                    },
                    execution_time_ms,
                }
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let outcome = if output.status.success() {
            ExecutionOutcome::Completed
        } else {
            ExecutionOutcome::RuntimeError {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        };

        Captured {
            stdout,
            outcome,
            execution_time_ms,
        }
    }
}
