mod consistency;
mod diff;
mod engine;
mod evaluator;
mod executor;
mod selection;


use anyhow::{Context, Result};
use clap::Parser;
use consistency::{check_consistency, promote_final_artifacts};
use engine::ProcessEngine;
use executor::{SolutionTester, TestOptions};
use solcheck_common::config::HarnessConfig;
use solcheck_common::layout::Layout;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "solcheck")]
#[command(about = "Verify problem solutions in every supported language and promote agreed test data", long_about = None)]
struct Cli {
    /// Problems to test: a, N, A-B, +N (after N), -N (before N)
    #[arg(allow_negative_numbers = true)]
    problem: String,

    /// People to test, or `a` for every registered writer
    #[arg(required = true)]
    names: Vec<String>,

    /// Write an HTML diff for every mismatching case
    #[arg(long)]
    html_diffs: bool,

    /// Open written HTML diffs in a browser (implies --html-diffs)
    #[arg(long)]
    open_html: bool,

    /// Skip sample cases
    #[arg(long)]
    skip_sample: bool,

    /// Skip corner cases
    #[arg(long)]
    skip_corner: bool,

    /// Do not validate the configuration files
    #[arg(long)]
    skip_validation: bool,

    /// Repository root holding user, writers, test and final directories
    #[arg(long, env = "SOLCHECK_ROOT", default_value = ".")]
    root: PathBuf,

    /// Configuration directory (defaults to <root>/config)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Per-run time limit in seconds, overrides definitions.json
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Skipped,
    Passed,
    Failed,
}

impl Stage {
    fn label(&self) -> &'static str {
        match self {
            Stage::Skipped => "-",
            Stage::Passed => "PASS",
            Stage::Failed => "FAIL",
        }
    }
}

/// Outcome of one problem across every selected person
struct ProblemSummary {
    problem: u32,
    verdicts: Vec<(String, bool)>,
    consistency: Stage,
    finalized: Stage,
}

impl ProblemSummary {
    fn passed(&self) -> bool {
        self.verdicts.iter().all(|(_, passed)| *passed)
            && self.consistency == Stage::Passed
            && self.finalized == Stage::Passed
    }
}

fn print_summary(people: &[String], summaries: &[ProblemSummary]) {
    let width = people.iter().map(String::len).max().unwrap_or(0).max(4);

    println!();
    println!("Summary");
    let mut header = format!("{:<8}", "Problem");
    for person in people {
        header.push_str(&format!(" {:<width$}", person, width = width));
    }
    header.push_str(" Consistent Final");
    println!("{}", header);

    for summary in summaries {
        let mut line = format!("{:<8}", summary.problem);
        for (_, passed) in &summary.verdicts {
            let label = if *passed { "PASS" } else { "FAIL" };
            line.push_str(&format!(" {:<width$}", label, width = width));
        }
        line.push_str(&format!(" {:<10} {}", summary.consistency.label(), summary.finalized.label()));
        println!("{}", line);
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(cwd.join(path))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let root = absolute(&cli.root)?;
    let config_dir = match &cli.config_dir {
        Some(dir) => absolute(dir)?,
        None => root.join("config"),
    };

    let config = HarnessConfig::load(&config_dir, !cli.skip_validation)
        .with_context(|| format!("Failed to load configuration from {}", config_dir.display()))?;
    let layout = Layout::new(&root, &config);

    let problems = selection::parse_problems(&cli.problem, config.definitions.problem_count)?;
    let people = selection::resolve_people(&cli.names, &layout)?;

    let run_timeout = cli
        .timeout
        .or(config.definitions.run_timeout_seconds)
        .map(Duration::from_secs);

    info!(
        root = %root.display(),
        problems = ?problems,
        people = ?people,
        timeout_secs = ?run_timeout.map(|t| t.as_secs()),
        "Starting solution checks"
    );

    let options = TestOptions {
        skip_sample: cli.skip_sample,
        skip_corner: cli.skip_corner,
        html_diffs: cli.html_diffs || cli.open_html,
        open_diffs: cli.open_html,
    };
    let engine = ProcessEngine::new(layout.clone(), run_timeout);
    let tester = SolutionTester::new(layout.clone(), engine, options);

    let mut summaries = Vec::new();

    for &problem in &problems {
        let mut verdicts = Vec::new();

        for person in &people {
            let passed = match tester.test_solution(problem, person).await {
                Ok(verdict) => verdict.passed(),
                Err(e) => {
                    error!(problem, user = %person, error = %format!("{:#}", e), "Testing failed");
                    false
                }
            };
            verdicts.push((person.clone(), passed));
        }

        let mut summary = ProblemSummary {
            problem,
            verdicts,
            consistency: Stage::Skipped,
            finalized: Stage::Skipped,
        };

        if summary.verdicts.iter().all(|(_, passed)| *passed) {
            summary.consistency = if check_consistency(&layout, problem, &people).passed() {
                Stage::Passed
            } else {
                Stage::Failed
            };
        }

        if summary.consistency == Stage::Passed {
            // First selected person stands in for everyone
            summary.finalized = match promote_final_artifacts(&layout, problem, &people[0]) {
                Ok(true) => Stage::Passed,
                Ok(false) => {
                    println!("Problem {} is missing files and was not finalized", problem);
                    Stage::Failed
                }
                Err(e) => {
                    error!(problem, error = %format!("{:#}", e), "Finalization failed");
                    Stage::Failed
                }
            };
        }

        summaries.push(summary);
    }

    print_summary(&people, &summaries);

    if summaries.iter().all(ProblemSummary::passed) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_selector_is_not_a_flag() {
        let cli = Cli::try_parse_from(["solcheck", "-3", "alice"]).unwrap();
        assert_eq!(cli.problem, "-3");
        assert_eq!(cli.names, vec!["alice"]);
    }

    #[test]
    fn test_flags_still_parse_around_selector() {
        let cli = Cli::try_parse_from(["solcheck", "--html-diffs", "-2", "alice", "bob", "--timeout", "5"]).unwrap();
        assert!(cli.html_diffs);
        assert_eq!(cli.problem, "-2");
        assert_eq!(cli.names, vec!["alice", "bob"]);
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["solcheck", "1", "alice", "--timeout", "0"]).is_err());
    }
}
