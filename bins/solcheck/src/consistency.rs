// Cross-user consistency of generated outputs, and promotion to the final directory
use anyhow::{Context, Result};
use solcheck_common::layout::Layout;
use solcheck_common::types::CaseType;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub problem: u32,
    /// First disagreeing pair, (previous user, user)
    pub mismatch: Option<(String, String)>,
}

impl ConsistencyReport {
    pub fn passed(&self) -> bool {
        self.mismatch.is_none()
    }
}

/// Saved generated output of one user; missing or unreadable reads as empty
fn generated_output(layout: &Layout<'_>, user: &str, problem: u32) -> String {
    let path = layout.user_case_output_file(user, problem, CaseType::Generated);
    match fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No generated output, treating as empty");
            String::new()
        }
    }
}

/// Every user must have produced byte-identical output on the generated case
#[tracing::instrument(skip(layout, users), fields(users = users.len()))]
pub fn check_consistency(layout: &Layout<'_>, problem: u32, users: &[String]) -> ConsistencyReport {
    let mut previous: Option<(&str, String)> = None;

    for user in users {
        let output = generated_output(layout, user, problem);

        if let Some((prev_user, prev_output)) = &previous {
            if *prev_output != output {
                println!(
                    "FAILED GENERATED: {}'s problem {} doesn't match {}'s",
                    prev_user, problem, user
                );
                return ConsistencyReport {
                    problem,
                    mismatch: Some((prev_user.to_string(), user.clone())),
                };
            }
        }

        previous = Some((user.as_str(), output));
    }

    info!("Generated outputs consistent");
    ConsistencyReport { problem, mismatch: None }
}

/// The six canonical files of a problem
fn final_artifacts(layout: &Layout<'_>, problem: u32, representative: &str) -> Vec<PathBuf> {
    vec![
        layout.case_input_file(problem, CaseType::Sample),
        layout.case_output_file(problem, CaseType::Sample),
        layout.case_input_file(problem, CaseType::Corner),
        layout.case_output_file(problem, CaseType::Corner),
        layout.case_input_file(problem, CaseType::Generated),
        layout.user_case_output_file(representative, problem, CaseType::Generated),
    ]
}

/// Copy the canonical files into the final directory
///
/// Returns `Ok(false)` without copying anything when any of them is missing.
#[tracing::instrument(skip(layout))]
pub fn promote_final_artifacts(layout: &Layout<'_>, problem: u32, representative: &str) -> Result<bool> {
    let sources = final_artifacts(layout, problem, representative);

    let missing: Vec<String> = sources
        .iter()
        .filter(|path| !path.is_file())
        .map(|path| path.display().to_string())
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "Not finalizing, files missing");
        return Ok(false);
    }

    let final_dir = layout.final_dir();
    fs::create_dir_all(&final_dir)
        .with_context(|| format!("Failed to create final directory {}", final_dir.display()))?;

    for source in &sources {
        let name = source
            .file_name()
            .with_context(|| format!("No file name in {}", source.display()))?;
        let target = final_dir.join(name);
        fs::copy(source, &target)
            .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
    }

    info!(files = sources.len(), final_dir = %final_dir.display(), "Finalized problem");
    Ok(true)
}
