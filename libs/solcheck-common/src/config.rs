// Harness configuration: definitions.json, languages.json, variables.json
use crate::template::{Placeholder, Variables};
use crate::types::LanguageDefinition;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const DEFINITIONS_FILE: &str = "definitions.json";
pub const LANGUAGES_FILE: &str = "languages.json";
pub const VARIABLES_FILE: &str = "variables.json";

/// Naming and layout conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definitions {
    /// Solution stem template, contains the problem-number marker
    pub solution_naming: String,
    pub input_file_ending: String,
    pub output_file_ending: String,
    pub sample_case_extension: String,
    pub corner_case_extension: String,
    pub generated_case_extension: String,
    pub user_output_directory: String,
    pub writers_directory: String,
    pub test_directory: String,
    pub finalio_directory: String,
    pub html_diff_naming: String,
    pub problem_count: u32,
    /// Wall-clock bound for a single run, unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCatalog {
    pub languages: Vec<LanguageDefinition>,
}

impl LanguageCatalog {
    pub fn find(&self, name: &str) -> Option<&LanguageDefinition> {
        self.languages.iter().find(|l| l.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.name.as_str()).collect()
    }
}

/// Immutable configuration threaded through the harness
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub definitions: Definitions,
    pub languages: LanguageCatalog,
    pub variables: Variables,
}

impl HarnessConfig {
    /// Load all three files from `config_dir`, validating unless told not to
    pub fn load(config_dir: &Path, validate: bool) -> Result<Self> {
        let definitions: Definitions = read_json(&config_dir.join(DEFINITIONS_FILE))?;
        let languages: LanguageCatalog = read_json(&config_dir.join(LANGUAGES_FILE))?;
        let variables: Variables = read_json(&config_dir.join(VARIABLES_FILE))?;

        let config = Self {
            definitions,
            languages,
            variables,
        };

        if validate {
            config.validate()?;
        } else {
            debug!("Configuration validation skipped");
        }

        info!(
            languages = ?config.languages.names(),
            problem_count = config.definitions.problem_count,
            "Loaded configuration from {}",
            config_dir.display()
        );

        Ok(config)
    }

    /// Check all three files, reporting every problem at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        problems.extend(validate_variables(&self.variables).into_iter().map(|p| format!("{}: {}", VARIABLES_FILE, p)));
        problems.extend(
            validate_definitions(&self.definitions, &self.variables)
                .into_iter()
                .map(|p| format!("{}: {}", DEFINITIONS_FILE, p)),
        );
        problems.extend(validate_languages(&self.languages).into_iter().map(|p| format!("{}: {}", LANGUAGES_FILE, p)));

        if !problems.is_empty() {
            bail!("Invalid configuration:\n  - {}", problems.join("\n  - "));
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        bail!("Configuration file not found: {}", path.display());
    }

    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn validate_variables(variables: &Variables) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for placeholder in Placeholder::ALL {
        let marker = variables.marker(placeholder);
        if marker.is_empty() {
            problems.push(format!("'{}' marker is empty", placeholder));
        } else if !seen.insert(marker) {
            problems.push(format!("'{}' marker '{}' is used by another variable", placeholder, marker));
        }
    }

    problems
}

pub fn validate_definitions(definitions: &Definitions, variables: &Variables) -> Vec<String> {
    let mut problems = Vec::new();

    let required = [
        ("solution_naming", &definitions.solution_naming),
        ("input_file_ending", &definitions.input_file_ending),
        ("output_file_ending", &definitions.output_file_ending),
        ("user_output_directory", &definitions.user_output_directory),
        ("writers_directory", &definitions.writers_directory),
        ("test_directory", &definitions.test_directory),
        ("finalio_directory", &definitions.finalio_directory),
        ("html_diff_naming", &definitions.html_diff_naming),
    ];
    for (key, value) in required {
        if value.is_empty() {
            problems.push(format!("'{}' must not be empty", key));
        }
    }

    let marker = variables.marker(Placeholder::ProblemNumber);
    if !marker.is_empty() && !definitions.solution_naming.contains(marker) {
        problems.push(format!(
            "'solution_naming' ({}) does not contain the problem number marker '{}'",
            definitions.solution_naming, marker
        ));
    }

    if definitions.input_file_ending == definitions.output_file_ending {
        problems.push("'input_file_ending' and 'output_file_ending' must differ".to_string());
    }

    let suffixes = [
        &definitions.sample_case_extension,
        &definitions.corner_case_extension,
        &definitions.generated_case_extension,
    ];
    let distinct: HashSet<_> = suffixes.iter().collect();
    if distinct.len() != suffixes.len() {
        problems.push("sample/corner/generated case extensions must be distinct".to_string());
    }

    if definitions.problem_count == 0 {
        problems.push("'problem_count' must be at least 1".to_string());
    }

    if definitions.run_timeout_seconds == Some(0) {
        problems.push("'run_timeout_seconds' must be positive when present".to_string());
    }

    problems
}

pub fn validate_languages(catalog: &LanguageCatalog) -> Vec<String> {
    let mut problems = Vec::new();

    if catalog.languages.is_empty() {
        problems.push("no languages configured".to_string());
    }

    let mut names = HashSet::new();
    let mut extensions = HashSet::new();

    for (idx, lang) in catalog.languages.iter().enumerate() {
        let label = if lang.name.is_empty() {
            format!("language #{}", idx + 1)
        } else {
            format!("language '{}'", lang.name)
        };

        if lang.name.is_empty() {
            problems.push(format!("{} has an empty name", label));
        } else if !names.insert(lang.name.as_str()) {
            problems.push(format!("{} is defined more than once", label));
        }

        if lang.run.program.is_empty() {
            problems.push(format!("{} has an empty runCommand", label));
        }

        match &lang.compile {
            Some(step) => {
                if step.extension.is_empty() {
                    problems.push(format!("{} has an empty compileExtension", label));
                }
                if step.command.program.is_empty() {
                    problems.push(format!("{} has an empty compileCommand", label));
                }
            }
            None => {
                if lang.run_extension.is_empty() {
                    problems.push(format!("{} has an empty runExtension", label));
                }
            }
        }

        let source_extension = lang.source_extension();
        if !source_extension.is_empty() && !extensions.insert(source_extension) {
            problems.push(format!(
                "{} reuses source extension '{}' of another language",
                label, source_extension
            ));
        }
    }

    problems
}
