use crate::config::HarnessConfig;
use crate::template::{Bindings, Placeholder};
use crate::types::{CaseType, LanguageDefinition};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem layout semantics - only naming, no runtime logic
/// Every artifact path is derived deterministically from the definitions,
/// so the tester, the consistency checker and finalization never drift.
#[derive(Debug, Clone)]
pub struct Layout<'a> {
    root: PathBuf,
    config: &'a HarnessConfig,
}

impl<'a> Layout<'a> {
    pub fn new(root: impl Into<PathBuf>, config: &'a HarnessConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &'a HarnessConfig {
        self.config
    }

    pub fn user_dir(&self, user: &str) -> PathBuf {
        self.root.join(user)
    }

    pub fn user_output_dir(&self, user: &str) -> PathBuf {
        self.user_dir(user).join(&self.config.definitions.user_output_directory)
    }

    pub fn writers_dir(&self) -> PathBuf {
        self.root.join(&self.config.definitions.writers_directory)
    }

    pub fn test_dir(&self) -> PathBuf {
        self.root.join(&self.config.definitions.test_directory)
    }

    pub fn final_dir(&self) -> PathBuf {
        self.root.join(&self.config.definitions.finalio_directory)
    }

    /// Stem shared by a problem's solutions and test files, e.g. `p3`
    pub fn solution_stem(&self, problem: u32) -> String {
        let bindings = Bindings::new().with(Placeholder::ProblemNumber, problem.to_string());
        self.config
            .variables
            .substitute(&self.config.definitions.solution_naming, &bindings)
    }

    /// File name a solution to `problem` in `language` must have
    pub fn solution_file_name(&self, problem: u32, language: &LanguageDefinition) -> String {
        format!("{}.{}", self.solution_stem(problem), language.source_extension())
    }

    fn case_stem(&self, problem: u32, case: CaseType) -> String {
        let defs = &self.config.definitions;
        let suffix = match case {
            CaseType::Sample => &defs.sample_case_extension,
            CaseType::Corner => &defs.corner_case_extension,
            CaseType::Generated => &defs.generated_case_extension,
        };
        format!("{}{}", self.solution_stem(problem), suffix)
    }

    pub fn case_input_file(&self, problem: u32, case: CaseType) -> PathBuf {
        self.test_dir().join(format!(
            "{}.{}",
            self.case_stem(problem, case),
            self.config.definitions.input_file_ending
        ))
    }

    pub fn case_output_file(&self, problem: u32, case: CaseType) -> PathBuf {
        self.test_dir().join(format!(
            "{}.{}",
            self.case_stem(problem, case),
            self.config.definitions.output_file_ending
        ))
    }

    /// Where a user's captured output for a case is saved
    pub fn user_case_output_file(&self, user: &str, problem: u32, case: CaseType) -> PathBuf {
        self.user_output_dir(user).join(format!(
            "{}.{}",
            self.case_stem(problem, case),
            self.config.definitions.output_file_ending
        ))
    }

    /// Expected-output path paired with an input file
    ///
    /// Only a trailing `.<input ending>` is swapped; any other name gets the
    /// output ending appended.
    pub fn expected_output_path(&self, input: &Path) -> PathBuf {
        let defs = &self.config.definitions;
        let input_suffix = format!(".{}", defs.input_file_ending);
        let file_name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let output_name = match file_name.strip_suffix(&input_suffix) {
            Some(stem) => format!("{}.{}", stem, defs.output_file_ending),
            None => format!("{}.{}", file_name, defs.output_file_ending),
        };

        input.with_file_name(output_name)
    }

    /// HTML diff artifact for one mismatching case
    pub fn diff_file(&self, user: &str, problem: u32, case: CaseType, language: &str) -> PathBuf {
        let bindings = Bindings::new()
            .with(Placeholder::CaseType, case.slug())
            .with(Placeholder::Language, language)
            .with(Placeholder::ProblemNumber, problem.to_string());
        let name = self
            .config
            .variables
            .substitute(&self.config.definitions.html_diff_naming, &bindings);
        self.user_output_dir(user).join(name)
    }

    /// A user is registered when they have a directory and a writers entry
    pub fn is_registered(&self, user: &str) -> bool {
        let linked = fs::symlink_metadata(self.writers_dir().join(user))
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        self.user_dir(user).is_dir() && linked
    }

    /// Every registered writer, sorted by name
    pub fn writers(&self) -> Result<Vec<String>> {
        let dir = self.writers_dir();
        let mut names = Vec::new();

        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))? {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Definitions, LanguageCatalog};
    use crate::template::Variables;
    use crate::types::{CommandTemplate, CompileStep};

    fn config() -> HarnessConfig {
        HarnessConfig {
            definitions: Definitions {
                solution_naming: "p{problem_number}".to_string(),
                input_file_ending: "in".to_string(),
                output_file_ending: "out".to_string(),
                sample_case_extension: "_sample".to_string(),
                corner_case_extension: "_corner".to_string(),
                generated_case_extension: "_generated".to_string(),
                user_output_directory: "output".to_string(),
                writers_directory: "writers".to_string(),
                test_directory: "tests".to_string(),
                finalio_directory: "FinalIO".to_string(),
                html_diff_naming: "{case_type}_{language}_p{problem_number}.html".to_string(),
                problem_count: 10,
                run_timeout_seconds: None,
            },
            languages: LanguageCatalog { languages: vec![] },
            variables: Variables {
                filename: "{filename}".to_string(),
                filename_less_extension: "{filename_less_extension}".to_string(),
                directory: "{directory}".to_string(),
                problem_number: "{problem_number}".to_string(),
                case_type: "{case_type}".to_string(),
                language: "{language}".to_string(),
            },
        }
    }

    #[test]
    fn test_case_file_naming() {
        let config = config();
        let layout = Layout::new("/repo", &config);

        assert_eq!(layout.case_input_file(3, CaseType::Sample), PathBuf::from("/repo/tests/p3_sample.in"));
        assert_eq!(layout.case_output_file(3, CaseType::Corner), PathBuf::from("/repo/tests/p3_corner.out"));
        assert_eq!(
            layout.user_case_output_file("alice", 12, CaseType::Generated),
            PathBuf::from("/repo/alice/output/p12_generated.out")
        );
    }

    #[test]
    fn test_solution_file_name_uses_source_extension() {
        let config = config();
        let layout = Layout::new("/repo", &config);
        let java = LanguageDefinition {
            name: "java".to_string(),
            run_extension: "class".to_string(),
            compile: Some(CompileStep {
                extension: "java".to_string(),
                command: CommandTemplate::new("javac", vec![]),
            }),
            run: CommandTemplate::new("java", vec![]),
        };

        assert_eq!(layout.solution_file_name(4, &java), "p4.java");
    }

    #[test]
    fn test_expected_output_swaps_trailing_ending_only() {
        let config = config();
        let layout = Layout::new("/repo", &config);

        assert_eq!(
            layout.expected_output_path(Path::new("/repo/tests/p1_sample.in")),
            PathBuf::from("/repo/tests/p1_sample.out")
        );
        assert_eq!(
            layout.expected_output_path(Path::new("/repo/tests/p1.index_sample.in")),
            PathBuf::from("/repo/tests/p1.index_sample.out")
        );
        assert_eq!(
            layout.expected_output_path(Path::new("/repo/tests/raw")),
            PathBuf::from("/repo/tests/raw.out")
        );
    }

    #[test]
    fn test_diff_file_deterministic() {
        let config = config();
        let layout = Layout::new("/repo", &config);

        let first = layout.diff_file("bob", 2, CaseType::Corner, "python3");
        let second = layout.diff_file("bob", 2, CaseType::Corner, "python3");

        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("/repo/bob/output/corner_python3_p2.html"));
    }

    #[cfg(unix)]
    #[test]
    fn test_registration_requires_dir_and_symlink() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config();
        let layout = Layout::new(dir.path(), &config);

        fs::create_dir_all(layout.writers_dir()).unwrap();
        fs::create_dir_all(layout.user_dir("alice")).unwrap();
        fs::create_dir_all(layout.user_dir("bob")).unwrap();
        std::os::unix::fs::symlink(layout.user_dir("alice"), layout.writers_dir().join("alice")).unwrap();
        std::os::unix::fs::symlink(layout.user_dir("carol"), layout.writers_dir().join("carol")).unwrap();

        assert!(layout.is_registered("alice"));
        assert!(!layout.is_registered("bob"));
        assert!(!layout.is_registered("carol"));
        assert_eq!(layout.writers().unwrap(), vec!["alice", "carol"]);
    }
}
