use crate::template::{Bindings, Variables};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Executable plus ordered argument list, each possibly templated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub program: String,
    pub arguments: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            program: program.into(),
            arguments,
        }
    }

    fn substitute(&self, variables: &Variables, bindings: &Bindings) -> Self {
        Self {
            program: variables.substitute(&self.program, bindings),
            arguments: self
                .arguments
                .iter()
                .map(|arg| variables.substitute(arg, bindings))
                .collect(),
        }
    }

    /// Human-readable command line, for logs only
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Compile step of a compiled language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileStep {
    /// Extension of the solution source file
    pub extension: String,
    pub command: CommandTemplate,
}

/// Build/run recipe for one language
///
/// `compile` is `None` for interpreted languages. Decoded from the flat
/// camelCase catalog entry in languages.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LanguageEntry", into = "LanguageEntry")]
pub struct LanguageDefinition {
    pub name: String,
    pub run_extension: String,
    pub compile: Option<CompileStep>,
    pub run: CommandTemplate,
}

impl LanguageDefinition {
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Extension a solution file in this language carries
    pub fn source_extension(&self) -> &str {
        match &self.compile {
            Some(step) => &step.extension,
            None => &self.run_extension,
        }
    }

    /// Concrete definition for one solution file
    ///
    /// Every string field and every argument is rewritten; the receiver is
    /// left untouched.
    pub fn substitute(&self, variables: &Variables, file_name: &str, directory: &Path) -> Self {
        let bindings = Bindings::for_solution(file_name, directory);

        Self {
            name: variables.substitute(&self.name, &bindings),
            run_extension: variables.substitute(&self.run_extension, &bindings),
            compile: self.compile.as_ref().map(|step| CompileStep {
                extension: variables.substitute(&step.extension, &bindings),
                command: step.command.substitute(variables, &bindings),
            }),
            run: self.run.substitute(variables, &bindings),
        }
    }
}

/// On-disk shape of a languages.json entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageEntry {
    #[serde(alias = "name")]
    language: String,
    run_extension: String,
    run_command: String,
    #[serde(default)]
    run_arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compile_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compile_command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    compile_arguments: Vec<String>,
}

impl TryFrom<LanguageEntry> for LanguageDefinition {
    type Error = String;

    fn try_from(entry: LanguageEntry) -> Result<Self, Self::Error> {
        let compile = match (entry.compile_extension, entry.compile_command) {
            (Some(extension), Some(program)) => Some(CompileStep {
                extension,
                command: CommandTemplate::new(program, entry.compile_arguments),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(format!(
                    "language '{}' has compileExtension but no compileCommand",
                    entry.language
                ))
            }
            (None, Some(_)) => {
                return Err(format!(
                    "language '{}' has compileCommand but no compileExtension",
                    entry.language
                ))
            }
        };

        Ok(Self {
            name: entry.language,
            run_extension: entry.run_extension,
            compile,
            run: CommandTemplate::new(entry.run_command, entry.run_arguments),
        })
    }
}

impl From<LanguageDefinition> for LanguageEntry {
    fn from(def: LanguageDefinition) -> Self {
        let (compile_extension, compile_command, compile_arguments) = match def.compile {
            Some(step) => (Some(step.extension), Some(step.command.program), step.command.arguments),
            None => (None, None, Vec::new()),
        };

        Self {
            language: def.name,
            run_extension: def.run_extension,
            run_command: def.run.program,
            run_arguments: def.run.arguments,
            compile_extension,
            compile_command,
            compile_arguments,
        }
    }
}

/// Category of a test input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseType {
    Sample,
    Corner,
    /// Procedurally produced input with no stored answer
    Generated,
}

impl CaseType {
    pub const ALL: [CaseType; 3] = [CaseType::Sample, CaseType::Corner, CaseType::Generated];

    /// Upper-case label used in verdict lines
    pub fn label(&self) -> &'static str {
        match self {
            CaseType::Sample => "SAMPLE",
            CaseType::Corner => "CORNER",
            CaseType::Generated => "GENERATED",
        }
    }

    /// Lower-case form used in artifact names
    pub fn slug(&self) -> &'static str {
        match self {
            CaseType::Sample => "sample",
            CaseType::Corner => "corner",
            CaseType::Generated => "generated",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One input file handed to the run stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseInput {
    pub case: CaseType,
    pub path: PathBuf,
}
