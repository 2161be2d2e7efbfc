/// Placeholder Templates - Variable Substitution Engine
///
/// **Model:**
/// A template is a plain string containing zero or more placeholder markers.
/// The set of placeholders is closed (`Placeholder`); the marker text used for
/// each one is configured in variables.json (`Variables`).
///
/// **Substitution Rules:**
/// - Single left-to-right scan, substituted text is never rescanned
/// - At each position the longest matching bound marker wins, so a marker that
///   is a prefix of another (`$FILE` vs `$FILE_NOEXT`) cannot corrupt it
/// - Markers of unbound placeholders and unknown text are left untouched
/// - Pure: same inputs, same output, no side effects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Placeholder {
    /// Solution file name with extension
    Filename,
    FilenameLessExtension,
    /// Absolute directory containing the solution
    Directory,
    ProblemNumber,
    CaseType,
    Language,
}

impl Placeholder {
    pub const ALL: [Placeholder; 6] = [
        Placeholder::Filename,
        Placeholder::FilenameLessExtension,
        Placeholder::Directory,
        Placeholder::ProblemNumber,
        Placeholder::CaseType,
        Placeholder::Language,
    ];

    /// Key of this placeholder in variables.json
    pub fn key(&self) -> &'static str {
        match self {
            Placeholder::Filename => "filename",
            Placeholder::FilenameLessExtension => "filename_less_extension",
            Placeholder::Directory => "directory",
            Placeholder::ProblemNumber => "problem_number",
            Placeholder::CaseType => "case_type",
            Placeholder::Language => "language",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Marker text for every placeholder, as configured in variables.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variables {
    pub filename: String,
    pub filename_less_extension: String,
    pub directory: String,
    pub problem_number: String,
    pub case_type: String,
    pub language: String,
}

impl Variables {
    pub fn marker(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Filename => &self.filename,
            Placeholder::FilenameLessExtension => &self.filename_less_extension,
            Placeholder::Directory => &self.directory,
            Placeholder::ProblemNumber => &self.problem_number,
            Placeholder::CaseType => &self.case_type,
            Placeholder::Language => &self.language,
        }
    }

    /// Replace every bound marker in `template` with its value
    pub fn substitute(&self, template: &str, bindings: &Bindings) -> String {
        let mut markers: Vec<(&str, &str)> = bindings
            .iter()
            .map(|(placeholder, value)| (self.marker(placeholder), value))
            .filter(|(marker, _)| !marker.is_empty())
            .collect();
        // Longest marker first
        markers.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while !rest.is_empty() {
            let replaced = markers
                .iter()
                .find_map(|(marker, value)| rest.strip_prefix(marker).map(|tail| (*value, tail)));

            if let Some((value, tail)) = replaced {
                out.push_str(value);
                rest = tail;
                continue;
            }

            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                out.push(ch);
            }
            rest = chars.as_str();
        }

        out
    }
}

/// Concrete values for a subset of placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: BTreeMap<Placeholder, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.values.insert(placeholder, value.into());
        self
    }

    /// Bindings used by compile/run templates for one solution file
    pub fn for_solution(file_name: &str, directory: &Path) -> Self {
        let less_extension = Path::new(file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        Self::new()
            .with(Placeholder::Filename, file_name)
            .with(Placeholder::FilenameLessExtension, less_extension)
            .with(Placeholder::Directory, directory.to_string_lossy())
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Placeholder, &str)> {
        self.values.iter().map(|(p, v)| (*p, v.as_str()))
    }
}
