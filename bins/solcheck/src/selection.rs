// Problem and person selection from the command line
use anyhow::{bail, Context, Result};
use solcheck_common::layout::Layout;

fn parse_number(text: &str, spec: &str) -> Result<u32> {
    text.trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid problem selection '{}': '{}' is not a number", spec, text))
}

/// Expand a problem selector into problem numbers
///
/// Forms: `a` (all), `+N` (after N), `-N` (before N), `A-B` (inclusive), `N`.
pub fn parse_problems(spec: &str, problem_count: u32) -> Result<Vec<u32>> {
    let spec = spec.trim();

    let problems: Vec<u32> = if spec == "a" {
        (1..=problem_count).collect()
    } else if let Some(rest) = spec.strip_prefix('+') {
        let after = parse_number(rest, spec)?;
        (after.saturating_add(1)..=problem_count).collect()
    } else if let Some(rest) = spec.strip_prefix('-') {
        let before = parse_number(rest, spec)?;
        (1..before).collect()
    } else if let Some((start, end)) = spec.split_once('-') {
        let start = parse_number(start, spec)?;
        let end = parse_number(end, spec)?;
        if start > end {
            bail!("Invalid problem selection '{}': range start is after its end", spec);
        }
        (start..=end).collect()
    } else {
        vec![parse_number(spec, spec)?]
    };

    if problems.is_empty() {
        bail!("Problem selection '{}' selects no problems (problem count is {})", spec, problem_count);
    }
    if problems.contains(&0) {
        bail!("Invalid problem selection '{}': problems are numbered from 1", spec);
    }

    Ok(problems)
}

/// Resolve people: a lone `a` means every registered writer, otherwise the names as given
pub fn resolve_people(names: &[String], layout: &Layout<'_>) -> Result<Vec<String>> {
    if names.iter().any(|name| name == "a") {
        if names.len() > 1 {
            bail!("'a' selects every writer and cannot be combined with other names ({})", names.join(", "));
        }
        let writers = layout.writers()?;
        if writers.is_empty() {
            bail!("No writers registered in {}", layout.writers_dir().display());
        }
        return Ok(writers);
    }

    Ok(names.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_problems() {
        assert_eq!(parse_problems("a", 4).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_single_problem() {
        assert_eq!(parse_problems("3", 10).unwrap(), vec![3]);
        assert_eq!(parse_problems(" 7 ", 10).unwrap(), vec![7]);
    }

    #[test]
    fn test_after_and_before() {
        assert_eq!(parse_problems("+2", 5).unwrap(), vec![3, 4, 5]);
        assert_eq!(parse_problems("-3", 5).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_inclusive_range() {
        assert_eq!(parse_problems("2-4", 10).unwrap(), vec![2, 3, 4]);
        assert_eq!(parse_problems("5-5", 10).unwrap(), vec![5]);
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(parse_problems("", 5).is_err());
        assert!(parse_problems("x", 5).is_err());
        assert!(parse_problems("+", 5).is_err());
        assert!(parse_problems("1-b", 5).is_err());
        assert!(parse_problems("4-2", 5).is_err());
        assert!(parse_problems("0", 5).is_err());
    }

    #[test]
    fn test_empty_selection_rejected() {
        assert!(parse_problems("+5", 5).is_err());
        assert!(parse_problems("-1", 5).is_err());
    }

    #[test]
    fn test_people_given_in_order() {
        use solcheck_common::config::{Definitions, HarnessConfig, LanguageCatalog};
        use solcheck_common::template::Variables;

        let config = HarnessConfig {
            definitions: Definitions {
                solution_naming: "p{n}".to_string(),
                input_file_ending: "in".to_string(),
                output_file_ending: "out".to_string(),
                sample_case_extension: "_sample".to_string(),
                corner_case_extension: "_corner".to_string(),
                generated_case_extension: "_generated".to_string(),
                user_output_directory: "output".to_string(),
                writers_directory: "writers".to_string(),
                test_directory: "tests".to_string(),
                finalio_directory: "FinalIO".to_string(),
                html_diff_naming: "{n}.html".to_string(),
                problem_count: 1,
                run_timeout_seconds: None,
            },
            languages: LanguageCatalog { languages: vec![] },
            variables: Variables {
                filename: "{f}".to_string(),
                filename_less_extension: "{fl}".to_string(),
                directory: "{d}".to_string(),
                problem_number: "{n}".to_string(),
                case_type: "{c}".to_string(),
                language: "{l}".to_string(),
            },
        };
        let dir = tempfile::TempDir::new().unwrap();
        let layout = Layout::new(dir.path(), &config);

        let names = vec!["zed".to_string(), "amy".to_string()];
        assert_eq!(resolve_people(&names, &layout).unwrap(), names);

        let mixed = vec!["a".to_string(), "bob".to_string()];
        let err = resolve_people(&mixed, &layout).unwrap_err().to_string();
        assert!(err.contains("cannot be combined"));
        assert!(resolve_people(&["bob".to_string(), "a".to_string()], &layout).is_err());

        std::fs::create_dir_all(layout.writers_dir().join("bob")).unwrap();
        std::fs::create_dir_all(layout.writers_dir().join("alice")).unwrap();
        assert_eq!(
            resolve_people(&["a".to_string()], &layout).unwrap(),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }
}
