// Side-by-side HTML line diffs for mismatching runs
use anyhow::{Context, Result};
use similar::{Algorithm, DiffOp, TextDiff};
use std::fmt::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Equal,
    Removed,
    Added,
    Changed,
}

impl RowKind {
    fn class(&self) -> &'static str {
        match self {
            RowKind::Equal => "eq",
            RowKind::Removed => "del",
            RowKind::Added => "add",
            RowKind::Changed => "chg",
        }
    }
}

struct Row<'s> {
    left: Option<(usize, &'s str)>,
    right: Option<(usize, &'s str)>,
    kind: RowKind,
}

/// Pair up old/new lines into table rows
fn diff_rows<'s>(old: &[&'s str], new: &[&'s str]) -> Vec<Row<'s>> {
    let diff = TextDiff::configure().algorithm(Algorithm::Myers).diff_slices(old, new);
    let mut rows = Vec::new();

    for op in diff.ops() {
        match *op {
            DiffOp::Equal { old_index, new_index, len } => {
                for i in 0..len {
                    rows.push(Row {
                        left: Some((old_index + i, old[old_index + i])),
                        right: Some((new_index + i, new[new_index + i])),
                        kind: RowKind::Equal,
                    });
                }
            }
            DiffOp::Delete { old_index, old_len, .. } => {
                for i in old_index..old_index + old_len {
                    rows.push(Row {
                        left: Some((i, old[i])),
                        right: None,
                        kind: RowKind::Removed,
                    });
                }
            }
            DiffOp::Insert { new_index, new_len, .. } => {
                for i in new_index..new_index + new_len {
                    rows.push(Row {
                        left: None,
                        right: Some((i, new[i])),
                        kind: RowKind::Added,
                    });
                }
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                for i in 0..old_len.max(new_len) {
                    let left = (i < old_len).then(|| (old_index + i, old[old_index + i]));
                    let right = (i < new_len).then(|| (new_index + i, new[new_index + i]));
                    let kind = match (left, right) {
                        (Some(_), Some(_)) => RowKind::Changed,
                        (Some(_), None) => RowKind::Removed,
                        _ => RowKind::Added,
                    };
                    rows.push(Row { left, right, kind });
                }
            }
        }
    }

    rows
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn cells(side: Option<(usize, &str)>) -> String {
    match side {
        Some((idx, line)) => format!("<td class=\"num\">{}</td><td>{}</td>", idx + 1, escape_html(line)),
        None => "<td class=\"num\"></td><td></td>".to_string(),
    }
}

/// Standalone HTML page comparing two texts line by line
pub fn render_html_diff(title: &str, left_label: &str, left: &str, right_label: &str, right: &str) -> String {
    let old: Vec<&str> = left.lines().collect();
    let new: Vec<&str> = right.lines().collect();

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n\
         table {{ border-collapse: collapse; font-family: monospace; }}\n\
         td {{ padding: 0 6px; vertical-align: top; white-space: pre; }}\n\
         td.num {{ color: #888; text-align: right; }}\n\
         tr.del td {{ background: #fdd; }}\n\
         tr.add td {{ background: #dfd; }}\n\
         tr.chg td {{ background: #ffc; }}\n\
         </style>\n</head>\n<body>\n<h3>{title}</h3>\n<p>Generated {generated}</p>\n<table>\n\
         <tr><th></th><th>{left_label}</th><th></th><th>{right_label}</th></tr>\n",
        title = escape_html(title),
        generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        left_label = escape_html(left_label),
        right_label = escape_html(right_label),
    );

    for row in diff_rows(&old, &new) {
        let _ = writeln!(
            html,
            "<tr class=\"{}\">{}{}</tr>",
            row.kind.class(),
            cells(row.left),
            cells(row.right)
        );
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Open a file with the platform's default viewer, without waiting
pub fn open_in_browser(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    command
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to open {} in a browser", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_only_equal_rows() {
        let rows = diff_rows(&["a", "b"], &["a", "b"]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.kind == RowKind::Equal));
    }

    #[test]
    fn test_changed_line_is_paired() {
        let rows = diff_rows(&["1", "5", "3"], &["1", "6", "3"]);

        assert_eq!(rows.iter().filter(|r| r.kind == RowKind::Equal).count(), 2);
        assert!(rows.iter().any(|r| r.kind != RowKind::Equal && r.left == Some((1, "5"))));
        assert!(rows.iter().any(|r| r.kind != RowKind::Equal && r.right == Some((1, "6"))));
    }

    #[test]
    fn test_extra_lines_are_one_sided() {
        let rows = diff_rows(&["a"], &["a", "b", "c"]);

        assert_eq!(rows.iter().filter(|r| r.kind == RowKind::Added).count(), 2);
        assert!(rows.iter().filter(|r| r.kind == RowKind::Added).all(|r| r.left.is_none()));
    }

    #[test]
    fn test_render_escapes_content() {
        let html = render_html_diff("p1 <sample>", "yours", "<b>5</b>\n", "expected", "6\n");

        assert!(html.contains("&lt;b&gt;5&lt;/b&gt;"));
        assert!(html.contains("p1 &lt;sample&gt;"));
        assert!(!html.contains("class=\"eq\""));
        assert!(!html.contains("<b>5</b>"));
    }
}
