//! Structure guard for numbered Markdown documents.
//!
//! Checks that numbered section headings form a gap-free sequence, that each
//! section depth sits at a consistent heading level, that principle headings
//! in the guide run 1, 2, 3, ... and that a document ends with the configured
//! closer line.

use crate::core::rules::{RuleCode, Violation};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static NUMBERED_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})[ \t]+(\d+(?:\.\d+)*)\.?[ \t]+\S").expect("static regex")
});
static PRINCIPLE_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{1,6}[ \t]+[*_]*Principle (\d+):").expect("static regex")
});

/// A numbered ATX heading such as `## 2.1 Scope`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub number: Vec<u32>,
    pub line: usize,
}

impl Heading {
    pub fn label(&self) -> String {
        dotted(&self.number)
    }
}

fn dotted(number: &[u32]) -> String {
    number
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Lines outside fenced code blocks, with their 1-based numbers.
fn unfenced_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut fence: Option<&'static str> = None;
    text.lines().enumerate().filter_map(move |(idx, line)| {
        let trimmed = line.trim_start();
        for marker in ["```", "~~~"] {
            if trimmed.starts_with(marker) {
                match fence {
                    None => fence = Some(marker),
                    Some(open) if open == marker => fence = None,
                    Some(_) => {}
                }
                return None;
            }
        }
        if fence.is_some() {
            None
        } else {
            Some((idx + 1, line))
        }
    })
}

pub fn parse_headings(text: &str) -> Vec<Heading> {
    unfenced_lines(text)
        .filter_map(|(lineno, line)| {
            let caps = NUMBERED_HEADING_RE.captures(line)?;
            let number = caps[2]
                .split('.')
                .map(|part| part.parse::<u32>().ok())
                .collect::<Option<Vec<u32>>>()?;
            Some(Heading {
                level: caps[1].len(),
                number,
                line: lineno,
            })
        })
        .collect()
}

/// The section number that should follow `current` at depth `depth`.
fn expected_next(current: &[u32], depth: usize) -> Vec<u32> {
    if depth <= current.len() + 1 {
        let mut next = current[..depth - 1].to_vec();
        next.push(current.get(depth - 1).map_or(1, |n| n.saturating_add(1)));
        next
    } else {
        let mut next = current.to_vec();
        next.push(1);
        next
    }
}

pub fn check_section_order(path: &Path, headings: &[Heading]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut current: Vec<u32> = Vec::new();

    for heading in headings {
        let expected = expected_next(&current, heading.number.len());
        if heading.number != expected {
            violations.push(
                Violation::new(
                    RuleCode::StructureSectionOrder,
                    path,
                    format!(
                        "section {} out of order (expected {})",
                        heading.label(),
                        dotted(&expected)
                    ),
                )
                .at_line(heading.line),
            );
        }
        // Resync so one slip is reported once, not for every later section.
        current = heading.number.clone();
    }

    violations
}

pub fn check_header_levels(path: &Path, headings: &[Heading]) -> Vec<Violation> {
    let Some(base) = headings.first().map(|h| h.level) else {
        return Vec::new();
    };

    headings
        .iter()
        .filter_map(|heading| {
            let expected = base + heading.number.len() - 1;
            (heading.level != expected).then(|| {
                Violation::new(
                    RuleCode::StructureHeaderLevel,
                    path,
                    format!(
                        "section {} is at heading level {}, expected {}",
                        heading.label(),
                        heading.level,
                        expected
                    ),
                )
                .at_line(heading.line)
            })
        })
        .collect()
}

/// Principle headings must count up from 1 without gaps or repeats.
pub fn check_principle_order(path: &Path, text: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut expected: u32 = 1;

    for (lineno, line) in unfenced_lines(text) {
        let Some(caps) = PRINCIPLE_HEADING_RE.captures(line) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<u32>() else {
            continue;
        };
        if number != expected {
            violations.push(
                Violation::new(
                    RuleCode::StructurePrincipleOrder,
                    path,
                    format!("principle {} out of order (expected {})", number, expected),
                )
                .at_line(lineno),
            );
        }
        expected = number.saturating_add(1);
    }

    violations
}

/// The last non-blank line must equal the closer.
pub fn check_closer(path: &Path, text: &str, closer: &str) -> Option<Violation> {
    let closer = closer.trim();
    let last = text.lines().rev().map(str::trim).find(|l| !l.is_empty());
    if last == Some(closer) {
        return None;
    }
    Some(Violation::new(
        RuleCode::StructureCloserMissing,
        path,
        format!("document does not end with closer '{}'", closer),
    ))
}

/// Runs every structure rule over one document.
#[derive(Debug, Clone, Default)]
pub struct StructureGuard {
    pub closer: Option<String>,
}

impl StructureGuard {
    pub fn new(closer: Option<String>) -> Self {
        Self { closer }
    }

    pub fn check_document(&self, path: &Path, text: &str, is_guide: bool) -> Vec<Violation> {
        let headings = parse_headings(text);
        let mut violations = check_section_order(path, &headings);
        violations.extend(check_header_levels(path, &headings));
        if is_guide {
            violations.extend(check_principle_order(path, text));
        }
        if let Some(closer) = &self.closer {
            violations.extend(check_closer(path, text, closer));
        }
        crate::core::rules::sort_violations(&mut violations);
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> &'static Path {
        Path::new("doc.md")
    }

    fn messages(vs: &[Violation]) -> Vec<String> {
        vs.iter().map(|v| v.message.clone()).collect()
    }

    #[test]
    fn parses_numbered_headings_outside_fences() {
        let text = "# 1. Purpose\n```\n# 9. not a heading\n```\n## 1.1 Scope\n### Unnumbered\n#2. no space\n";
        let hs = parse_headings(text);
        assert_eq!(hs.len(), 2);
        assert_eq!(hs[0].number, vec![1]);
        assert_eq!(hs[0].level, 1);
        assert_eq!(hs[1].number, vec![1, 1]);
        assert_eq!(hs[1].line, 5);
    }

    #[test]
    fn sequential_sections_pass() {
        let text = "# 1. A\n# 2. B\n## 2.1 C\n## 2.2 D\n# 3. E\n";
        assert!(StructureGuard::default()
            .check_document(p(), text, false)
            .is_empty());
    }

    #[test]
    fn gap_and_wrong_first_child_are_reported() {
        let hs = parse_headings("# 1. A\n# 3. B\n");
        assert_eq!(
            messages(&check_section_order(p(), &hs)),
            vec!["section 3 out of order (expected 2)"]
        );

        let hs = parse_headings("# 1. A\n## 1.2 B\n");
        assert_eq!(
            messages(&check_section_order(p(), &hs)),
            vec!["section 1.2 out of order (expected 1.1)"]
        );
    }

    #[test]
    fn slip_is_reported_once() {
        let hs = parse_headings("# 1. A\n# 3. B\n# 4. C\n# 5. D\n");
        assert_eq!(check_section_order(p(), &hs).len(), 1);
    }

    #[test]
    fn document_must_start_at_one() {
        let hs = parse_headings("# 2. A\n");
        assert_eq!(
            messages(&check_section_order(p(), &hs)),
            vec!["section 2 out of order (expected 1)"]
        );
    }

    #[test]
    fn header_levels_follow_depth() {
        let hs = parse_headings("## 1. A\n## 1.1 B\n### 1.2 C\n");
        let vs = check_header_levels(p(), &hs);
        assert_eq!(
            messages(&vs),
            vec!["section 1.1 is at heading level 2, expected 3"]
        );
        assert_eq!(vs[0].line, Some(2));
    }

    #[test]
    fn principle_headings_count_up() {
        let text = "## Principle 1: A\n## Principle 2: B\n## Principle 4: D\n## **Principle 4: D again**\n";
        assert_eq!(
            messages(&check_principle_order(p(), text)),
            vec![
                "principle 4 out of order (expected 3)",
                "principle 4 out of order (expected 5)"
            ]
        );
    }

    #[test]
    fn prose_principle_mentions_are_not_headings() {
        let text = "## Principle 1: A\nSee Principle 7: later.\n## Principle 2: B\n";
        assert!(check_principle_order(p(), text).is_empty());
    }

    #[test]
    fn closer_must_be_last_non_blank_line() {
        let closer = "<!-- END OF DOCUMENT -->";
        assert!(check_closer(p(), "# T\n\n<!-- END OF DOCUMENT -->\n\n", closer).is_none());

        let v = check_closer(p(), "# T\n<!-- END OF DOCUMENT -->\nmore\n", closer).unwrap();
        assert_eq!(v.rule, RuleCode::StructureCloserMissing);
        assert_eq!(
            v.message,
            "document does not end with closer '<!-- END OF DOCUMENT -->'"
        );
    }

    #[test]
    fn guard_only_checks_principles_for_the_guide() {
        let text = "## Principle 2: B\n";
        let guard = StructureGuard::default();
        assert!(guard.check_document(p(), text, false).is_empty());
        assert_eq!(guard.check_document(p(), text, true).len(), 1);
    }

    #[test]
    fn numbers_at_u32_max_do_not_overflow() {
        let guard = StructureGuard::default();
        let vs = guard.check_document(p(), "# 4294967295. A\n# 1. B\n", false);
        assert_eq!(
            messages(&vs),
            vec![
                "section 4294967295 out of order (expected 1)",
                "section 1 out of order (expected 4294967295)",
            ]
        );

        let text = "## Principle 4294967295: Big\n## Principle 1: Next\n";
        let vs = guard.check_document(p(), text, true);
        assert_eq!(
            messages(&vs),
            vec![
                "principle 4294967295 out of order (expected 1)",
                "principle 1 out of order (expected 4294967295)",
            ]
        );
    }
}
