// src/report.rs
// =============================================================================
// Turns scan results into something a person (or a CI log) can read.
//
// Example output:
//
//   Link Check Report
//   =================
//   Total Links: 12
//   Valid Links: 11
//   Invalid Links: 1
//   Links by Kind: internal 7, external 3, anchor 1, mailto 1, package 0
//
//   Invalid Links:
//   ❌ ./docs/missing.md
//      Location: README.md:3
//      Error: File not found: ./docs/missing.md
//
// Everything here is a pure function of its input: no I/O, and the same
// input (in the same order) always gives the same text.
// =============================================================================

use std::fmt::{self, Write};

use crate::checker::LinkKind;
use crate::link::{LinkInfo, LinkSummary};

// Renders the text report for a scan
pub fn format_report(results: &[LinkInfo]) -> String {
    let mut out = String::new();
    // Writing into a String never fails; the fmt::Result only exists so
    // write_report can use `?`
    if write_report(&mut out, results).is_err() {
        log::error!("Failed to format the report");
    }
    out
}

fn write_report(out: &mut impl Write, results: &[LinkInfo]) -> fmt::Result {
    let valid = results.iter().filter(|r| r.is_valid()).count();
    let invalid: Vec<&LinkInfo> = results.iter().filter(|r| r.is_invalid()).collect();
    let unchecked = results.len() - valid - invalid.len();

    writeln!(out, "Link Check Report")?;
    writeln!(out, "=================")?;
    writeln!(out, "Total Links: {}", results.len())?;
    writeln!(out, "Valid Links: {}", valid)?;
    writeln!(out, "Invalid Links: {}", invalid.len())?;
    if unchecked > 0 {
        writeln!(out, "Unchecked Links: {}", unchecked)?;
    }
    writeln!(out, "Links by Kind: {}", kind_counts(results))?;
    writeln!(out)?;

    if invalid.is_empty() {
        return writeln!(out, "✅ All links are valid!");
    }

    writeln!(out, "Invalid Links:")?;
    for info in invalid {
        writeln!(out, "❌ {}", info.link.url)?;
        writeln!(out, "   Location: {}", info.link.location)?;
        if let Some(error) = info.error() {
            writeln!(out, "   Error: {}", error)?;
        }
    }

    Ok(())
}

fn kind_counts(results: &[LinkInfo]) -> String {
    const ORDER: [(LinkKind, &str); 5] = [
        (LinkKind::Internal, "internal"),
        (LinkKind::External, "external"),
        (LinkKind::Anchor, "anchor"),
        (LinkKind::Mailto, "mailto"),
        (LinkKind::Package, "package"),
    ];

    ORDER
        .iter()
        .map(|(kind, name)| {
            let count = results
                .iter()
                .filter(|r| LinkKind::of(&r.link) == *kind)
                .count();
            format!("{} {}", name, count)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// Splits results into valid and invalid, keeping their order
//
// Links without a validation result count as valid: nothing proved them
// broken.
pub fn summarize(results: Vec<LinkInfo>) -> LinkSummary {
    let (invalid, valid) = results.into_iter().partition(|r| r.is_invalid());
    LinkSummary { valid, invalid }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{LinkOccurrence, LinkSource, Location, ValidationResult};

    fn info(url: &str, file: &str, line: usize, result: Option<ValidationResult>) -> LinkInfo {
        LinkInfo {
            link: LinkOccurrence::new(url, Location::new(file, line, 1), LinkSource::MarkdownLink),
            validation_result: result,
        }
    }

    #[test]
    fn test_report_counts_and_invalid_section() {
        let results = vec![
            info("https://example.com", "README.md", 1, Some(ValidationResult::valid())),
            info(
                "./docs/missing.md",
                "docs/index.md",
                7,
                Some(ValidationResult::invalid("File not found: ./docs/missing.md")),
            ),
        ];
        let report = format_report(&results);

        assert!(report.contains("Total Links: 2"));
        assert!(report.contains("Valid Links: 1"));
        assert!(report.contains("Invalid Links: 1"));
        assert!(report.contains("./docs/missing.md"));
        assert!(report.contains("docs/index.md:7"));
        assert!(report.contains("Error: File not found: ./docs/missing.md"));
        assert!(report.contains("Links by Kind: internal 1, external 1, anchor 0, mailto 0, package 0"));
        assert!(!report.contains("All links are valid"));
    }

    #[test]
    fn test_report_omits_missing_error_line() {
        let results = vec![info(
            "https://gone.dev",
            "a.md",
            2,
            Some(ValidationResult {
                is_valid: false,
                error: None,
                status_code: None,
                cached: false,
                checked_at: None,
            }),
        )];
        let report = format_report(&results);

        assert!(report.contains("Location: a.md:2"));
        assert!(!report.contains("Error:"));
    }

    #[test]
    fn test_report_all_valid() {
        let results = vec![info("#intro", "README.md", 1, Some(ValidationResult::valid()))];
        let report = format_report(&results);

        assert!(report.contains("✅ All links are valid!"));
        assert!(!report.contains("Invalid Links:\n"));
        assert!(!report.contains("Unchecked"));
    }

    #[test]
    fn test_report_empty_and_unchecked() {
        let report = format_report(&[]);
        assert!(report.contains("Total Links: 0"));
        assert!(report.contains("All links are valid!"));

        let report = format_report(&[info("./a.md", "b.md", 1, None)]);
        assert!(report.contains("Total Links: 1"));
        assert!(report.contains("Unchecked Links: 1"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let results = vec![
            info("./x.md", "a.md", 1, Some(ValidationResult::invalid("File not found: ./x.md"))),
            info("./y.md", "a.md", 2, Some(ValidationResult::invalid("File not found: ./y.md"))),
        ];
        assert_eq!(format_report(&results), format_report(&results));
        let report = format_report(&results);
        assert!(report.find("./x.md").unwrap() < report.find("./y.md").unwrap());
    }

    #[test]
    fn test_write_report_into_any_writer() {
        let results = vec![info("./x.md", "a.md", 1, Some(ValidationResult::invalid("File not found: ./x.md")))];
        let mut out = String::new();

        assert!(write_report(&mut out, &results).is_ok());
        assert_eq!(out, format_report(&results));
        assert!(out.ends_with("   Error: File not found: ./x.md\n"));
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(vec![
            info("./ok.md", "a.md", 1, Some(ValidationResult::valid())),
            info("./bad.md", "a.md", 2, Some(ValidationResult::invalid("File not found: ./bad.md"))),
            info("./later.md", "a.md", 3, None),
        ]);

        assert_eq!(summary.valid.len(), 2);
        assert_eq!(summary.invalid.len(), 1);
        assert_eq!(summary.invalid[0].link.url, "./bad.md");
        assert!(!summary.is_clean());
    }
}
