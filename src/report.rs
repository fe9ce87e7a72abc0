/*!
 * Reporting for digest runs
 *
 * Renders a summary of one run with the tabled library: the largest
 * relevant files first, a breakdown of notebooks when there are any, then
 * totals for the whole digest.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::notebook::CellCounts;
use crate::repository::FileRepository;
use crate::stats::ContentStats;

/// Files beyond this count are cut down to the largest ones
const FULL_LISTING_LIMIT: usize = 15;
const TOP_FILES: usize = 10;

/// Statistics for one relevant file
#[derive(Debug, Clone)]
pub struct FileReportInfo {
    /// Path as ingested
    pub path: String,
    /// Measured stored content
    pub stats: ContentStats,
}

/// Composition of one relevant notebook
#[derive(Debug, Clone)]
pub struct NotebookReportInfo {
    /// Path as ingested
    pub path: String,
    /// Cells per kind
    pub cells: CellCounts,
    /// Percentage of the notebook taken by image payloads
    pub image_share: u8,
}

/// Summary of a digest run
#[derive(Debug, Clone)]
pub struct DigestReport {
    /// Where the digest was written
    pub output: String,
    /// Time taken to ingest and write
    pub duration: Duration,
    /// Files in the relevant store
    pub relevant_files: usize,
    /// Files in the non-relevant store
    pub non_relevant_files: usize,
    /// Parsed notebooks among the relevant files
    pub notebooks: Vec<NotebookReportInfo>,
    /// Measured digest text
    pub totals: ContentStats,
    /// Details for each relevant file
    pub file_details: Vec<FileReportInfo>,
}

impl DigestReport {
    /// Collect a report from a repository and the digest written for it
    pub fn collect(
        repository: &FileRepository,
        digest: &str,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let paths = repository.all_paths();
        let file_details = repository
            .relevant_entries()
            .map(|(path, content)| FileReportInfo {
                path: path.to_string(),
                stats: ContentStats::measure(content),
            })
            .collect();
        let notebooks = repository
            .notebooks()
            .map(|(path, doc)| NotebookReportInfo {
                path: path.to_string(),
                cells: doc.cell_counts(),
                image_share: doc.image_size_impact(),
            })
            .collect();

        Self {
            output: output.into(),
            duration,
            relevant_files: paths.relevant.len(),
            non_relevant_files: paths.non_relevant.len(),
            notebooks,
            totals: ContentStats::measure(digest),
            file_details,
        }
    }
}

/// Report generator for digest runs
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    fn format_tokens(&self, stats: &ContentStats) -> String {
        let kind = if stats.tokens_counted {
            "counted"
        } else {
            "estimated"
        };
        format!("{} tokens ({})", self.format_number(stats.tokens), kind)
    }

    /// Keep the tail of a long path, cut at a segment boundary
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut kept = Vec::new();
        let mut len = 3;
        for segment in path.rsplit('/') {
            let segment_len = segment.chars().count() + 1;
            if len + segment_len > max_len && !kept.is_empty() {
                break;
            }
            kept.push(segment);
            len += segment_len;
        }

        let tail: Vec<&str> = kept.into_iter().rev().collect();
        format!(".../{}", tail.join("/"))
    }

    fn create_summary_table(&self, report: &DigestReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: &'static str,

            #[tabled(rename = "Value")]
            value: String,
        }

        let rows = vec![
            SummaryRow {
                key: "📂 Output",
                value: report.output.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time",
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📄 Relevant Files",
                value: self.format_number(report.relevant_files),
            },
            SummaryRow {
                key: "🚫 Skipped Files",
                value: self.format_number(report.non_relevant_files),
            },
            SummaryRow {
                key: "📓 Notebooks",
                value: self.format_number(report.notebooks.len()),
            },
            SummaryRow {
                key: "🔤 Characters",
                value: self.format_number(report.totals.characters),
            },
            SummaryRow {
                key: "📝 Total Lines",
                value: self.format_number(report.totals.lines),
            },
            SummaryRow {
                key: "📦 LLM Tokens",
                value: self.format_tokens(&report.totals),
            },
        ];

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, report: &DigestReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Tokens")]
            tokens: String,
        }

        let mut files: Vec<&FileReportInfo> = report.file_details.iter().collect();
        files.sort_by(|a, b| b.stats.characters.cmp(&a.stats.characters));
        if files.len() > FULL_LISTING_LIMIT {
            files.truncate(TOP_FILES);
        }

        let rows: Vec<FileRow> = files
            .into_iter()
            .map(|info| FileRow {
                path: self.format_path(&info.path, 60),
                lines: self.format_number(info.stats.lines),
                tokens: self.format_number(info.stats.tokens),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_notebooks_table(&self, report: &DigestReport) -> String {
        #[derive(Tabled)]
        struct NotebookRow {
            #[tabled(rename = "Notebook")]
            path: String,

            #[tabled(rename = "Cells")]
            cells: String,

            #[tabled(rename = "With Output")]
            with_output: usize,

            #[tabled(rename = "Images")]
            images: String,
        }

        let rows: Vec<NotebookRow> = report
            .notebooks
            .iter()
            .map(|info| NotebookRow {
                path: self.format_path(&info.path, 60),
                cells: format!(
                    "{} code, {} markdown, {} raw",
                    info.cells.code, info.cells.markdown, info.cells.raw
                ),
                with_output: info.cells.code_with_output,
                images: format!("{}%", info.image_share),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    /// Generate the report text
    pub fn generate_report(&self, report: &DigestReport) -> String {
        let files_title = if report.file_details.len() > FULL_LISTING_LIMIT {
            "📋  TOP 10 LARGEST FILES BY CHARACTER COUNT  📋"
        } else {
            "📋  RELEVANT FILES"
        };

        let mut text = format!("{}\n{}\n\n", files_title, self.create_files_table(report));
        if !report.notebooks.is_empty() {
            text.push_str(&format!(
                "📓  NOTEBOOKS\n{}\n\n",
                self.create_notebooks_table(report)
            ));
        }
        text.push_str(&format!(
            "✅  DIGEST COMPLETE\n{}",
            self.create_summary_table(report)
        ));
        text
    }

    /// Print the report to stderr, keeping stdout for the digest
    pub fn print_report(&self, report: &DigestReport) {
        eprintln!("\n{}", self.generate_report(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(path: &str, characters: usize) -> FileReportInfo {
        FileReportInfo {
            path: path.to_string(),
            stats: ContentStats {
                characters,
                lines: 1,
                tokens: characters / 4,
                tokens_counted: true,
            },
        }
    }

    fn report(file_details: Vec<FileReportInfo>) -> DigestReport {
        DigestReport {
            output: "digest.txt".to_string(),
            duration: Duration::from_millis(5),
            relevant_files: file_details.len(),
            non_relevant_files: 2,
            notebooks: Vec::new(),
            totals: ContentStats::default(),
            file_details,
        }
    }

    #[test]
    fn test_format_number() {
        let reporter = Reporter::new();
        assert_eq!(reporter.format_number(999), "999");
        assert_eq!(reporter.format_number(1_500), "1.5K");
        assert_eq!(reporter.format_number(2_000_000), "2.0M");
    }

    #[test]
    fn test_format_path_keeps_tail() {
        let reporter = Reporter::new();
        assert_eq!(reporter.format_path("src/a.rs", 60), "src/a.rs");

        let long = format!("{}/inner/file.rs", "x".repeat(80));
        assert_eq!(reporter.format_path(&long, 30), ".../inner/file.rs");
    }

    #[test]
    fn test_report_lists_files_and_totals() {
        let text = Reporter::new().generate_report(&report(vec![info("a.js", 10), info("b.md", 400)]));

        assert!(text.contains("RELEVANT FILES"));
        assert!(text.contains("DIGEST COMPLETE"));
        assert!(text.contains("digest.txt"));
        assert!(text.find("b.md").unwrap() < text.find("a.js").unwrap());
        assert!(!text.contains("NOTEBOOKS"));
    }

    #[test]
    fn test_report_lists_notebooks() {
        let mut digest = report(vec![info("nb.ipynb", 100)]);
        digest.notebooks.push(NotebookReportInfo {
            path: "nb.ipynb".to_string(),
            cells: CellCounts {
                code: 3,
                markdown: 2,
                raw: 0,
                code_with_output: 1,
            },
            image_share: 42,
        });

        let text = Reporter::new().generate_report(&digest);
        assert!(text.contains("NOTEBOOKS"));
        assert!(text.contains("3 code, 2 markdown, 0 raw"));
        assert!(text.contains("42%"));
    }

    #[test]
    fn test_report_truncates_long_listings() {
        let files = (0..20).map(|i| info(&format!("f{:02}.js", i), i)).collect();
        let text = Reporter::new().generate_report(&report(files));

        assert!(text.contains("TOP 10 LARGEST FILES"));
        assert!(text.contains("f19.js"));
        assert!(!text.contains("f00.js"));
    }

    #[tokio::test]
    async fn test_collect_from_repository() {
        use crate::extensions::ExtensionPolicy;
        use crate::types::IngestEntry;

        let mut repository = FileRepository::default();
        let policy = ExtensionPolicy::from_extensions([".js", ".ipynb"]);
        repository
            .ingest(
                vec![
                    IngestEntry::new("a.js", "x"),
                    IngestEntry::new("b.png", "y"),
                    IngestEntry::new(
                        "c.ipynb",
                        r#"{"cells": [{"cell_type": "markdown", "source": "hi"}]}"#,
                    ),
                ],
                &policy,
            )
            .await;

        let digest = repository.combined_content();
        let report = DigestReport::collect(&repository, &digest, "stdout", Duration::ZERO);
        assert_eq!(report.relevant_files, 2);
        assert_eq!(report.non_relevant_files, 1);
        assert_eq!(report.file_details.len(), 2);
        assert_eq!(report.notebooks.len(), 1);
        assert_eq!(report.notebooks[0].path, "c.ipynb");
        assert_eq!(report.notebooks[0].cells.markdown, 1);
        assert_eq!(report.notebooks[0].image_share, 0);
        assert_eq!(report.totals.characters, digest.chars().count());
    }
}
