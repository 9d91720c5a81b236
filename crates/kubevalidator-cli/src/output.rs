//! # Report Rendering
//!
//! - `text`: a human summary followed by one block per annotation.
//! - `json`: JSON Lines, one serialized [`Report`] per line. `check`
//!   writes the in-progress report before validation starts and the
//!   completed one after, mirroring a CI check run's lifecycle.
//! - `github`: workflow commands (`::error file=...::message`) that CI
//!   turns into inline annotations, then the summary.

use anyhow::Result;
use clap::ValueEnum;
use kubevalidator_check::{report, CHECK_RUN_NAME};
use kubevalidator_core::{Annotation, Report, Timestamp};

/// Output format for `kubevalidator check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Github,
}

/// Render `report` in `format`. The result ends with a newline.
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => {
            let mut out = serde_json::to_string(report)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Github => Ok(render_github(report)),
    }
}

/// What to print when validation starts: the in-progress report for
/// `json`, nothing for the human formats.
pub fn render_started(started_at: Timestamp, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Json => Ok(Some(render(&report::in_progress(started_at), format)?)),
        OutputFormat::Text | OutputFormat::Github => Ok(None),
    }
}

fn render_text(report: &Report) -> String {
    let conclusion = report
        .conclusion()
        .map(|c| c.as_str())
        .unwrap_or("in_progress");
    let mut out = format!("{CHECK_RUN_NAME}: {} ({conclusion})\n", report.title());
    if !report.summary().is_empty() {
        out.push_str(&format!("\n{}\n", report.summary()));
    }
    for annotation in report.annotations() {
        out.push_str(&format!(
            "\n{}:{}: {}\n  {}\n",
            annotation.path(),
            annotation.lines(),
            annotation.title(),
            annotation.message().replace('\n', "\n  ")
        ));
        if let Some(details) = annotation.raw_details() {
            for line in details.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
    }
    out
}

/// Escaping for workflow command data.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Escaping for workflow command properties.
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// One `::error` workflow command.
pub fn workflow_command(annotation: &Annotation) -> String {
    let mut message = annotation.message().to_string();
    if let Some(details) = annotation.raw_details() {
        message.push_str("\n\n");
        message.push_str(details.trim_end());
    }
    format!(
        "::error file={},line={},endLine={},title={}::{}",
        escape_property(annotation.path()),
        annotation.lines().start(),
        annotation.lines().end(),
        escape_property(annotation.title()),
        escape_data(&message)
    )
}

fn render_github(report: &Report) -> String {
    let mut out = String::new();
    for annotation in report.annotations() {
        out.push_str(&workflow_command(annotation));
        out.push('\n');
    }
    out.push_str(&render_text_header(report));
    out
}

fn render_text_header(report: &Report) -> String {
    let mut out = format!("{CHECK_RUN_NAME}: {}\n", report.title());
    if !report.summary().is_empty() {
        out.push_str(&format!("\n{}\n", report.summary()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubevalidator_core::{Conclusion, FileRef, LineRange, RunStatus};

    fn report() -> Report {
        let file = FileRef::new("k8s/web.yaml", None).unwrap();
        let annotation = Annotation::failure(
            &file,
            LineRange::line(4),
            "Error validating Deployment against master schema",
            "spec.replicas: \"x\" is not of type \"integer\"",
        )
        .with_raw_details("* field: spec.replicas\n");
        let ts = Timestamp::parse("2018-10-01T12:00:00Z").unwrap();
        Report::completed(
            Conclusion::Failure,
            "1 file checked, 1 error",
            "* `./k8s/web.yaml`",
            vec![annotation],
            ts,
            ts,
        )
    }

    #[test]
    fn text_lists_annotations_with_ranges() {
        let out = render(&report(), OutputFormat::Text).unwrap();
        assert!(out.starts_with("Kubernetes YAML: 1 file checked, 1 error (failure)\n"));
        assert!(out.contains("k8s/web.yaml:4: Error validating Deployment against master schema"));
        assert!(out.contains("    * field: spec.replicas"));
    }

    #[test]
    fn github_commands_escape_properties_and_data() {
        let out = render(&report(), OutputFormat::Github).unwrap();
        let first = out.lines().next().unwrap();
        assert_eq!(
            first,
            "::error file=k8s/web.yaml,line=4,endLine=4,title=Error validating Deployment against master schema::spec.replicas: \"x\" is not of type \"integer\"%0A%0A* field: spec.replicas"
        );
        assert_eq!(escape_property("a:b,c%"), "a%3Ab%2Cc%25");
    }

    #[test]
    fn json_round_trips() {
        let out = render(&report(), OutputFormat::Json).unwrap();
        let back: Report = serde_json::from_str(&out).unwrap();
        assert_eq!(back, report());
    }

    #[test]
    fn json_start_and_finish_are_separate_lines() {
        let ts = Timestamp::parse("2018-10-01T12:00:00Z").unwrap();
        let started = render_started(ts, OutputFormat::Json).unwrap().unwrap();
        let stream = format!("{started}{}", render(&report(), OutputFormat::Json).unwrap());

        let reports: Vec<Report> = stream.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status(), RunStatus::InProgress);
        assert_eq!(reports[0].title(), "Validating...");
        assert_eq!(reports[1], report());
    }

    #[test]
    fn human_formats_print_nothing_at_start() {
        let ts = Timestamp::parse("2018-10-01T12:00:00Z").unwrap();
        assert_eq!(render_started(ts, OutputFormat::Text).unwrap(), None);
        assert_eq!(render_started(ts, OutputFormat::Github).unwrap(), None);
    }
}
