//! Line-oriented console reporter.
//!
//! Every event becomes one line written under the stdout lock, so messages
//! from the install flow never interleave.

use std::io::Write;

use crossterm::style::Stylize;
use sis_core::Reporter;
use sis_core::ops::Stage;
use sis_core::resolver::PlanEntry;
use sis_schema::{PackageId, VersionTag};

const NAME_WIDTH: usize = 20;

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

fn line(text: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{text}");
}

fn err_line(text: &str) {
    let mut err = std::io::stderr().lock();
    let _ = writeln!(err, "{text}");
}

fn stage_label(stage: Stage) -> String {
    match stage {
        Stage::Installed => stage.as_str().green().to_string(),
        Stage::Failed => stage.as_str().red().to_string(),
        _ => stage.as_str().dark_grey().to_string(),
    }
}

impl Reporter for ConsoleReporter {
    fn plan(&self, entries: &[PlanEntry]) {
        self.section("Plan");
        for entry in entries {
            let marker = if entry.requested { "*" } else { " " };
            line(&format!(
                "  {marker} {:<NAME_WIDTH$} {}",
                entry.id.as_str(),
                entry.display_version().as_str().dark_grey()
            ));
        }
    }

    fn section(&self, title: &str) {
        line("");
        line(&title.bold().to_string());
    }

    fn stage(&self, id: &PackageId, stage: Stage) {
        if matches!(stage, Stage::Installed | Stage::Failed) {
            return;
        }
        line(&format!("  {:<NAME_WIDTH$} {}", id.as_str(), stage_label(stage)));
    }

    fn skipped(&self, id: &PackageId, reason: &str) {
        line(&format!(
            "  {:<NAME_WIDTH$} {}",
            id.as_str(),
            reason.dark_grey()
        ));
    }

    fn removing(&self, id: &PackageId, version: &VersionTag) {
        line(&format!(
            "  {:<NAME_WIDTH$} {} {}",
            id.as_str(),
            version.as_str().dark_grey(),
            "removing".dark_grey()
        ));
    }

    fn done(&self, id: &PackageId, version: &VersionTag, detail: &str) {
        line(&format!(
            "  {} {:<NAME_WIDTH$} {} {}",
            "✓".green(),
            id.as_str(),
            version.as_str(),
            detail.dark_grey()
        ));
    }

    fn failed(&self, id: &PackageId, stage: Stage, reason: &str) {
        err_line(&format!(
            "  {} {:<NAME_WIDTH$} failed while {}: {reason}",
            "✗".red(),
            id.as_str(),
            stage.as_str()
        ));
    }

    fn info(&self, msg: &str) {
        line(&format!("  {} {msg}", "ℹ".blue()));
    }

    fn warning(&self, msg: &str) {
        err_line(&format!("  {} {msg}", "warning:".yellow().bold()));
    }

    fn error(&self, msg: &str) {
        err_line(&format!("  {} {msg}", "error:".red().bold()));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        let noun = if count == 1 { "package" } else { "packages" };
        line("");
        line(&format!("  {count} {noun} {action} in {elapsed_secs:.1}s"));
    }
}
