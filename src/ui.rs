//! Terminal UI for audit runs, rendered via `indicatif` progress bars.
//!
//! One bar tracks completed phases; per-phase outcome lines print above it
//! as phases finish. Wire [`AuditUI::on_progress`] and
//! [`AuditUI::on_phase_complete`] into the orchestrator's callbacks.

use crate::phase::{PhaseProgress, PhaseReport, ProgressStatus};
use crate::report::{ComprehensiveReport, OverallStatus};
use crate::scoring::ReadinessAssessment;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub struct AuditUI {
    multi: MultiProgress,
    phase_bar: ProgressBar,
    verbose: bool,
}

impl AuditUI {
    /// Create the UI with a phase bar sized to the number of enabled phases.
    pub fn new(total_phases: u64, verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let phase_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let phase_bar = multi.add(ProgressBar::new(total_phases));
        phase_bar.set_style(phase_style);
        phase_bar.set_prefix("Phases");

        Self {
            multi,
            phase_bar,
            verbose,
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the
    /// rich UI fails. Outcome lines must not be lost when stdout is not a
    /// terminal.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Progress callback: updates the bar message and, on terminal
    /// transitions, advances the bar and prints the outcome line.
    pub fn on_progress(&self, progress: &PhaseProgress) {
        match progress.status {
            ProgressStatus::Running => {
                self.phase_bar
                    .set_message(format!("{}: {}", style(progress.phase).yellow(), progress.message));
            }
            ProgressStatus::Completed => {
                self.phase_bar.inc(1);
            }
            ProgressStatus::Failed => {
                self.phase_bar.inc(1);
                let cause = progress.error.as_deref().unwrap_or("unknown");
                self.print_line(format!(
                    "  {} {}: {}",
                    style("✗").red(),
                    progress.phase,
                    cause
                ));
            }
            ProgressStatus::Pending => {}
        }
        if self.verbose {
            self.print_line(format!(
                "  [{}] {} {}%",
                progress.status, progress.phase, progress.percent
            ));
        }
    }

    /// Phase-complete callback: prints the scored outcome line.
    pub fn on_phase_complete(&self, report: &PhaseReport) {
        let mark = if report.status.is_passed() {
            style("✓").green()
        } else {
            style("⚠").yellow()
        };
        self.print_line(format!(
            "  {} {} scored {:.0} ({})",
            mark, report.phase, report.score, report.status
        ));
    }

    /// Print the run summary once the report and assessment are available.
    pub fn finish(&self, report: &ComprehensiveReport, assessment: &ReadinessAssessment) {
        self.phase_bar.finish_and_clear();

        let status = match report.overall_status {
            OverallStatus::Passed => style(report.overall_status).green(),
            OverallStatus::Warning => style(report.overall_status).yellow(),
            OverallStatus::Failed => style(report.overall_status).red(),
        };
        println!();
        println!(
            "  {} overall {:.1} in {:.1}s",
            status,
            report.overall_score,
            report.execution_time_ms as f64 / 1000.0
        );
        println!(
            "  Readiness: {} (score {:.0}, confidence {:.0}%)",
            style(assessment.level).bold(),
            assessment.score,
            assessment.confidence
        );
        if let Some(ref estimate) = assessment.estimated_time_to_ready {
            println!("  Estimated time to ready: {}", estimate);
        }

        for blocker in &assessment.blockers {
            println!("  {} {}", style("blocker").red().bold(), blocker);
        }
        for warning in &assessment.warnings {
            println!("  {} {}", style("warning").yellow(), warning);
        }
        if self.verbose {
            for strength in &assessment.strengths {
                println!("  {} {}", style("strength").green(), strength);
            }
        }
    }
}
