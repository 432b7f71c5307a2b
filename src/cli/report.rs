//! Report formatting and printing utilities.
//!
//! Diagnostics are displayed cargo-style. Kept apart from the commands so
//! the library can be used without any terminal output.

use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::commands::{
    CommandResult, CommandSummary, Diagnostic, InitSummary, ProcessSummary, Severity,
    TranslateSummary,
};
use crate::config::CONFIG_FILE_NAME;
use crate::core::text::byte_offset_of_utf16;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print diagnostics in cargo-style format to stdout.
pub fn report(diagnostics: &[Diagnostic]) {
    report_to(diagnostics, &mut io::stdout().lock());
}

/// Print diagnostics to a custom writer.
///
/// Useful for testing or redirecting output.
pub fn report_to<W: Write>(diagnostics: &[Diagnostic], writer: &mut W) {
    if diagnostics.is_empty() {
        return;
    }

    let max_line_width = diagnostics
        .iter()
        .filter_map(|d| d.position)
        .map(|p| (p.line + 1).to_string().len())
        .max()
        .unwrap_or(1);

    for diagnostic in diagnostics {
        print_diagnostic(diagnostic, writer, max_line_width);
    }

    print_summary(diagnostics, writer);
}

pub fn print(result: &CommandResult) {
    report(&result.diagnostics);
    print_command_output(result, &mut io::stdout().lock());
}

fn print_command_output<W: Write>(result: &CommandResult, writer: &mut W) {
    match &result.summary {
        CommandSummary::Process(summary) => print_process(summary, result, writer),
        CommandSummary::Translate(summary) => print_translate(summary, writer),
        CommandSummary::Init(summary) => print_init(summary, writer),
    }
}

fn print_diagnostic<W: Write>(diagnostic: &Diagnostic, writer: &mut W, max_line_width: usize) {
    let severity_str = match diagnostic.severity {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
    };
    let _ = writeln!(writer, "{}: {}", severity_str, diagnostic.message);

    let Some(position) = diagnostic.position else {
        let _ = writeln!(writer, "  {} {}", "-->".blue(), diagnostic.file);
        let _ = writeln!(writer);
        return;
    };
    let _ = writeln!(
        writer,
        "  {} {}:{}",
        "-->".blue(),
        diagnostic.file,
        position
    );

    if let Some(source_line) = &diagnostic.source_line {
        let caret_char = match diagnostic.severity {
            Severity::Error => "^".red(),
            Severity::Warning => "^".yellow(),
        };
        let line = (position.line + 1).to_string();

        let _ = writeln!(
            writer,
            "{:>width$} {}",
            "",
            "|".blue(),
            width = max_line_width
        );
        let _ = writeln!(
            writer,
            "{:>width$} {} {}",
            line.blue(),
            "|".blue(),
            source_line,
            width = max_line_width
        );

        // Position columns count UTF-16 code units.
        let prefix = &source_line[..byte_offset_of_utf16(source_line, position.character)];
        let caret_padding = UnicodeWidthStr::width(prefix);
        let _ = writeln!(
            writer,
            "{:>width$} {} {:>padding$}{}",
            "",
            "|".blue(),
            "",
            caret_char,
            width = max_line_width,
            padding = caret_padding
        );
    }

    let _ = writeln!(writer);
}

fn print_summary<W: Write>(diagnostics: &[Diagnostic], writer: &mut W) {
    let total_errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let total_warnings = diagnostics.len() - total_errors;

    let _ = writeln!(
        writer,
        "{} {} problems ({} {}, {} {})",
        FAILURE_MARK.red(),
        diagnostics.len(),
        total_errors,
        if total_errors == 1 { "error" } else { "errors" }.red(),
        total_warnings,
        if total_warnings == 1 {
            "warning"
        } else {
            "warnings"
        }
        .yellow()
    );
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

fn print_process<W: Write>(summary: &ProcessSummary, result: &CommandResult, writer: &mut W) {
    let mark = if result.error_count() == 0 {
        SUCCESS_MARK.green()
    } else {
        FAILURE_MARK.red()
    };
    let _ = writeln!(
        writer,
        "{} Rewrote {} of {} ({})",
        mark,
        plural(summary.files_rewritten, "file"),
        summary.files_scanned,
        plural(summary.messages, "message")
    );
    if let Some(id) = &summary.bundle_id {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Wrote metadata bundle {}", id).green()
        );
    }
}

fn print_translate<W: Write>(summary: &TranslateSummary, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} Wrote {} for {} and {}",
        SUCCESS_MARK.green(),
        plural(summary.files_written, "file"),
        plural(summary.bundles, "bundle"),
        plural(summary.languages, "language")
    );
}

fn print_init<W: Write>(summary: &InitSummary, writer: &mut W) {
    if summary.created {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    }
}
