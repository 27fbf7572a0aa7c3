//! Interactive console surface: the numbered menu, the run summary, and the
//! closing banner.

use std::io::{self, BufRead, Write};

use crate::pipeline::{RunSummary, Selection};

fn banner() -> String {
    "=".repeat(60)
}

fn read_trimmed_line<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn print_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", banner())?;
    writeln!(out, "DAO PROPOSAL SUMMARIZER - PROS & CONS")?;
    writeln!(out, "{}", banner())?;
    writeln!(out)
}

/// Show the 1-5 menu and read a choice. Choice 5 also asks for a count.
pub fn prompt_selection<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<Selection> {
    writeln!(out, "What would you like to analyze?")?;
    writeln!(out, "1. Latest proposal only")?;
    writeln!(out, "2. All ACTIVE proposals")?;
    writeln!(out, "3. Last 5 CLOSED proposals")?;
    writeln!(out, "4. Last 10 proposals (any status)")?;
    writeln!(out, "5. Custom number of proposals")?;
    writeln!(out)?;
    write!(out, "Enter your choice (1-5): ")?;
    out.flush()?;

    let choice = read_trimmed_line(input)?;
    let count = if choice == "5" {
        write!(out, "How many proposals? (max 100): ")?;
        out.flush()?;
        Some(read_trimmed_line(input)?)
    } else {
        None
    };
    writeln!(out)?;

    Ok(Selection::from_menu_choice(&choice, count.as_deref()))
}

pub fn print_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", banner())?;

    if summary.total == 0 {
        match summary.fetch_error {
            Some(ref e) => writeln!(out, "Could not fetch proposals: {}", e)?,
            None => writeln!(out, "No proposals found")?,
        }
        writeln!(out, "{}", banner())?;
        return print_counts(out, 0, 0, 0);
    }

    writeln!(out, "ANALYSIS COMPLETE")?;
    writeln!(out, "{}", banner())?;
    print_counts(out, summary.total, summary.succeeded(), summary.failed())?;

    if let Some(ref index) = summary.index_path {
        writeln!(out)?;
        writeln!(out, "Index file: {}", index.display())?;
    }
    if summary.succeeded() > 0 {
        writeln!(out, "All files saved to: {}", summary.output_dir.display())?;
    }
    Ok(())
}

/// Summary for a run that stopped before any proposal was processed.
pub fn print_aborted_summary<W: Write>(out: &mut W, error: &anyhow::Error) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", banner())?;
    writeln!(out, "Run aborted: {:#}", error)?;
    writeln!(out, "{}", banner())?;
    print_counts(out, 0, 0, 0)
}

fn print_counts<W: Write>(out: &mut W, total: usize, succeeded: usize, failed: usize) -> io::Result<()> {
    writeln!(out, "Results:")?;
    writeln!(out, "   - Total proposals: {}", total)?;
    writeln!(out, "   - Successfully analyzed: {}", succeeded)?;
    writeln!(out, "   - Failed: {}", failed)
}

pub fn print_completion_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", banner())?;
    writeln!(out, "PROCESS COMPLETE")?;
    writeln!(out, "{}", banner())
}

/// Block until ENTER (or EOF).
pub fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    write!(out, "Press ENTER to close...")?;
    out.flush()?;
    read_trimmed_line(input).map(|_| ())
}
