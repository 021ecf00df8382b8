use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use colored::Colorize as _;

use crate::data::{FileStatus, Payload};
use crate::error::PayloadError;

/// Progress line
pub fn info(msg: &str) {
    println!("{} {msg}", "info:".cyan().bold());
}

pub fn warn(msg: &str) {
    eprintln!("{} {msg}", "warning:".yellow().bold());
}

pub fn error(msg: &str) {
    eprintln!("{} {msg}", "error:".red().bold());
}

/// Write the payload as pretty-printed UTF-8 JSON
pub fn write_payload(payload: &Payload, path: &Path) -> Result<(), PayloadError> {
    let write_err = |source| PayloadError::Write {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payload)?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)
}

pub fn print_payload(payload: &Payload) -> Result<(), PayloadError> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

/// Print what went into the payload
pub fn print_summary(payload: &Payload, path: &Path) {
    let count = |status: FileStatus| payload.files.iter().filter(|f| f.status == status).count();

    println!(
        "{:19}{}  {} {}  {} {}  {} {}  {} {}",
        "Files changed:".cyan().bold(),
        payload.files.len().to_string().yellow().bold(),
        "+".green(),
        count(FileStatus::Added).to_string().green(),
        "~".yellow(),
        count(FileStatus::Modified).to_string().yellow(),
        "-".red(),
        count(FileStatus::Deleted).to_string().red(),
        "renamed:".dimmed(),
        count(FileStatus::Renamed),
    );
    println!(
        "{:19}{}",
        "Commits:".cyan().bold(),
        payload.commit_messages.len().to_string().green().bold()
    );
    println!(
        "{:19}{}",
        "Linked issues:".cyan().bold(),
        payload.linked_issues.len().to_string().green().bold()
    );
    println!(
        "{:19}{}",
        "Reviewers:".cyan().bold(),
        payload.reviewers.len().to_string().green().bold()
    );
    println!("Payload generated at {}", path.display().to_string().bright_blue());
}
