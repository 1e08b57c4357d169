// Command-line surface: arguments, prompts and console output

use std::io::{self, BufRead, IsTerminal, Write};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::models::RunSummary;

pub const DEFAULT_FOLDER: &str = "Shared Documents";

#[derive(Parser, Debug, Default)]
#[command(name = "sharepoint-analyzer")]
#[command(about = "Summarize the documents of a SharePoint folder into an Excel report")]
#[command(version)]
pub struct Args {
    /// Server-relative folder to analyze (prompted when omitted)
    #[arg(short, long)]
    pub folder: Option<String>,

    /// SharePoint site URL, overrides SHAREPOINT_SITE_URL
    #[arg(long)]
    pub site_url: Option<String>,

    /// Report path, overrides OUTPUT_FILENAME
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Skip files larger than this, overrides MAX_FILE_SIZE_MB
    #[arg(long, value_name = "MB")]
    pub max_file_size_mb: Option<u64>,

    /// SharePoint username, overrides SHAREPOINT_USERNAME
    #[arg(short, long)]
    pub username: Option<String>,

    /// Never prompt; missing values are configuration errors
    #[arg(long)]
    pub non_interactive: bool,
}

impl Args {
    pub fn is_interactive(&self) -> bool {
        !self.non_interactive && io::stdin().is_terminal()
    }

    /// Fold command-line overrides into the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(site) = &self.site_url {
            config.sharepoint.site_url = site.trim().trim_end_matches('/').to_string();
        }
        if let Some(username) = &self.username {
            config.sharepoint.username = username.trim().to_string();
        }
        if let Some(output) = &self.output {
            config.app.output_filename = output.clone();
        }
        if let Some(mb) = self.max_file_size_mb {
            config.app.max_file_size_mb = mb;
        }
    }
}

/// Print `label` and read one line. Empty input takes `default`; without a
/// default the question repeats until answered.
pub fn prompt(label: &str, default: Option<&str>) -> io::Result<String> {
    let stdin = io::stdin();
    prompt_from(&mut stdin.lock(), &mut io::stdout(), label, default)
}

fn prompt_from<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    default: Option<&str>,
) -> io::Result<String> {
    loop {
        match default {
            Some(d) => write!(output, "{} [{}]: ", label, d)?,
            None => write!(output, "{}: ", label)?,
        }
        output.flush()?;

        let mut line = String::new();
        let closed = input.read_line(&mut line)? == 0;
        let answer = line.trim();

        match (answer.is_empty(), default) {
            (false, _) => return Ok(answer.to_string()),
            (true, Some(d)) => return Ok(d.to_string()),
            (true, None) if closed => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("input closed before {} was entered", label),
                ))
            }
            (true, None) => writeln!(output, "{} is required.", label)?,
        }
    }
}

/// Ask for whatever SharePoint connection details are still missing
pub fn prompt_for_credentials(config: &mut Config) -> io::Result<()> {
    if config.sharepoint.site_url.is_empty() {
        config.sharepoint.site_url = prompt("SharePoint site URL", None)?
            .trim_end_matches('/')
            .to_string();
    }
    if config.sharepoint.username.is_empty() {
        config.sharepoint.username = prompt("Username", None)?;
    }
    if config.sharepoint.password.is_empty() {
        config.sharepoint.password = prompt("Password", None)?;
    }
    Ok(())
}

pub fn print_banner() {
    println!("{}", "=".repeat(60));
    println!("SharePoint File Analyzer");
    println!("{}", "=".repeat(60));
}

pub fn print_config_errors(errors: &[String]) {
    eprintln!("Configuration errors:");
    for error in errors {
        eprintln!("  - {}", error);
    }
    eprintln!("Set the missing values in the environment or a .env file.");
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Analysis complete");
    println!("{}", "=".repeat(60));
    println!("Files found:     {}", summary.files_found);
    println!("Files skipped:   {}", summary.files_skipped);
    println!("Files processed: {}", summary.files_processed);
    println!("Files with errors: {}", summary.files_errored);
    println!("Report: {}", summary.output_path);
    if summary.files_errored > 0 {
        println!("See the \"Errors\" sheet for details on failed files.");
    }
}

pub fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn test_prompt_uses_default_on_empty_line() {
        let mut input = Cursor::new("\n");
        let mut output = Vec::new();
        let answer = prompt_from(&mut input, &mut output, "Folder", Some(DEFAULT_FOLDER)).unwrap();
        assert_eq!(answer, "Shared Documents");
        assert_eq!(String::from_utf8(output).unwrap(), "Folder [Shared Documents]: ");
    }

    #[test]
    fn test_prompt_trims_answer() {
        let mut input = Cursor::new("  Projects/2024  \n");
        let mut output = Vec::new();
        let answer = prompt_from(&mut input, &mut output, "Folder", Some(DEFAULT_FOLDER)).unwrap();
        assert_eq!(answer, "Projects/2024");
    }

    #[test]
    fn test_prompt_without_default_repeats_until_answered() {
        let mut input = Cursor::new("\n   \nalice@contoso.com\n");
        let mut output = Vec::new();
        let answer = prompt_from(&mut input, &mut output, "Username", None).unwrap();
        assert_eq!(answer, "alice@contoso.com");

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Username: ").count(), 3);
        assert_eq!(shown.matches("Username is required.").count(), 2);
    }

    #[test]
    fn test_prompt_without_default_fails_on_closed_input() {
        let mut input = Cursor::new("\n");
        let mut output = Vec::new();
        let err = prompt_from(&mut input, &mut output, "Password", None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let args = Args::try_parse_from([
            "sharepoint-analyzer",
            "--site-url",
            "https://contoso.sharepoint.com/sites/docs/",
            "--output",
            "out.xlsx",
            "--max-file-size-mb",
            "2",
            "--non-interactive",
        ])
        .unwrap();
        let mut config = config();
        args.apply(&mut config);

        assert_eq!(config.sharepoint.site_url, "https://contoso.sharepoint.com/sites/docs");
        assert_eq!(config.app.output_filename, "out.xlsx");
        assert_eq!(config.app.max_file_size_mb, 2);
        assert!(!args.is_interactive());
    }

    #[test]
    fn test_no_overrides_keep_defaults() {
        let args = Args::try_parse_from(["sharepoint-analyzer"]).unwrap();
        let mut config = config();
        args.apply(&mut config);
        assert_eq!(config.app.output_filename, "sharepoint_file_analysis.xlsx");
        assert_eq!(config.app.max_file_size_mb, 10);
        assert!(args.folder.is_none());
    }
}
