use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use windlint_bridge::{bridge_suggestions, DiagnosticsBridge};
use windlint_linter::{lint_document, Diagnostic, DiagnosticLevel, LintOptions};

/// Fix passes per file before giving up on convergence.
const MAX_FIX_PASSES: usize = 100;

#[derive(Args, Debug)]
pub struct LintArgs {
    /// File or directory to lint
    pub input: PathBuf,

    /// Apply safe fixes and write the files back
    #[arg(long)]
    pub fix: bool,

    /// Show all diagnostics including info level, and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Do not start the configured diagnostics server
    #[arg(long)]
    pub no_bridge: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LintSummary {
    pub files_checked: usize,
    pub diagnostics: usize,
    pub errors: usize,
    pub warnings: usize,
    pub fixes_applied: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    path: String,
    diagnostics: Vec<Diagnostic>,
    fixes_applied: usize,
    #[serde(skip)]
    source: String,
}

pub async fn lint(args: LintArgs, cwd: &str) -> Result<LintSummary> {
    let json = args.format == "json";
    let config = Config::load(cwd)?;
    let options = LintOptions {
        registry: Some(config.registry(cwd)?),
    };

    if !json {
        println!("🔍 {} windlint", "Starting".green().bold());
        println!("   Input: {}", args.input.display());
        println!();
    }

    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        let files = find_files(&args.input, &config, cwd);
        if !json {
            println!("   Found {} files", files.len());
            println!();
        }
        files
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    let bridge = match (&config.bridge, args.no_bridge) {
        (Some(bridge_options), false) => {
            start_bridge(DiagnosticsBridge::new(bridge_options.to_bridge_config())).await
        }
        _ => None,
    };

    let mut summary = LintSummary::default();
    let mut reports = Vec::new();
    for file in &files {
        let report = lint_file(file, &options, bridge.as_ref(), args.fix).await?;

        summary.files_checked += 1;
        summary.diagnostics += report.diagnostics.len();
        summary.errors += count(&report.diagnostics, DiagnosticLevel::Error);
        summary.warnings += count(&report.diagnostics, DiagnosticLevel::Warning);
        summary.fixes_applied += report.fixes_applied;

        if !json {
            print_report(&report, args.verbose);
        }
        reports.push(report);
    }

    if let Some(bridge) = &bridge {
        bridge.shutdown().await;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_summary(&summary);
    }

    Ok(summary)
}

async fn start_bridge(bridge: DiagnosticsBridge) -> Option<DiagnosticsBridge> {
    match bridge.ensure_started().await {
        Ok(()) => Some(bridge),
        Err(error) => {
            warn!(%error, "Diagnostics server unavailable, using local suggestions only");
            None
        }
    }
}

async fn lint_file(
    file_path: &Path,
    options: &LintOptions,
    bridge: Option<&DiagnosticsBridge>,
    fix: bool,
) -> Result<FileReport> {
    let mut source = fs::read_to_string(file_path)?;
    let path = file_path.to_string_lossy().to_string();

    let external = match bridge {
        Some(bridge) => bridge_suggestions(bridge, &source, &path).await,
        None => Vec::new(),
    };
    let mut diagnostics = lint_document(&source, &path, &external, options);

    let mut fixes_applied = 0;
    if fix {
        // Offsets move after every edit, so fixes are applied one at a time
        // against a fresh lint.
        while let Some(edit) = diagnostics.iter().find_map(|d| d.fix.clone()) {
            if fixes_applied == MAX_FIX_PASSES {
                warn!(path = %path, "Fixes did not converge");
                break;
            }
            source = edit.apply(&source);
            fixes_applied += 1;
            diagnostics = lint_document(&source, &path, &external, options);
        }

        if fixes_applied > 0 {
            fs::write(file_path, &source)?;
            info!(path = %path, fixes = fixes_applied, "Wrote fixes");
        }
    }

    debug!(path = %path, diagnostics = diagnostics.len(), "Linted file");
    Ok(FileReport {
        path,
        diagnostics,
        fixes_applied,
        source,
    })
}

fn count(diagnostics: &[Diagnostic], level: DiagnosticLevel) -> usize {
    diagnostics.iter().filter(|d| d.level == level).count()
}

fn print_report(report: &FileReport, verbose: bool) {
    if report.fixes_applied > 0 {
        println!(
            "{} {} ({} fixed)",
            "✎".cyan(),
            report.path,
            report.fixes_applied
        );
    }

    if report.diagnostics.is_empty() {
        if verbose {
            println!("{} {}", "✓".green(), report.path);
        }
        return;
    }

    println!("{}", report.path);

    for diagnostic in &report.diagnostics {
        let level_str = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
            DiagnosticLevel::Info => "info".blue().bold(),
        };

        if !verbose && matches!(diagnostic.level, DiagnosticLevel::Info) {
            continue;
        }

        let (line, column) = diagnostic.span.line_col(&report.source);
        println!(
            "  {}:{} {} [{}] {}",
            line, column, level_str, diagnostic.rule, diagnostic.message
        );

        if let Some(suggestion) = &diagnostic.suggestion {
            println!("    {} {}", "💡".dimmed(), suggestion.dimmed());
        }
    }

    println!();
}

fn print_summary(summary: &LintSummary) {
    println!();
    println!(
        "✨ {} Linting complete!",
        if summary.errors > 0 {
            "Done".red().bold()
        } else {
            "Done".green().bold()
        }
    );
    println!("   Files checked: {}", summary.files_checked);
    println!("   Total diagnostics: {}", summary.diagnostics);

    if summary.fixes_applied > 0 {
        println!("   {} {}", "Fixed:".cyan(), summary.fixes_applied);
    }
    if summary.errors > 0 {
        println!("   {} {}", "Errors:".red(), summary.errors);
    }
    if summary.warnings > 0 {
        println!("   {} {}", "Warnings:".yellow(), summary.warnings);
    }

    if summary.errors == 0 && summary.warnings == 0 {
        println!("   {} No issues found!", "✓".green());
    }
}

fn find_files(dir: &Path, config: &Config, cwd: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && config.includes(path, cwd))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(input: PathBuf, fix: bool) -> LintArgs {
        LintArgs {
            input,
            fix,
            verbose: false,
            format: "text".to_string(),
            no_bridge: true,
        }
    }

    #[tokio::test]
    async fn test_lint_directory() {
        let dir = tempdir().unwrap();
        let cwd = dir.path().to_string_lossy().to_string();
        fs::write(dir.path().join("page.html"), r#"<div class="mt-4 mt-6 flex-grow">hi</div>"#).unwrap();
        fs::write(dir.path().join("clean.tsx"), r#"<p className="p-4">ok</p>"#).unwrap();
        fs::write(dir.path().join("notes.txt"), r#"<div class="mt-4 mt-6">"#).unwrap();

        let summary = lint(args(dir.path().to_path_buf(), false), &cwd).await.unwrap();
        assert_eq!(summary.files_checked, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.fixes_applied, 0);
    }

    #[tokio::test]
    async fn test_fix_rewrites_file() {
        let dir = tempdir().unwrap();
        let cwd = dir.path().to_string_lossy().to_string();
        let file = dir.path().join("page.jsx");
        fs::write(&file, "<div className=\"mt-4 flex-grow mt-6\">\n  <b class=\"!mb-0\">x</b>\n</div>\n").unwrap();

        let summary = lint(args(file.clone(), true), &cwd).await.unwrap();
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.warnings, 0);
        assert_eq!(summary.fixes_applied, 3);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "<div className=\"mt-6 grow\">\n  <b class=\"mb-0!\">x</b>\n</div>\n"
        );
    }

    #[tokio::test]
    async fn test_missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let cwd = dir.path().to_string_lossy().to_string();
        let result = lint(args(dir.path().join("missing"), false), &cwd).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_bridge_falls_back() {
        let dir = tempdir().unwrap();
        let cwd = dir.path().to_string_lossy().to_string();
        fs::write(
            dir.path().join("windlint.config.json"),
            r#"{ "bridge": { "command": "windlint-test-no-such-server", "timeoutMs": 100 } }"#,
        )
        .unwrap();
        let file = dir.path().join("a.html");
        fs::write(&file, r#"<i class="flex-grow">"#).unwrap();

        let mut lint_args = args(file, false);
        lint_args.no_bridge = false;
        let summary = lint(lint_args, &cwd).await.unwrap();
        assert_eq!(summary.warnings, 1);
    }
}
