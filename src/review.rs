use crate::plan::{PendingWrite, Plan, WriteStatus};
use anyhow::Result;
use colored::Colorize;
use similar::{ChangeTag, DiffOp, TextDiff};
use std::io::{self, Write};
use std::path::Path;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::as_24_bit_terminal_escaped;

/// Syntax colouring for the unchanged context around an edit. Changed
/// lines are coloured by the diff instead.
struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    fn new() -> Self {
        let mut themes = ThemeSet::load_defaults();
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: themes.themes.remove("base16-ocean.dark").unwrap_or_default(),
        }
    }

    /// Collections are TypeScript; the bundled syntaxes cover it as `js`.
    fn syntax_for(&self, path: &Path) -> &SyntaxReference {
        path.extension()
            .and_then(|ext| self.syntaxes.find_syntax_by_extension(&ext.to_string_lossy()))
            .or_else(|| self.syntaxes.find_syntax_by_extension("js"))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    fn line(&self, syntax: &SyntaxReference, line: &str) -> String {
        let mut lines = HighlightLines::new(syntax, &self.theme);
        match lines.highlight_line(line, &self.syntaxes) {
            Ok(ranges) => format!("{}\x1b[0m", as_24_bit_terminal_escaped(&ranges, false)),
            Err(_) => line.to_string(),
        }
    }
}

/// `@@ -start,len +start,len @@` for one group of diff ops.
fn hunk_header(group: &[DiffOp]) -> String {
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return String::new();
    };
    let old = first.old_range().start..last.old_range().end;
    let new = first.new_range().start..last.new_range().end;
    format!(
        "@@ -{},{} +{},{} @@",
        old.start + 1,
        old.len(),
        new.start + 1,
        new.len()
    )
}

/// Shows pending catalog writes and asks before applying them.
pub struct Review;

impl Review {
    pub fn display_plan(&self, plan: &Plan, operation: &str) {
        if plan.is_empty() {
            println!("Nothing to {}.", operation);
            return;
        }

        println!("\n{}:\n", operation);

        for write in &plan.writes {
            let (icon, label) = match write.status {
                WriteStatus::Same => ("✓".blue(), "same".blue()),
                WriteStatus::Create => ("+".green(), "create".green()),
                WriteStatus::Overwrite => ("~".yellow(), "overwrite".yellow()),
            };

            println!(
                "  [{}] {} {} ({})",
                icon,
                write.collection.name().bold(),
                write.path.display(),
                label
            );
            for change in &write.changes {
                println!("      {}", change.dimmed());
            }
        }

        for path in &plan.removals {
            println!("  [{}] {} {} ({})", "-".red(), "media".bold(), path, "remove".red());
        }

        let mut summary = format!(
            "{} same, {} to create, {} to overwrite",
            plan.count_by_status(WriteStatus::Same),
            plan.count_by_status(WriteStatus::Create),
            plan.count_by_status(WriteStatus::Overwrite)
        );
        if !plan.removals.is_empty() {
            summary.push_str(&format!(", {} media file(s) to remove", plan.removals.len()));
        }
        println!("\nSummary: {}", summary);
    }

    pub fn confirm(&self, plan: &Plan) -> Result<bool> {
        loop {
            print!("\nProceed? [y/N/d] ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            match input.trim().to_ascii_lowercase().as_str() {
                "y" => return Ok(true),
                "n" | "" => return Ok(false),
                "d" => self.show_diffs(plan),
                _ => println!(
                    "Invalid option. Use 'y' to proceed, 'n' to abort, or 'd' to show diffs."
                ),
            }
        }
    }

    fn show_diffs(&self, plan: &Plan) {
        let highlighter = Highlighter::new();
        println!();
        for write in plan.writes.iter().filter(|w| w.status != WriteStatus::Same) {
            self.show_write_diff(&highlighter, write);
        }
        for path in &plan.removals {
            println!("{}", format!("--- {} (deleted)", path).red());
        }
    }

    /// Unified diff of one write. Only the changed records and a few lines
    /// of context are shown; changed words within a line are underlined.
    fn show_write_diff(&self, highlighter: &Highlighter, write: &PendingWrite) {
        let before = write.before.as_deref().unwrap_or("");
        let syntax = highlighter.syntax_for(&write.path);

        println!("{}", format!("--- {} (on disk)", write.path.display()).red());
        println!("{}", format!("+++ {} (pending)", write.path.display()).green());

        let diff = TextDiff::from_lines(before, write.after.as_str());
        for group in diff.grouped_ops(3) {
            println!("{}", hunk_header(&group).cyan());

            for op in &group {
                for change in diff.iter_inline_changes(op) {
                    let number = change
                        .new_index()
                        .or(change.old_index())
                        .map(|n| format!("{:4}", n + 1))
                        .unwrap_or_default();

                    let mut line = String::new();
                    for (emphasized, value) in change.iter_strings_lossy() {
                        let value = value.trim_end_matches('\n');
                        let styled = match (change.tag(), emphasized) {
                            (ChangeTag::Equal, _) => highlighter.line(syntax, value),
                            (ChangeTag::Delete, false) => value.red().to_string(),
                            (ChangeTag::Delete, true) => value.red().underline().to_string(),
                            (ChangeTag::Insert, false) => value.green().to_string(),
                            (ChangeTag::Insert, true) => value.green().underline().to_string(),
                        };
                        line.push_str(&styled);
                    }

                    let sign = match change.tag() {
                        ChangeTag::Delete => "-".red(),
                        ChangeTag::Insert => "+".green(),
                        ChangeTag::Equal => " ".normal(),
                    };
                    println!("{} {} {}", number.dimmed(), sign, line);
                }
            }
        }
        println!();
    }

    /// Display `plan`, confirm unless `skip_confirm`, then call `apply`.
    /// Returns whether `apply` ran.
    pub fn run<F>(&self, plan: &Plan, operation: &str, skip_confirm: bool, apply: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        self.display_plan(plan, operation);

        if !plan.has_changes() {
            println!("\nNothing to do.");
            return Ok(false);
        }

        let proceed = if skip_confirm {
            true
        } else {
            self.confirm(plan)?
        };

        if proceed {
            apply()?;
            println!("\nDone!");
        } else {
            println!("\nAborted.");
        }

        Ok(proceed)
    }
}
