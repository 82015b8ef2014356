//! Diff display - berks-deploy UI

use colored::Colorize;
use declarative::{DiffSummary, ResourceDiff, ResourceState, group_by_type};
use similar::{ChangeTag, TextDiff};

/// Display a plan's pending diffs, grouped by step type in plan order
pub fn display_diff(title: &str, diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} {} - no changes needed", "✓".green(), title);
        return;
    }

    println!();
    println!("┌─ {} ─────────────────────────────────────────┐", title.bold());
    println!("│");

    for (resource_type, type_diffs) in group_by_type(diffs) {
        println!("│ {}", type_label(&resource_type).bold());

        for diff in type_diffs {
            println!(
                "│   {} {:<30} {}",
                symbol(diff),
                diff.resource_id,
                state_desc(diff).dimmed()
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} to add, {} to change, {} to remove)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn type_label(resource_type: &str) -> &str {
    match resource_type {
        "group" => "Groups",
        "user" => "Users",
        "ruby" => "Ruby runtime",
        "directory" => "Directories",
        "package" => "Native packages",
        "gem" => "Gems",
        "git" => "Source checkout",
        "bundle" => "Bundled dependencies",
        "file" => "Config files",
        "service" => "Services",
        other => other,
    }
}

fn symbol(diff: &ResourceDiff) -> colored::ColoredString {
    if diff.is_addition() {
        "+".green()
    } else if diff.is_removal() {
        "-".red()
    } else if matches!(diff.current, ResourceState::Unknown) {
        "?".dimmed()
    } else {
        "~".yellow()
    }
}

fn state_desc(diff: &ResourceDiff) -> String {
    match (&diff.current, &diff.desired) {
        (ResourceState::Absent, ResourceState::Present { details }) => format!(
            "(missing){}",
            details
                .as_ref()
                .map(|d| format!(" → {d}"))
                .unwrap_or_default()
        ),
        (ResourceState::Modified { from, to }, _) => format!("{from} → {to}"),
        (ResourceState::Present { details: from }, ResourceState::Present { details: to }) => {
            format!(
                "{} → {}",
                from.as_deref().unwrap_or("current"),
                to.as_deref().unwrap_or("desired")
            )
        }
        (ResourceState::Present { .. }, ResourceState::Absent) => "(will remove)".to_string(),
        (ResourceState::Unknown, _) => "(state unknown)".to_string(),
        _ => String::new(),
    }
}

/// Show a line diff between the config on disk and the one that would be written
///
/// Returns whether the texts differ.
pub fn show_text_diff(current: Option<&str>, desired: &str) -> bool {
    let current = current.unwrap_or("");
    let diff = TextDiff::from_lines(current, desired);
    let mut has_changes = false;

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => {
                has_changes = true;
                print!("    {}", format!("- {change}").red());
            }
            ChangeTag::Insert => {
                has_changes = true;
                print!("    {}", format!("+ {change}").green());
            }
            ChangeTag::Equal => {}
        }
    }

    if !has_changes {
        println!("    {}", "(files are identical)".dimmed());
    }
    has_changes
}
