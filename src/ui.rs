use console::style;

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// Prints a bumped version, old in red and new in green.
pub fn display_version_change(old_version: &str, new_version: &str, dry_run: bool) {
    let prefix = if dry_run { "Would bump" } else { "Bumped" };
    display_success(&format!(
        "{} {} → {}",
        prefix,
        style(old_version).red(),
        style(new_version).green().bold()
    ));
}
