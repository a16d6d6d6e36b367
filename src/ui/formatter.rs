//! Console formatting for releases and status messages.
//!
//! Table builders return strings so they can be tested; the `display_*`
//! helpers print directly.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::ui::{ReleaseDto, ReleaseItemDto};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Left-aligned columns separated by `|`, widths taken from the widest cell
struct Table {
    headers: Vec<&'static str>,
    widths: Vec<usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: Vec<&'static str>) -> Self {
        let widths = headers.iter().map(|h| h.chars().count()).collect();
        Table {
            headers,
            widths,
            rows: Vec::new(),
        }
    }

    fn add_row(&mut self, row: Vec<String>) {
        for (width, cell) in self.widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.chars().count());
        }
        self.rows.push(row);
    }

    fn line<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&self.widths)
            .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = width))
            .collect();
        format!(" {}", padded.join(" | ")).trim_end().to_string()
    }

    /// Render the table, styling each body line through `paint`
    fn render<F>(&self, paint: F) -> String
    where
        F: Fn(usize, String) -> String,
    {
        let mut out = String::new();
        out.push_str(&self.line(&self.headers));
        out.push('\n');

        let rule: Vec<String> = self.widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&self.line(&rule));
        out.push('\n');

        for (index, row) in self.rows.iter().enumerate() {
            out.push_str(&paint(index, self.line(row)));
            out.push('\n');
        }
        out
    }
}

fn paint_level(line: String, level: &str, color: bool) -> String {
    if !color {
        return line;
    }
    let styled = style(line).force_styling(true);
    match level {
        "MAJOR" => styled.red().to_string(),
        "MINOR" => styled.blue().to_string(),
        "PATCH" => styled.yellow().to_string(),
        _ => styled.to_string(),
    }
}

fn changelog_table(items: &[ReleaseItemDto], color: bool) -> String {
    let mut table = Table::new(vec!["Kind", "Level", "Scope", "Title"]);
    for item in items {
        table.add_row(vec![
            item.kind.clone(),
            item.level.clone(),
            item.scope.clone(),
            item.title.clone(),
        ]);
    }
    table.render(|index, line| paint_level(line, &items[index].level, color))
}

/// Current and next version followed by the changelog table
pub fn format_changelog(release: &ReleaseDto, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("Current release version\t: {}\n", release.current_version));
    if let Some(next) = &release.next_version {
        out.push_str(&format!("Next release version\t: {}\n", next));
    }
    out.push_str("\nChangelog:\n");

    if release.changelog.is_empty() {
        out.push_str("No change since last release\n");
    } else {
        out.push_str(&changelog_table(&release.changelog, color));
    }
    out
}

/// Releases as a `ref | release` table
pub fn format_releases(releases: &[ReleaseDto]) -> String {
    let mut table = Table::new(vec!["Ref", "Release"]);
    for release in releases {
        table.add_row(vec![release.r#ref.clone(), release.current_version.clone()]);
    }
    table.render(|_, line| line)
}
