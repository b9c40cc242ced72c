// Plain-text rendering of a RenderView, used by the one-shot `load` command

use std::fmt::{self, Write};

use crate::grouping::{GroupedView, RawView, RenderView};

/// Render a view as text. `expand_raw` prints the raw JSON of a grouped view
/// instead of the collapsed marker.
pub fn render_text(view: &RenderView, expand_raw: bool) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_view(&mut out, view, expand_raw);
    out
}

fn write_view(out: &mut impl Write, view: &RenderView, expand_raw: bool) -> fmt::Result {
    match view {
        RenderView::Empty => writeln!(out, "No data loaded."),
        RenderView::Grouped(grouped) => write_grouped(out, grouped, expand_raw),
        RenderView::Raw(raw) => write_raw(out, "Loaded Data:", raw, true),
    }
}

fn write_grouped(out: &mut impl Write, view: &GroupedView, expand_raw: bool) -> fmt::Result {
    writeln!(out, "{}", view.title)?;
    writeln!(out, "{}", "━".repeat(view.title.chars().count()))?;

    let totals: Vec<String> = view
        .totals
        .iter()
        .map(|t| format!("{}: {}", t.category.label, t.count))
        .collect();
    writeln!(out, "{}", totals.join("  |  "))?;

    for section in &view.sections {
        writeln!(out)?;
        writeln!(out, "{} ({})", section.category.label, section.count())?;

        for entry in &section.entries {
            writeln!(out, "  [{}] {}", section.category.badge, entry.name)?;
            writeln!(out, "      ID: {}", entry.id)?;
            if let Some(created) = &entry.created {
                writeln!(out, "      Created: {}", created)?;
            }
            if let Some(url) = &entry.url {
                writeln!(out, "      {}: {}", view.link_label, url)?;
            }
        }
    }

    writeln!(out)?;
    write_raw(out, "Raw JSON Data:", &view.raw, expand_raw)
}

fn write_raw(out: &mut impl Write, heading: &str, raw: &RawView, expanded: bool) -> fmt::Result {
    if expanded {
        writeln!(out, "{}", heading)?;
        writeln!(out, "{}", raw.text)
    } else {
        writeln!(out, "{} (collapsed, use --raw to show)", heading)
    }
}
