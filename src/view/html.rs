//! Paints a [`ViewSnapshot`] as a standalone HTML document.
//!
//! The image is embedded as a data URI. Boxes are absolutely positioned
//! children of a wrapper that shrinks to the rendered image, with every
//! offset in percent, so the document needs no script to stay aligned.

use anyhow::{Context, Result};
use base64::Engine;
use std::fmt::Write as _;
use std::path::Path;

use super::overlay::{Overlay, OverlayBox};
use super::session::{Phase, StatsRow, ViewSnapshot};

const HIDDEN_TEXT: &str = "rgb(148, 163, 184)";
const HIDDEN_BAR: &str = "rgb(203, 213, 225)";
const COUNT_TEXT: &str = "rgb(71, 85, 105)";

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;background:#f8fafc;color:#1e293b}\
main{max-width:64rem;margin:0 auto;padding:1.5rem;display:grid;gap:2rem;grid-template-columns:repeat(auto-fit,minmax(20rem,1fr));align-items:center}\
.frame{display:flex;justify-content:center;align-items:center;border-radius:1rem;overflow:hidden;background:#e2e8f0}\
.stage{position:relative;width:fit-content;max-width:100%}\
.stage img{display:block;width:100%;height:auto;max-height:75vh;object-fit:contain}\
.box{position:absolute;border:2px solid;box-sizing:border-box}\
.badge{position:absolute;top:-1.5rem;left:-2px;color:#fff;font-size:10px;padding:2px 6px;border-radius:2px;white-space:nowrap}\
.badge small{opacity:.8;margin-left:4px}\
.panel{background:#fff;border-radius:1rem;padding:1.25rem;border:1px solid #f1f5f9}\
.row{display:grid;grid-template-columns:1rem 70px 1fr 20px;gap:.5rem;align-items:center;margin:.75rem 0}\
.track{height:.6rem;background:#f1f5f9;border-radius:999px;overflow:hidden}\
.bar{height:100%;border-radius:999px}\
.count{font-weight:700;text-align:right}\
.summary{text-align:center;font-size:.75rem;color:#94a3b8}\
.model{background:#eff6ff;border:1px solid #bfdbfe;border-radius:1rem;padding:1rem;margin-bottom:1rem}\
.notice{padding:1.5rem;border-radius:.75rem;text-align:center}\
.error{background:#fef2f2;color:#dc2626;border:1px solid #fee2e2}";

/// Render the full document.
pub fn render_document(snapshot: &ViewSnapshot<'_>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Detection result</title>\n");
    let _ = writeln!(out, "<style>{}</style>", STYLE);
    out.push_str("</head>\n<body>\n<main>\n");

    match snapshot.phase {
        Phase::Idle => {
            out.push_str("<p class=\"notice\">No image selected.</p>\n");
        }
        Phase::Loading => {
            out.push_str("<p class=\"notice\">Detecting objects&hellip;</p>\n");
        }
        Phase::Failed { message } => {
            let _ = writeln!(
                out,
                "<div class=\"notice error\"><p>{}</p><p>Upload the image again to retry.</p></div>",
                escape_html(message)
            );
        }
        Phase::Ready => {
            render_image(&mut out, snapshot);
            render_panel(&mut out, snapshot);
        }
    }

    out.push_str("</main>\n</body>\n</html>\n");
    out
}

/// Render and write the document to `path`.
pub fn write_document(snapshot: &ViewSnapshot<'_>, path: &Path) -> Result<()> {
    std::fs::write(path, render_document(snapshot))
        .with_context(|| format!("write result view {}", path.display()))
}

fn render_image(out: &mut String, snapshot: &ViewSnapshot<'_>) {
    let Some(image) = snapshot.image else {
        return;
    };
    let data = base64::engine::general_purpose::STANDARD.encode(image.bytes());
    out.push_str("<section class=\"frame\">\n<div class=\"stage\">\n");
    let _ = writeln!(
        out,
        "<img src=\"data:{};base64,{}\" width=\"{}\" height=\"{}\" alt=\"{}\">",
        image.mime_type(),
        data,
        image.width(),
        image.height(),
        escape_html(image.file_name())
    );
    if let Some(overlay) = &snapshot.overlay {
        render_boxes(out, overlay);
    }
    out.push_str("</div>\n</section>\n");
}

fn render_boxes(out: &mut String, overlay: &Overlay) {
    for b in &overlay.boxes {
        let _ = writeln!(out, "{}", box_element(b));
    }
}

fn box_element(b: &OverlayBox) -> String {
    let score = if b.score.is_empty() {
        String::new()
    } else {
        format!("<small>{}</small>", b.score)
    };
    format!(
        "<div class=\"box\" data-label=\"{label}\" style=\"top:{top}%;left:{left}%;width:{width}%;height:{height}%;border-color:{border}\">\
<span class=\"badge\" style=\"background-color:{fill}\">{label}{score}</span></div>",
        label = escape_html(&b.label),
        top = b.top,
        left = b.left,
        width = b.width,
        height = b.height,
        border = b.color.border,
        fill = b.color.fill,
        score = score,
    )
}

fn render_panel(out: &mut String, snapshot: &ViewSnapshot<'_>) {
    out.push_str("<section>\n");
    if let Some(model) = snapshot.model_name {
        let _ = writeln!(
            out,
            "<div class=\"model\"><strong>Model</strong><div>{}</div></div>",
            escape_html(model)
        );
    }
    out.push_str("<div class=\"panel\">\n<h3>Object statistics</h3>\n");
    for row in &snapshot.rows {
        let _ = writeln!(out, "{}", stats_row(row));
    }
    let _ = writeln!(
        out,
        "<p class=\"summary\">total {} &middot; visible {}</p>",
        snapshot.total, snapshot.visible
    );
    out.push_str("</div>\n</section>\n");
}

fn stats_row(row: &StatsRow) -> String {
    let (label_color, bar_color, count_color) = if row.visible {
        (
            row.color.fill.to_string(),
            row.color.border.to_string(),
            COUNT_TEXT.to_string(),
        )
    } else {
        (
            HIDDEN_TEXT.to_string(),
            HIDDEN_BAR.to_string(),
            HIDDEN_TEXT.to_string(),
        )
    };
    format!(
        "<div class=\"row\"><input type=\"checkbox\"{checked} style=\"accent-color:{accent}\">\
<span style=\"color:{label_color}\">{label}</span>\
<div class=\"track\"><div class=\"bar\" style=\"width:{bar:.2}%;background-color:{bar_color}\"></div></div>\
<span class=\"count\" style=\"color:{count_color}\">{count}</span></div>",
        checked = if row.visible { " checked" } else { "" },
        accent = row.color.border,
        label_color = label_color,
        label = escape_html(&row.label),
        bar = row.bar_percent,
        bar_color = bar_color,
        count_color = count_color,
        count = row.count,
    )
}

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
