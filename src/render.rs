// src/render.rs
//! Digest rendering: one Markdown and one HTML document of the same ranked
//! article list, written under a dated filename. Thin collaborator; the
//! rendering itself is pure so it can be asserted on without touching disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::rank::ProcessedArticle;

pub fn render_markdown(date: &str, articles: &[ProcessedArticle]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# 📰 Daily Summary - {date}\n\n"));
    for a in articles {
        out.push_str(&format!("## [{}]({})\n", a.title, a.link));
        out.push_str(&format!("{}\n\n", a.summary));
        out.push_str(&format!("*{}* — score {:.2}\n\n", a.category, a.score));
    }
    out
}

pub fn render_html(date: &str, articles: &[ProcessedArticle]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<html><head><meta charset='utf-8'><title>Daily Summary {date}</title></head><body>"
    ));
    out.push_str(&format!("<h1>📰 Daily Summary - {date}</h1>"));
    for a in articles {
        let title = html_escape::encode_text(&a.title);
        let summary = html_escape::encode_text(&a.summary);
        let link = html_escape::encode_double_quoted_attribute(&a.link);
        out.push_str(&format!("<h2><a href=\"{link}\">{title}</a></h2>"));
        out.push_str(&format!("<p>{summary}</p>"));
        out.push_str(&format!(
            "<p><em>{}</em> — score {:.2}</p>",
            html_escape::encode_text(&a.category),
            a.score
        ));
    }
    out.push_str("</body></html>");
    out
}

/// Write both renderings under `dir` (created if absent) and return the two
/// file paths. Callers must not invoke this with an empty list; a run with
/// no surviving articles produces no files at all.
pub fn write_digest(dir: &Path, articles: &[ProcessedArticle]) -> Result<(PathBuf, PathBuf)> {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let md_path = dir.join(format!("resumen_{date}.md"));
    fs::write(&md_path, render_markdown(&date, articles))
        .with_context(|| format!("writing {}", md_path.display()))?;

    let html_path = dir.join(format!("resumen_{date}.html"));
    fs::write(&html_path, render_html(&date, articles))
        .with_context(|| format!("writing {}", html_path.display()))?;

    info!(md = %md_path.display(), html = %html_path.display(), "digest written");
    Ok((md_path, html_path))
}
