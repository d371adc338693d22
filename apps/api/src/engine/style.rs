//! HTML helpers: escaping, inline styles from section formatting, and the document shell.

use crate::models::company::Branding;
use crate::models::template::{Formatting, GlobalStyling};

const DEFAULT_PRIMARY_COLOR: &str = "#1a365d";
const DEFAULT_SECONDARY_COLOR: &str = "#2c5282";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// CSS declarations for `formatting`, in a fixed order so output is deterministic.
pub fn inline_style(formatting: &Formatting) -> String {
    let mut rules: Vec<String> = Vec::new();
    if formatting.bold {
        rules.push("font-weight: bold".to_string());
    }
    if formatting.italic {
        rules.push("font-style: italic".to_string());
    }
    if formatting.underline {
        rules.push("text-decoration: underline".to_string());
    }
    if let Some(size) = &formatting.font_size {
        rules.push(format!("font-size: {size}"));
    }
    if let Some(family) = &formatting.font_family {
        rules.push(format!("font-family: {family}"));
    }
    if let Some(color) = &formatting.color {
        rules.push(format!("color: {color}"));
    }
    if let Some(bg) = &formatting.background_color {
        rules.push(format!("background-color: {bg}"));
    }
    if let Some(align) = &formatting.alignment {
        rules.push(format!("text-align: {align}"));
    }
    rules.join("; ")
}

/// ` style="..."` for `formatting`, or an empty string when nothing is set.
pub fn style_attr(formatting: &Formatting) -> String {
    let style = inline_style(formatting);
    if style.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(&style))
    }
}

/// Document-level styling after company branding is applied over template defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveStyling {
    pub font_family: String,
    pub font_size: String,
    pub line_height: String,
    pub color: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub logo_url: Option<String>,
}

impl EffectiveStyling {
    /// Branding wins over the template's global styling wherever it is set.
    pub fn resolve(global: &GlobalStyling, branding: Option<&Branding>) -> Self {
        let branding = branding.cloned().unwrap_or_default();
        Self {
            font_family: branding
                .font_family
                .unwrap_or_else(|| global.font_family.clone()),
            font_size: global.font_size.clone(),
            line_height: global.line_height.clone(),
            color: global.color.clone(),
            primary_color: branding
                .primary_color
                .or_else(|| global.primary_color.clone())
                .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
            secondary_color: branding
                .secondary_color
                .or_else(|| global.secondary_color.clone())
                .unwrap_or_else(|| DEFAULT_SECONDARY_COLOR.to_string()),
            logo_url: branding.logo_url,
        }
    }
}

/// Wraps rendered section HTML in a complete, self-contained document.
pub fn document_shell(title: &str, body: &str, styling: &EffectiveStyling) -> String {
    let font_family = escape_html(&styling.font_family);
    let font_size = escape_html(&styling.font_size);
    let line_height = escape_html(&styling.line_height);
    let color = escape_html(&styling.color);
    let primary = escape_html(&styling.primary_color);
    let secondary = escape_html(&styling.secondary_color);

    let letterhead = match &styling.logo_url {
        Some(url) => format!(
            "<header class=\"letterhead\"><img class=\"company-logo\" src=\"{}\" alt=\"Company logo\"></header>\n",
            escape_html(url)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: {font_family}; font-size: {font_size}; line-height: {line_height}; color: {color}; margin: 40px; }}
h1, h2, h3, h4, h5, h6 {{ color: {primary}; }}
.section-title {{ color: {secondary}; }}
table {{ border-collapse: collapse; width: 100%; margin: 12px 0; }}
th {{ background-color: {primary}; color: #ffffff; text-align: left; padding: 8px; }}
td {{ border: 1px solid #dddddd; padding: 8px; }}
tr.total td {{ font-weight: bold; }}
.company-logo {{ max-height: 80px; }}
.unsupported-section {{ color: #b91c1c; font-style: italic; }}
</style>
</head>
<body>
<div class="offer-letter">
{letterhead}{body}
</div>
</body>
</html>
"#,
        title = escape_html(title),
    )
}
