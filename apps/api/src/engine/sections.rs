//! Section Renderer — turns one template section into an (HTML, plain text) pair.
//!
//! Dispatch goes through a table of `SectionKind → handler` built once. Adding a
//! section kind means adding one handler and one table entry.
//!
//! Gating happens before dispatch:
//! - `condition` (any kind, normally `conditional`) must pass
//! - company-branded kinds also require every `companyConditions` entry to pass
//!
//! A gated-out section renders nothing at all. An unsupported kind renders a
//! visible marker so one malformed section never aborts the document.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::warn;

use crate::engine::conditions::{evaluate, evaluate_all};
use crate::engine::context::RenderContext;
use crate::engine::placeholders::{display_value, replace_placeholders, resolve_display};
use crate::engine::salary::{format_currency, number_at, SalaryComponent};
use crate::engine::style::{escape_html, style_attr};
use crate::models::company::BenefitKind;
use crate::models::template::{BlockKind, ContentBlock, Section, SectionKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedSection {
    pub html: String,
    pub plain_text: String,
}

impl RenderedSection {
    fn new(html: String, plain_text: String) -> Self {
        Self { html, plain_text }
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty() && self.plain_text.is_empty()
    }
}

type SectionHandler = fn(&Section, &RenderContext) -> RenderedSection;

static HANDLERS: Lazy<HashMap<SectionKind, SectionHandler>> = Lazy::new(|| {
    let mut table: HashMap<SectionKind, SectionHandler> = HashMap::new();
    table.insert(SectionKind::Header, render_header);
    table.insert(SectionKind::Paragraph, render_paragraph);
    table.insert(SectionKind::RichText, render_rich_text);
    table.insert(SectionKind::Table, render_table);
    table.insert(SectionKind::List, render_bullet_list);
    table.insert(SectionKind::DocumentList, render_document_list);
    table.insert(SectionKind::SalaryTable, render_salary_table);
    table.insert(SectionKind::Conditional, render_conditional);
    table.insert(SectionKind::CompanyInfo, render_company_info);
    table.insert(SectionKind::BenefitsTable, render_benefits_table);
    table.insert(SectionKind::TermsConditions, render_terms_conditions);
    table.insert(SectionKind::ComplianceSection, render_compliance);
    table
});

/// Renders one section. Pure function of its inputs.
pub fn render_section(section: &Section, ctx: &RenderContext) -> RenderedSection {
    if !evaluate(section.condition.as_ref(), &ctx.data) {
        return RenderedSection::default();
    }
    if section.kind.is_company_branded() && !evaluate_all(&section.company_conditions, &ctx.data)
    {
        return RenderedSection::default();
    }

    let body = match HANDLERS.get(&section.kind) {
        Some(handler) => handler(section, ctx),
        None => {
            warn!(
                "Section '{}' has unsupported type '{}', rendering marker",
                section.id,
                section.kind.as_str()
            );
            let marker = format!("[Unsupported section type: {}]", section.kind.as_str());
            RenderedSection::new(
                format!("<div class=\"unsupported-section\">{}</div>", escape_html(&marker)),
                marker,
            )
        }
    };

    let nested = render_nested_conditionals(section, ctx);
    if body.is_empty() && nested.is_empty() {
        return RenderedSection::default();
    }

    let mut html = format!(
        "<section class=\"offer-section section-{}\" data-section-id=\"{}\">\n",
        escape_html(section.kind.as_str()),
        escape_html(&section.id)
    );
    let mut plain_parts: Vec<String> = Vec::new();

    if let Some(title) = section_title(section, ctx) {
        html.push_str(&format!(
            "<h3 class=\"section-title\">{}</h3>\n",
            escape_html(&title)
        ));
        plain_parts.push(title);
    }
    for part in [body, nested] {
        if part.is_empty() {
            continue;
        }
        html.push_str(&part.html);
        html.push('\n');
        if !part.plain_text.is_empty() {
            plain_parts.push(part.plain_text);
        }
    }
    html.push_str("</section>");

    RenderedSection::new(html, plain_parts.join("\n"))
}

/// Explicit titles are placeholder-substituted; company-branded kinds fall back
/// to a standard heading. Headers never get a separate title.
fn section_title(section: &Section, ctx: &RenderContext) -> Option<String> {
    if section.kind == SectionKind::Header {
        return None;
    }
    let explicit = section
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| replace_placeholders(t, &ctx.data));
    explicit.or_else(|| {
        let fallback = match section.kind {
            SectionKind::BenefitsTable => "Benefits",
            SectionKind::TermsConditions => "Terms and Conditions",
            SectionKind::ComplianceSection => "Compliance",
            _ => return None,
        };
        Some(fallback.to_string())
    })
}

fn render_nested_conditionals(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let mut html = Vec::new();
    let mut plain = Vec::new();
    for nested in &section.conditional_sections {
        if !evaluate(nested.condition.as_ref(), &ctx.data) {
            continue;
        }
        let text = replace_placeholders(&nested.content, &ctx.data);
        if text.trim().is_empty() {
            continue;
        }
        html.push(format!("<p class=\"conditional-content\">{}</p>", text_to_html(&text)));
        plain.push(text);
    }
    RenderedSection::new(html.join("\n"), plain.join("\n\n"))
}

// ────────────────────────────────────────────────────────────────────────────
// Content helpers
// ────────────────────────────────────────────────────────────────────────────

fn text_to_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Section content as text: strings verbatim, arrays joined by newlines, other values displayed.
fn content_text(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("intro"))
            .map(content_text)
            .unwrap_or_default(),
        other => display_value(other),
    }
}

/// Items of a list-shaped content: an array, or an object with `items`.
fn content_items(content: &Value) -> Vec<String> {
    let items = match content {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };
    items
        .iter()
        .map(display_value)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Optional free-text intro for company-branded sections: a string, or `{ "intro": ... }`.
fn content_intro(content: &Value, ctx: &RenderContext) -> Option<String> {
    let intro = match content {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("intro").and_then(Value::as_str),
        _ => None,
    }?;
    let text = replace_placeholders(intro, &ctx.data);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn paragraph(text: &str, class: &str) -> RenderedSection {
    RenderedSection::new(
        format!("<p class=\"{class}\">{}</p>", text_to_html(text)),
        text.to_string(),
    )
}

fn join(parts: Vec<RenderedSection>) -> RenderedSection {
    let parts: Vec<RenderedSection> = parts.into_iter().filter(|p| !p.is_empty()).collect();
    RenderedSection::new(
        parts
            .iter()
            .map(|p| p.html.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        parts
            .iter()
            .map(|p| p.plain_text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Text handlers
// ────────────────────────────────────────────────────────────────────────────

fn render_header(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let text = replace_placeholders(&content_text(&section.content), &ctx.data);
    if text.trim().is_empty() {
        return RenderedSection::default();
    }
    let level = section.formatting.level.unwrap_or(1).clamp(1, 6);
    RenderedSection::new(
        format!(
            "<h{level} class=\"offer-header\"{}>{}</h{level}>",
            style_attr(&section.formatting),
            text_to_html(&text)
        ),
        text,
    )
}

fn render_paragraph(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let text = replace_placeholders(&content_text(&section.content), &ctx.data);
    if text.trim().is_empty() {
        return RenderedSection::default();
    }
    RenderedSection::new(
        format!(
            "<p{}>{}</p>",
            style_attr(&section.formatting),
            text_to_html(&text)
        ),
        text,
    )
}

fn render_rich_text(section: &Section, ctx: &RenderContext) -> RenderedSection {
    if section.blocks.is_empty() {
        return render_paragraph(section, ctx);
    }

    let mut html = String::new();
    let mut plain = String::new();
    for block in &section.blocks {
        let (block_html, block_plain) = render_block(block, ctx);
        html.push_str(&block_html);
        plain.push_str(&block_plain);
    }
    if plain.trim().is_empty() && !html.contains("<img") {
        return RenderedSection::default();
    }
    RenderedSection::new(
        format!(
            "<div class=\"rich-text\"{}>{}</div>",
            style_attr(&section.formatting),
            html
        ),
        plain,
    )
}

/// Text blocks are literal. Placeholder blocks resolve `key` and fall back to
/// the bare key. Breaks contribute a newline only. Images have no text.
fn render_block(block: &ContentBlock, ctx: &RenderContext) -> (String, String) {
    let styled = |text: &str, class: Option<&str>| -> String {
        let style = style_attr(&block.formatting);
        match (class, style.is_empty()) {
            (None, true) => escape_html(text),
            (None, false) => format!("<span{style}>{}</span>", escape_html(text)),
            (Some(class), _) => format!("<span class=\"{class}\"{style}>{}</span>", escape_html(text)),
        }
    };

    match block.kind {
        BlockKind::Text => {
            let text = block.text.clone().unwrap_or_default();
            (styled(&text, None), text)
        }
        BlockKind::Placeholder => match block.key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                let value = resolve_display(&ctx.data, key).unwrap_or_else(|| key.to_string());
                (styled(&value, Some("placeholder-value")), value)
            }
            _ => (String::new(), String::new()),
        },
        BlockKind::Break => ("<br>".to_string(), "\n".to_string()),
        BlockKind::Image => match &block.src {
            Some(src) => (
                format!(
                    "<img src=\"{}\" alt=\"{}\"{}>",
                    escape_html(src),
                    escape_html(block.alt.as_deref().unwrap_or("")),
                    style_attr(&block.formatting)
                ),
                String::new(),
            ),
            None => (String::new(), String::new()),
        },
    }
}

fn render_conditional(section: &Section, ctx: &RenderContext) -> RenderedSection {
    // The gate in `render_section` has already evaluated `section.condition`.
    if section.blocks.is_empty() {
        render_paragraph(section, ctx)
    } else {
        render_rich_text(section, ctx)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tables and lists
// ────────────────────────────────────────────────────────────────────────────

fn table_rows(content: &Value) -> Vec<Vec<Value>> {
    let as_rows = |rows: &Value| -> Vec<Vec<Value>> {
        rows.as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| r.as_array().cloned())
                    .collect()
            })
            .unwrap_or_default()
    };
    match content {
        Value::Array(_) => as_rows(content),
        Value::Object(map) => {
            let mut rows = Vec::new();
            if let Some(headers) = map.get("headers").and_then(Value::as_array) {
                rows.push(headers.clone());
            }
            if let Some(body) = map.get("rows") {
                rows.extend(as_rows(body));
            }
            rows
        }
        _ => Vec::new(),
    }
}

fn render_table(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let rows: Vec<Vec<String>> = table_rows(&section.content)
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| replace_placeholders(&display_value(cell), &ctx.data))
                .collect()
        })
        .collect();
    let Some((headers, body)) = rows.split_first() else {
        return RenderedSection::default();
    };

    let mut html = format!("<table{}>\n<thead><tr>", style_attr(&section.formatting));
    for cell in headers {
        html.push_str(&format!("<th>{}</th>", escape_html(cell)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in body {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");

    let plain = rows
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n");
    RenderedSection::new(html, plain)
}

fn render_list(items: &[String], ordered: bool, section: &Section) -> RenderedSection {
    if items.is_empty() {
        return RenderedSection::default();
    }
    let tag = if ordered { "ol" } else { "ul" };
    let mut html = format!("<{tag}{}>\n", style_attr(&section.formatting));
    for item in items {
        html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
    }
    html.push_str(&format!("</{tag}>"));

    let plain = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if ordered {
                format!("{}. {item}", i + 1)
            } else {
                format!("• {item}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    RenderedSection::new(html, plain)
}

fn substituted_items(section: &Section, ctx: &RenderContext) -> Vec<String> {
    content_items(&section.content)
        .iter()
        .map(|item| replace_placeholders(item, &ctx.data))
        .collect()
}

fn render_bullet_list(section: &Section, ctx: &RenderContext) -> RenderedSection {
    render_list(&substituted_items(section, ctx), false, section)
}

fn render_document_list(section: &Section, ctx: &RenderContext) -> RenderedSection {
    render_list(&substituted_items(section, ctx), true, section)
}

// ────────────────────────────────────────────────────────────────────────────
// Salary table
// ────────────────────────────────────────────────────────────────────────────

enum Amount {
    Money(SalaryComponent),
    Text(String),
    Dash,
}

struct MoneyRow {
    label: String,
    amount: Amount,
    total: bool,
}

impl MoneyRow {
    fn money(label: &str, component: SalaryComponent) -> Self {
        Self {
            label: label.to_string(),
            amount: Amount::Money(component),
            total: false,
        }
    }

    fn total(label: &str, component: SalaryComponent) -> Self {
        Self {
            total: true,
            ..Self::money(label, component)
        }
    }
}

/// Component | Monthly | Annual table over already-computed amounts.
fn money_table(caption: &str, rows: &[MoneyRow], currency: &str) -> RenderedSection {
    let mut html = format!(
        "<table class=\"salary-table\">\n<caption>{}</caption>\n<thead><tr><th>Component</th><th>Monthly</th><th>Annual</th></tr></thead>\n<tbody>\n",
        escape_html(caption)
    );
    let mut plain = vec![caption.to_string(), "Component\tMonthly\tAnnual".to_string()];

    for row in rows {
        let (monthly, annual) = match &row.amount {
            Amount::Money(c) => (
                format_currency(c.monthly, currency),
                format_currency(c.annual, currency),
            ),
            Amount::Text(t) => (t.clone(), t.clone()),
            Amount::Dash => ("-".to_string(), "-".to_string()),
        };
        let class = if row.total { " class=\"total\"" } else { "" };
        html.push_str(&format!(
            "<tr{class}><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&row.label),
            escape_html(&monthly),
            escape_html(&annual)
        ));
        plain.push(format!("{}\t{monthly}\t{annual}", row.label));
    }
    html.push_str("</tbody>\n</table>");

    RenderedSection::new(html, plain.join("\n"))
}

/// Presentation over the breakdown computed once for the document.
fn render_salary_table(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let s = &ctx.salary;
    let currency = ctx.currency();

    let incentive = number_at(&ctx.data, "performance_incentive").map(SalaryComponent::from_annual);
    let total_fixed = SalaryComponent::from_annual(
        s.ctc.annual + incentive.map(|c| c.annual).unwrap_or(0.0),
    );

    let fixed_rows = vec![
        MoneyRow::money("Basic Salary", s.basic),
        MoneyRow::money("House Rent Allowance", s.hra),
        MoneyRow::money("Special Allowance", s.special_allowance),
        MoneyRow::money("Statutory Bonus", s.statutory_bonus),
        MoneyRow::total("Gross Salary", s.gross_salary),
        MoneyRow::money("Employer PF Contribution", s.employer_pf),
        MoneyRow::money("Employer ESIC Contribution", s.employer_esic),
        MoneyRow::money("Gratuity", s.gratuity),
        MoneyRow::money("Wellbeing (Insurance)", s.insurance),
        MoneyRow {
            label: "Performance Incentive".to_string(),
            amount: match incentive {
                Some(c) => Amount::Money(c),
                None => Amount::Text("As per company policy".to_string()),
            },
            total: false,
        },
        MoneyRow::total("Total Fixed Remuneration", total_fixed),
    ];

    let mut claimable_rows: Vec<MoneyRow> = s
        .benefits
        .iter()
        .map(|b| MoneyRow::money(&b.name, SalaryComponent::from_annual(b.annual)))
        .collect();
    if claimable_rows.is_empty() {
        claimable_rows.push(MoneyRow {
            label: "No claimable components".to_string(),
            amount: Amount::Dash,
            total: false,
        });
    } else {
        claimable_rows.push(MoneyRow::total(
            "Total Claimable Components",
            s.summary.benefits_value,
        ));
    }

    let take_home = format!(
        "Estimated take-home: {} per month after PF, ESIC and professional tax.",
        format_currency(s.net_take_home.monthly, currency)
    );
    let note = section
        .content
        .get("note")
        .and_then(Value::as_str)
        .map(|n| replace_placeholders(n, &ctx.data))
        .filter(|n| !n.trim().is_empty());

    let mut parts = vec![
        money_table("Fixed Remuneration", &fixed_rows, currency),
        money_table("Claimable Components", &claimable_rows, currency),
        paragraph(&take_home, "salary-note"),
    ];
    if let Some(note) = note {
        parts.push(paragraph(&note, "salary-note"));
    }
    join(parts)
}

// ────────────────────────────────────────────────────────────────────────────
// Company-branded sections
// ────────────────────────────────────────────────────────────────────────────

fn render_company_info(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let policy = &ctx.policy;
    let name = policy.display_name().to_string();
    let mut parts = vec![RenderedSection::new(
        format!("<h2 class=\"company-name\">{}</h2>", escape_html(&name)),
        name,
    )];
    if let Some(address) = policy.address.as_deref().filter(|a| !a.trim().is_empty()) {
        parts.push(paragraph(address, "company-address"));
    }
    if let Some(website) = policy.website.as_deref().filter(|w| !w.trim().is_empty()) {
        parts.push(paragraph(website, "company-website"));
    }
    if let Some(intro) = content_intro(&section.content, ctx) {
        parts.push(paragraph(&intro, "company-intro"));
    }
    RenderedSection {
        html: format!("<div class=\"company-info\">\n{}\n</div>", join(parts.clone()).html),
        plain_text: join(parts).plain_text,
    }
}

fn render_benefits_table(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let currency = ctx.currency();
    let mut parts = Vec::new();
    if let Some(intro) = content_intro(&section.content, ctx) {
        parts.push(paragraph(&intro, "benefits-intro"));
    }

    if ctx.salary.benefits.is_empty() {
        parts.push(paragraph("Benefits as per company policy.", "benefits-default"));
        return join(parts);
    }

    let mut html = String::from(
        "<table class=\"benefits-table\">\n<thead><tr><th>Benefit</th><th>Type</th><th>Annual Value</th><th>Description</th></tr></thead>\n<tbody>\n",
    );
    let mut plain = vec!["Benefit\tType\tAnnual Value\tDescription".to_string()];
    for b in &ctx.salary.benefits {
        let kind = match b.kind {
            BenefitKind::Fixed => "Fixed".to_string(),
            BenefitKind::Percentage => format!("{}% of basic", display_value(&percent(b.value))),
        };
        let annual = format_currency(b.annual, currency);
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&b.name),
            escape_html(&kind),
            escape_html(&annual),
            escape_html(&b.description)
        ));
        plain.push(format!("{}\t{kind}\t{annual}\t{}", b.name, b.description));
    }
    html.push_str("</tbody>\n</table>");
    parts.push(RenderedSection::new(html, plain.join("\n")));
    join(parts)
}

/// Fraction → percentage as a JSON number, rounded to two decimals.
fn percent(fraction: f64) -> Value {
    let pct = (fraction * 10_000.0).round() / 100.0;
    serde_json::Number::from_f64(pct)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn render_terms_conditions(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let mut terms: Vec<String> = Vec::new();
    if let Some(t) = &ctx.policy.employment_terms {
        if let Some(months) = t.probation_months {
            terms.push(format!("Probation period: {months} months"));
        }
        if let Some(days) = t.notice_period_days {
            terms.push(format!("Notice period: {days} days"));
        }
        if let Some(hours) = t.working_hours.as_deref().filter(|h| !h.trim().is_empty()) {
            terms.push(format!("Working hours: {hours}"));
        }
        if let Some(leave) = t.leave_policy.as_deref().filter(|l| !l.trim().is_empty()) {
            terms.push(format!("Leave policy: {leave}"));
        }
        terms.extend(t.additional_terms.iter().cloned());
    }
    terms.extend(content_items(&section.content));
    let terms: Vec<String> = terms
        .iter()
        .map(|t| replace_placeholders(t, &ctx.data))
        .collect();

    let mut parts = Vec::new();
    if let Some(intro) = content_intro(&section.content, ctx) {
        parts.push(paragraph(&intro, "terms-intro"));
    }
    if terms.is_empty() {
        parts.push(paragraph(
            "Employment terms as per company policy.",
            "terms-default",
        ));
    } else {
        parts.push(render_list(&terms, true, section));
    }
    join(parts)
}

fn render_compliance(section: &Section, ctx: &RenderContext) -> RenderedSection {
    let compliance = ctx.policy.compliance.clone().unwrap_or_default();
    let statement = compliance
        .statement
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| {
            "This offer complies with all applicable labour laws and regulations.".to_string()
        });

    let mut parts = Vec::new();
    if let Some(intro) = content_intro(&section.content, ctx) {
        parts.push(paragraph(&intro, "compliance-intro"));
    }
    parts.push(paragraph(
        &replace_placeholders(&statement, &ctx.data),
        "compliance-statement",
    ));
    let mut standards = compliance.standards;
    standards.extend(content_items(&section.content));
    let standards: Vec<String> = standards
        .iter()
        .map(|s| replace_placeholders(s, &ctx.data))
        .collect();
    parts.push(render_list(&standards, false, section));
    join(parts)
}
