//! Template Engine — validate → order sections → render each → wrap in the document shell.
//!
//! `render` is pure. `generate_offer` adds a salary-data gate and snapshots
//! everything the offer needs so it never has to be recomputed later.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::context::RenderContext;
use crate::engine::salary::validate_salary_data;
use crate::engine::sections::render_section;
use crate::engine::style::{document_shell, EffectiveStyling};
use crate::engine::validator::{section_placeholder_keys, validate};
use crate::engine::EngineError;
use crate::models::company::{CompanyPolicy, CompanySnapshot};
use crate::models::offer::{GeneratedOffer, OfferStatus, OfferTracking, RenderedContent, StatusChange};
use crate::models::template::{Section, Template};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub html: String,
    pub plain_text: String,
    /// Every placeholder key the template references or declares, deduplicated.
    pub placeholders: Vec<String>,
}

pub fn render(
    template: &Template,
    candidate: &Value,
    policy: Option<&CompanyPolicy>,
) -> Result<RenderedDocument, EngineError> {
    ensure_valid(template)?;
    let ctx = RenderContext::new(candidate, policy);
    Ok(render_with_context(template, &ctx, policy))
}

/// Aborts with every failing rule; no partial rendering of an invalid template.
fn ensure_valid(template: &Template) -> Result<(), EngineError> {
    let report = validate(template);
    if report.is_valid {
        return Ok(());
    }
    warn!(
        "Template {} v{} failed validation: {}",
        template.id,
        template.version,
        report.summary()
    );
    Err(EngineError::InvalidTemplate(report))
}

fn render_with_context(
    template: &Template,
    ctx: &RenderContext,
    policy: Option<&CompanyPolicy>,
) -> RenderedDocument {
    let mut ordered: Vec<&Section> = template.content.sections.iter().collect();
    ordered.sort_by_key(|s| s.metadata.order);

    let mut html_parts = Vec::new();
    let mut text_parts = Vec::new();
    for section in ordered {
        let rendered = render_section(section, ctx);
        if rendered.is_empty() {
            debug!("Section '{}' rendered nothing", section.id);
            continue;
        }
        html_parts.push(rendered.html);
        if !rendered.plain_text.is_empty() {
            text_parts.push(rendered.plain_text);
        }
    }

    let styling = EffectiveStyling::resolve(
        &template.content.global_styling,
        policy.map(|p| &p.branding),
    );
    let html = document_shell(&template.name, &html_parts.join("\n"), &styling);

    RenderedDocument {
        html,
        plain_text: text_parts.join("\n\n"),
        placeholders: collect_placeholder_keys(template),
    }
}

/// Keys referenced in sections (document order) followed by any declared-only keys.
pub fn collect_placeholder_keys(template: &Template) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let referenced = template
        .content
        .sections
        .iter()
        .flat_map(section_placeholder_keys);
    let declared = template
        .content
        .placeholders
        .iter()
        .chain(template.content.sections.iter().flat_map(|s| s.placeholders.iter()))
        .map(|d| d.key.trim().to_string());

    for key in referenced.chain(declared) {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Renders the template for one candidate and snapshots the result as a draft offer.
pub fn generate_offer(
    template: &Template,
    candidate: &Value,
    policy: Option<&CompanyPolicy>,
    created_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<GeneratedOffer, EngineError> {
    let salary_check = validate_salary_data(candidate);
    if !salary_check.is_valid {
        return Err(EngineError::InvalidSalaryData(salary_check.errors));
    }

    ensure_valid(template)?;

    // One context: the stored breakdown is the one the salary table rendered.
    let ctx = RenderContext::new(candidate, policy);
    let document = render_with_context(template, &ctx, policy);
    let RenderContext { policy, salary, .. } = ctx;

    let offer = GeneratedOffer {
        id: Uuid::new_v4(),
        template_id: template.id,
        template_version: template.version,
        candidate_data: candidate.clone(),
        company_data: CompanySnapshot::capture(&policy),
        salary_breakdown: salary,
        rendered_content: RenderedContent {
            html: document.html,
            plain_text: document.plain_text,
        },
        placeholders: document.placeholders,
        status: OfferStatus::Draft,
        status_history: vec![StatusChange {
            status: OfferStatus::Draft,
            changed_at: now,
            changed_by: created_by.map(str::to_string),
            note: None,
        }],
        tracking: OfferTracking::default(),
        created_by: created_by.map(str::to_string),
        created_at: now,
        updated_at: now,
    };

    info!(
        "Generated offer {} from template {} v{} (ctc={})",
        offer.id, offer.template_id, offer.template_version, offer.salary_breakdown.ctc.annual
    );
    Ok(offer)
}
