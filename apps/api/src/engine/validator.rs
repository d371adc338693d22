//! Template Validator — structural checks run before any render and on save.
//!
//! Errors block rendering:
//! - a section marked `isRequired` with no content and no blocks
//! - two sections sharing an id
//!
//! Warnings only flag author intent gaps:
//! - a `required` placeholder without a `defaultValue`
//! - a `{{token}}` used in a section but never declared (orphan)
//! - a section kind the renderer does not know

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::placeholders::extract_placeholder_keys;
use crate::models::template::{BlockKind, Section, SectionKind, Template};

/// Namespaces injected at render time; never reported as orphans.
const BUILT_IN_NAMESPACES: &[&str] = &["company", "salary"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    RequiredSection,
    DuplicateSectionId,
    RequiredPlaceholderDefault,
    OrphanedPlaceholder,
    UnsupportedSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub rule: ValidationRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Every error message, joined for logs and error responses.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn validate(template: &Template) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let sections = &template.content.sections;

    let mut seen_ids = HashSet::new();
    for section in sections {
        if !seen_ids.insert(section.id.as_str()) {
            errors.push(ValidationIssue {
                rule: ValidationRule::DuplicateSectionId,
                section_id: Some(section.id.clone()),
                placeholder: None,
                message: format!("Duplicate section id '{}'", section.id),
            });
        }

        if section.metadata.is_required && !section.has_content() {
            errors.push(ValidationIssue {
                rule: ValidationRule::RequiredSection,
                section_id: Some(section.id.clone()),
                placeholder: None,
                message: format!("Required section '{}' has no content", section.id),
            });
        }

        if let SectionKind::Unsupported(kind) = &section.kind {
            warnings.push(ValidationIssue {
                rule: ValidationRule::UnsupportedSection,
                section_id: Some(section.id.clone()),
                placeholder: None,
                message: format!(
                    "Section '{}' has unsupported type '{kind}' and will render as a marker",
                    section.id
                ),
            });
        }
    }

    let global_defs = &template.content.placeholders;
    let local_defs = sections.iter().flat_map(|s| s.placeholders.iter());
    for def in global_defs.iter().chain(local_defs) {
        if def.required && def.default_value.is_none() {
            warnings.push(ValidationIssue {
                rule: ValidationRule::RequiredPlaceholderDefault,
                section_id: None,
                placeholder: Some(def.key.clone()),
                message: format!(
                    "Required placeholder '{}' has no default value",
                    def.key
                ),
            });
        }
    }

    let declared: HashSet<&str> = global_defs.iter().map(|d| d.key.as_str()).collect();
    for section in sections {
        let local: HashSet<&str> = section.placeholders.iter().map(|d| d.key.as_str()).collect();
        for key in section_placeholder_keys(section) {
            if declared.contains(key.as_str()) || local.contains(key.as_str()) || is_built_in(&key) {
                continue;
            }
            warnings.push(ValidationIssue {
                rule: ValidationRule::OrphanedPlaceholder,
                section_id: Some(section.id.clone()),
                message: format!(
                    "Placeholder '{{{{{key}}}}}' in section '{}' is not declared",
                    section.id
                ),
                placeholder: Some(key),
            });
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn is_built_in(key: &str) -> bool {
    let root = key.split('.').next().unwrap_or(key);
    BUILT_IN_NAMESPACES.contains(&root) && key.contains('.')
}

/// Every placeholder key a section references, deduplicated in first-seen order:
/// title, content (any string inside it), placeholder blocks, nested conditionals.
pub fn section_placeholder_keys(section: &Section) -> Vec<String> {
    let mut keys = Vec::new();
    let mut push = |key: String| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };

    if let Some(title) = &section.title {
        extract_placeholder_keys(title).into_iter().for_each(&mut push);
    }
    let mut strings = Vec::new();
    collect_strings(&section.content, &mut strings);
    for s in strings {
        extract_placeholder_keys(s).into_iter().for_each(&mut push);
    }
    for block in &section.blocks {
        if block.kind == BlockKind::Placeholder {
            if let Some(key) = block.key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
                push(key.to_string());
            }
        }
    }
    for nested in &section.conditional_sections {
        extract_placeholder_keys(&nested.content)
            .into_iter()
            .for_each(&mut push);
    }
    keys
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{
        ContentBlock, Formatting, PlaceholderDefinition, PlaceholderType, SectionMetadata,
        TemplateContent,
    };
    use serde_json::json;

    fn template(sections: serde_json::Value, placeholders: serde_json::Value) -> Template {
        serde_json::from_value(json!({
            "id": "6f1c2d9e-8a55-4c1e-9d8e-3c9f1a2b4d10",
            "name": "Engineering offer",
            "content": { "sections": sections, "placeholders": placeholders }
        }))
        .unwrap()
    }

    fn rules(issues: &[ValidationIssue]) -> Vec<ValidationRule> {
        issues.iter().map(|i| i.rule).collect()
    }

    #[test]
    fn test_valid_template() {
        let t = template(
            json!([{ "id": "greeting", "type": "paragraph", "content": "Dear {{candidate_name}}",
                     "metadata": { "isRequired": true, "order": 1 } }]),
            json!([{ "key": "candidate_name", "required": true, "defaultValue": "Candidate" }]),
        );
        let report = validate(&t);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_required_section_without_content_is_error() {
        let t = template(
            json!([{ "id": "greeting", "type": "paragraph", "content": "  ",
                     "metadata": { "isRequired": true } }]),
            json!([]),
        );
        let report = validate(&t);
        assert!(!report.is_valid);
        assert_eq!(rules(&report.errors), vec![ValidationRule::RequiredSection]);
        assert_eq!(report.summary(), "Required section 'greeting' has no content");
    }

    #[test]
    fn test_required_data_driven_sections_need_no_content() {
        let t = template(
            json!([
                { "id": "pay", "type": "salary_table", "metadata": { "isRequired": true } },
                { "id": "co", "type": "company_info", "metadata": { "isRequired": true } },
                { "id": "perks", "type": "benefits_table", "metadata": { "isRequired": true } },
                { "id": "terms", "type": "terms_conditions", "metadata": { "isRequired": true } },
                { "id": "legal", "type": "compliance_section", "metadata": { "isRequired": true } }
            ]),
            json!([]),
        );
        let report = validate(&t);
        assert!(report.is_valid, "{}", report.summary());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_required_section_with_blocks_only_is_valid() {
        let mut t = template(json!([]), json!([]));
        t.content = TemplateContent {
            sections: vec![Section {
                id: "body".to_string(),
                kind: SectionKind::RichText,
                title: None,
                content: Value::Null,
                blocks: vec![ContentBlock {
                    kind: BlockKind::Text,
                    text: Some("Welcome".to_string()),
                    key: None,
                    src: None,
                    alt: None,
                    formatting: Formatting::default(),
                }],
                formatting: Formatting::default(),
                styling: None,
                placeholders: vec![],
                conditional_sections: vec![],
                condition: None,
                company_conditions: vec![],
                metadata: SectionMetadata {
                    is_required: true,
                    order: 0,
                },
            }],
            ..Default::default()
        };
        assert!(validate(&t).is_valid);
    }

    #[test]
    fn test_orphaned_placeholder_is_warning_not_error() {
        let t = template(
            json!([{ "id": "greeting", "type": "paragraph",
                     "content": "Dear {{candidate_name}}, joining {{joining_date}}" }]),
            json!([{ "key": "candidate_name" }]),
        );
        let report = validate(&t);
        assert!(report.is_valid);
        assert_eq!(rules(&report.warnings), vec![ValidationRule::OrphanedPlaceholder]);
        assert_eq!(report.warnings[0].placeholder.as_deref(), Some("joining_date"));
        assert_eq!(report.warnings[0].section_id.as_deref(), Some("greeting"));
    }

    #[test]
    fn test_section_local_and_built_in_keys_are_not_orphans() {
        let t = template(
            json!([{
                "id": "terms",
                "type": "list",
                "content": { "items": ["{{company.name}} pays {{salary.ctc.annual}}", "{{bond_years}} years"] },
                "placeholders": [{ "key": "bond_years", "type": "number" }]
            }]),
            json!([]),
        );
        let report = validate(&t);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_bare_namespace_token_is_still_orphan() {
        let t = template(
            json!([{ "id": "p", "type": "paragraph", "content": "{{company}}" }]),
            json!([]),
        );
        assert_eq!(rules(&validate(&t).warnings), vec![ValidationRule::OrphanedPlaceholder]);
    }

    #[test]
    fn test_required_placeholder_without_default_warns() {
        let mut t = template(json!([]), json!([]));
        t.content.placeholders.push(PlaceholderDefinition {
            key: "joining_date".to_string(),
            label: Some("Joining date".to_string()),
            kind: PlaceholderType::Date,
            required: true,
            default_value: None,
            validation: None,
            category: None,
        });
        let report = validate(&t);
        assert!(report.is_valid);
        assert_eq!(
            rules(&report.warnings),
            vec![ValidationRule::RequiredPlaceholderDefault]
        );
    }

    #[test]
    fn test_duplicate_ids_and_unsupported_kind() {
        let t = template(
            json!([
                { "id": "a", "type": "paragraph", "content": "x" },
                { "id": "a", "type": "signature_block", "content": "y" }
            ]),
            json!([]),
        );
        let report = validate(&t);
        assert!(!report.is_valid);
        assert_eq!(rules(&report.errors), vec![ValidationRule::DuplicateSectionId]);
        assert_eq!(rules(&report.warnings), vec![ValidationRule::UnsupportedSection]);
    }

    #[test]
    fn test_section_keys_cover_all_sources() {
        let t = template(
            json!([{
                "id": "s",
                "type": "rich_text",
                "title": "For {{candidate_name}}",
                "content": [["{{designation}}", "{{candidate_name}}"]],
                "blocks": [
                    { "type": "placeholder", "key": "joining_date" },
                    { "type": "text", "text": "{{literal}}" }
                ],
                "conditionalSections": [{ "content": "Remote from {{city}}" }]
            }]),
            json!([]),
        );
        assert_eq!(
            section_placeholder_keys(&t.content.sections[0]),
            vec!["candidate_name", "designation", "joining_date", "city"]
        );
    }
}
