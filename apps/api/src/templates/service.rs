//! Template service — create, edit (versioned), restore, validate and preview templates.
//!
//! Every write runs the validator first; an invalid template is never persisted.
//! Edits carry the version the editor loaded so concurrent saves surface as conflicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::engine::renderer::{render, RenderedDocument};
use crate::engine::salary::{calculate, validate_salary_data, SalaryBreakdown, SalaryValidation};
use crate::engine::validator::{validate, ValidationReport};
use crate::engine::versioning::{apply_content_change, restore_version};
use crate::errors::AppError;
use crate::models::company::CompanyPolicy;
use crate::models::template::{
    Template, TemplateContent, VersionEntry, VersionHistory,
};
use crate::store::OfferStore;

// ────────────────────────────────────────────────────────────────────────────
// Request / response models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub company_type: Option<String>,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub salary_structure_type: Option<String>,
    pub content: TemplateContent,
    #[serde(default)]
    pub max_versions: Option<usize>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    /// The version the editor loaded. Omit to overwrite whatever is current.
    #[serde(default)]
    pub expected_version: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub content: Option<TemplateContent>,
    #[serde(default)]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    #[serde(default)]
    pub changed_by: Option<String>,
}

/// Render input shared by preview and salary calculation.
/// `companyId` wins over an inline `companyPolicy`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInput {
    #[serde(default)]
    pub candidate_data: Value,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub company_policy: Option<CompanyPolicy>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub template: Template,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub document: RenderedDocument,
    pub salary_validation: SalaryValidation,
    pub warnings: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryResponse {
    pub breakdown: SalaryBreakdown,
    pub validation: SalaryValidation,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

fn ensure_valid(template: &Template) -> Result<ValidationReport, AppError> {
    let report = validate(template);
    if report.is_valid {
        Ok(report)
    } else {
        Err(AppError::InvalidTemplate(report))
    }
}

pub async fn create_template(
    store: &dyn OfferStore,
    req: CreateTemplateRequest,
    default_max_versions: usize,
    now: DateTime<Utc>,
) -> Result<TemplateResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Template name is required".to_string()));
    }

    let mut template = Template {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        version: 1,
        is_active: true,
        category: req.category,
        industry: req.industry.unwrap_or_else(|| "Universal".to_string()),
        company_type: req.company_type.unwrap_or_else(|| "universal".to_string()),
        department_id: req.department_id,
        designation: req.designation,
        salary_structure_type: req.salary_structure_type,
        content: req.content,
        version_history: VersionHistory::default(),
        max_versions: req.max_versions.unwrap_or(default_max_versions),
        created_by: req.created_by,
        created_at: now,
        updated_at: now,
    };
    let validation = ensure_valid(&template)?;

    template.version_history.push_bounded(
        VersionEntry {
            version: 1,
            content: template.content.clone(),
            changed_by: template.created_by.clone(),
            changed_at: now,
        },
        template.max_versions,
    );

    store.insert_template(&template).await?;
    info!("Created template {} '{}'", template.id, template.name);

    Ok(TemplateResponse {
        template,
        validation,
    })
}

pub async fn get_template(store: &dyn OfferStore, id: Uuid) -> Result<Template, AppError> {
    store
        .fetch_template(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))
}

pub async fn update_template(
    store: &dyn OfferStore,
    id: Uuid,
    req: UpdateTemplateRequest,
    now: DateTime<Utc>,
) -> Result<TemplateResponse, AppError> {
    let mut template = get_template(store, id).await?;
    let loaded_version = template.version;

    if let Some(expected) = req.expected_version {
        if expected != loaded_version {
            return Err(AppError::Conflict(format!(
                "Template {id} is at version {loaded_version}, not {expected}"
            )));
        }
    }

    let mut touched = false;
    if let Some(name) = req.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::Validation("Template name cannot be empty".to_string()));
        }
        touched |= name != template.name;
        template.name = name;
    }
    if let Some(active) = req.is_active {
        touched |= active != template.is_active;
        template.is_active = active;
    }
    if let Some(content) = req.content {
        touched |= apply_content_change(&mut template, content, req.changed_by.as_deref(), now);
    }

    let validation = ensure_valid(&template)?;
    if touched {
        template.updated_at = now;
        store.save_template(&template, loaded_version).await?;
        info!("Saved template {} at version {}", template.id, template.version);
    }

    Ok(TemplateResponse {
        template,
        validation,
    })
}

pub async fn template_history(
    store: &dyn OfferStore,
    id: Uuid,
) -> Result<Vec<VersionEntry>, AppError> {
    let template = get_template(store, id).await?;
    // Newest first for the editor.
    Ok(template.version_history.iter().rev().cloned().collect())
}

pub async fn restore_template_version(
    store: &dyn OfferStore,
    id: Uuid,
    version: i32,
    changed_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TemplateResponse, AppError> {
    let mut template = get_template(store, id).await?;
    let loaded_version = template.version;

    if restore_version(&mut template, version, changed_by, now)? {
        store.save_template(&template, loaded_version).await?;
        info!(
            "Restored template {} to v{} content as v{}",
            template.id, version, template.version
        );
    }

    Ok(TemplateResponse {
        validation: validate(&template),
        template,
    })
}

pub async fn validate_template(store: &dyn OfferStore, id: Uuid) -> Result<ValidationReport, AppError> {
    let template = get_template(store, id).await?;
    Ok(validate(&template))
}

/// Looks up the company policy for a render. A referenced company that does
/// not exist fails the operation; no reference at all means default policy.
pub async fn resolve_policy(
    store: &dyn OfferStore,
    company_id: Option<Uuid>,
    inline: Option<CompanyPolicy>,
) -> Result<Option<CompanyPolicy>, AppError> {
    match company_id {
        Some(cid) => {
            let mut policy = store
                .fetch_company(cid)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Company {cid} not found")))?;
            policy.company_id.get_or_insert(cid);
            Ok(Some(policy))
        }
        None => Ok(inline),
    }
}

/// Renders a stored template against sample data. Salary problems are reported,
/// not enforced, so partial data can still be previewed.
pub async fn preview_template(
    store: &dyn OfferStore,
    id: Uuid,
    input: RenderInput,
) -> Result<PreviewResponse, AppError> {
    let template = get_template(store, id).await?;
    let policy = resolve_policy(store, input.company_id, input.company_policy).await?;

    let document = render(&template, &input.candidate_data, policy.as_ref())?;
    Ok(PreviewResponse {
        document,
        salary_validation: validate_salary_data(&input.candidate_data),
        warnings: validate(&template),
    })
}

pub async fn calculate_salary(
    store: &dyn OfferStore,
    input: RenderInput,
) -> Result<SalaryResponse, AppError> {
    let policy = resolve_policy(store, input.company_id, input.company_policy)
        .await?
        .unwrap_or_default();
    Ok(SalaryResponse {
        breakdown: calculate(&input.candidate_data, &policy),
        validation: validate_salary_data(&input.candidate_data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryOfferStore;
    use chrono::Duration;
    use serde_json::json;

    fn content(text: &str) -> TemplateContent {
        serde_json::from_value(json!({
            "sections": [{
                "id": "greeting",
                "type": "paragraph",
                "content": text,
                "metadata": { "isRequired": true, "order": 1 }
            }],
            "placeholders": [{ "key": "candidate_name" }]
        }))
        .unwrap()
    }

    fn create_request(max_versions: Option<usize>) -> CreateTemplateRequest {
        CreateTemplateRequest {
            name: "Engineering Offer".to_string(),
            category: Some("full_time".to_string()),
            industry: None,
            company_type: None,
            department_id: None,
            designation: Some("Software Engineer".to_string()),
            salary_structure_type: None,
            content: content("Dear {{candidate_name}},"),
            max_versions,
            created_by: Some("hr@acme.example".to_string()),
        }
    }

    fn edit(text: &str, expected: Option<i32>) -> UpdateTemplateRequest {
        UpdateTemplateRequest {
            expected_version: expected,
            name: None,
            is_active: None,
            content: Some(content(text)),
            changed_by: Some("editor".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let store = MemoryOfferStore::default();
        let created = create_template(&store, create_request(None), 10, Utc::now())
            .await
            .unwrap();
        assert_eq!(created.template.version, 1);
        assert_eq!(created.template.industry, "Universal");
        assert_eq!(created.template.version_history.len(), 1);
        assert!(created.validation.is_valid);

        let fetched = get_template(&store, created.template.id).await.unwrap();
        assert_eq!(fetched, created.template);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_template() {
        let store = MemoryOfferStore::default();
        let mut req = create_request(None);
        req.content = content("   ");
        let err = create_template(&store, req, 10, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTemplate(_)));
    }

    #[tokio::test]
    async fn test_fifteen_saves_through_service_keep_ten() {
        let store = MemoryOfferStore::default();
        let start = Utc::now();
        let id = create_template(&store, create_request(Some(10)), 10, start)
            .await
            .unwrap()
            .template
            .id;

        for i in 1..=15 {
            let expected = get_template(&store, id).await.unwrap().version;
            update_template(
                &store,
                id,
                edit(&format!("Dear {{{{candidate_name}}}}, revision {i}"), Some(expected)),
                start + Duration::minutes(i),
            )
            .await
            .unwrap();
        }

        let template = get_template(&store, id).await.unwrap();
        assert_eq!(template.version, 16);
        let history = template_history(&store, id).await.unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history.first().map(|e| e.version), Some(16));
        assert_eq!(history.last().map(|e| e.version), Some(7));
    }

    #[tokio::test]
    async fn test_stale_edit_conflicts() {
        let store = MemoryOfferStore::default();
        let id = create_template(&store, create_request(None), 10, Utc::now())
            .await
            .unwrap()
            .template
            .id;
        update_template(&store, id, edit("Hello {{candidate_name}}", Some(1)), Utc::now())
            .await
            .unwrap();
        let err = update_template(&store, id, edit("Hi {{candidate_name}}", Some(1)), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unchanged_content_keeps_version() {
        let store = MemoryOfferStore::default();
        let id = create_template(&store, create_request(None), 10, Utc::now())
            .await
            .unwrap()
            .template
            .id;
        let resp = update_template(&store, id, edit("Dear {{candidate_name}},", None), Utc::now())
            .await
            .unwrap();
        assert_eq!(resp.template.version, 1);
    }

    #[tokio::test]
    async fn test_restore_version() {
        let store = MemoryOfferStore::default();
        let id = create_template(&store, create_request(None), 10, Utc::now())
            .await
            .unwrap()
            .template
            .id;
        update_template(&store, id, edit("Changed {{candidate_name}}", None), Utc::now())
            .await
            .unwrap();

        let restored = restore_template_version(&store, id, 1, Some("admin"), Utc::now())
            .await
            .unwrap();
        assert_eq!(restored.template.version, 3);
        assert_eq!(restored.template.content, content("Dear {{candidate_name}},"));

        let missing = restore_template_version(&store, id, 99, None, Utc::now()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_preview_with_stored_company() {
        let store = MemoryOfferStore::default();
        let company_id = Uuid::new_v4();
        store
            .upsert_company(
                company_id,
                &CompanyPolicy {
                    name: Some("Acme Labs".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut req = create_request(None);
        req.content = content("Dear {{candidate_name}}, welcome to {{company.name}}.");
        let id = create_template(&store, req, 10, Utc::now())
            .await
            .unwrap()
            .template
            .id;

        let preview = preview_template(
            &store,
            id,
            RenderInput {
                candidate_data: json!({ "candidate_name": "Jane" }),
                company_id: Some(company_id),
                company_policy: None,
            },
        )
        .await
        .unwrap();
        assert!(preview
            .document
            .plain_text
            .contains("Dear Jane, welcome to Acme Labs."));
        assert!(!preview.salary_validation.is_valid);
    }

    #[tokio::test]
    async fn test_unknown_company_fails() {
        let store = MemoryOfferStore::default();
        let result = calculate_salary(
            &store,
            RenderInput {
                candidate_data: json!({ "base_salary": 600000 }),
                company_id: Some(Uuid::new_v4()),
                company_policy: None,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_calculate_salary_inline_policy() {
        let store = MemoryOfferStore::default();
        let resp = calculate_salary(
            &store,
            RenderInput {
                candidate_data: json!({ "base_salary": 600000 }),
                company_id: None,
                company_policy: Some(CompanyPolicy {
                    company_type: Some("mnc".to_string()),
                    ..Default::default()
                }),
            },
        )
        .await
        .unwrap();
        assert!(resp.validation.is_valid);
        assert_eq!(resp.breakdown.hra.annual, 120000.0);
    }
}
