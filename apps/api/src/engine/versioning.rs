//! Template versioning — bump the version and snapshot content on every real change.
//!
//! History is bounded at push time: only the newest `max_versions` snapshots are kept.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::EngineError;
use crate::models::template::{Template, TemplateContent, VersionEntry};

/// Applies `content` to `template`. Returns `false` (and changes nothing) when
/// the content is identical to what the template already holds.
pub fn apply_content_change(
    template: &mut Template,
    content: TemplateContent,
    changed_by: Option<&str>,
    now: DateTime<Utc>,
) -> bool {
    if template.content == content {
        return false;
    }

    template.version += 1;
    template.content = content;
    template.updated_at = now;
    template.version_history.push_bounded(
        VersionEntry {
            version: template.version,
            content: template.content.clone(),
            changed_by: changed_by.map(str::to_string),
            changed_at: now,
        },
        template.max_versions,
    );

    info!(
        "Template {} advanced to version {} ({} snapshots retained)",
        template.id,
        template.version,
        template.version_history.len()
    );
    true
}

/// Re-applies a retained snapshot as a brand-new version. History is never rewritten.
pub fn restore_version(
    template: &mut Template,
    version: i32,
    changed_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<bool, EngineError> {
    let snapshot = template
        .version_history
        .find(version)
        .map(|entry| entry.content.clone())
        .ok_or(EngineError::VersionNotFound {
            template_id: template.id,
            version,
        })?;
    Ok(apply_content_change(template, snapshot, changed_by, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn template(max_versions: usize) -> Template {
        let mut t: Template = serde_json::from_value(json!({
            "id": "0b6a3f54-91d2-4f0e-8c1b-7f2f5e0c9a11",
            "name": "Offer",
            "content": { "sections": [] }
        }))
        .unwrap();
        t.max_versions = max_versions;
        t
    }

    fn content(text: &str) -> TemplateContent {
        serde_json::from_value(json!({
            "sections": [{ "id": "p", "type": "paragraph", "content": text }]
        }))
        .unwrap()
    }

    #[test]
    fn test_unchanged_content_is_noop() {
        let mut t = template(10);
        let now = Utc::now();
        assert!(apply_content_change(&mut t, content("a"), Some("hr"), now));
        assert!(!apply_content_change(&mut t, content("a"), Some("hr"), now));
        assert_eq!(t.version, 2);
        assert_eq!(t.version_history.len(), 1);
    }

    #[test]
    fn test_fifteen_saves_keep_ten_most_recent() {
        let mut t = template(10);
        let start = Utc::now();
        for i in 0..15 {
            let changed = apply_content_change(
                &mut t,
                content(&format!("revision {i}")),
                Some("hr@acme.example"),
                start + Duration::minutes(i),
            );
            assert!(changed);
        }
        assert_eq!(t.version, 16);
        assert_eq!(t.version_history.len(), 10);
        let versions: Vec<i32> = t.version_history.iter().map(|e| e.version).collect();
        assert_eq!(versions, (7..=16).collect::<Vec<_>>());
        assert_eq!(t.version_history.latest().map(|e| e.version), Some(16));
        assert_eq!(
            t.version_history.latest().map(|e| e.content.clone()),
            Some(content("revision 14"))
        );
    }

    #[test]
    fn test_zero_cap_keeps_newest() {
        let mut t = template(0);
        apply_content_change(&mut t, content("a"), None, Utc::now());
        apply_content_change(&mut t, content("b"), None, Utc::now());
        assert_eq!(t.version_history.len(), 1);
        assert_eq!(t.version_history.latest().map(|e| e.version), Some(3));
    }

    #[test]
    fn test_restore_creates_new_version() {
        let mut t = template(10);
        let now = Utc::now();
        apply_content_change(&mut t, content("first"), None, now);
        apply_content_change(&mut t, content("second"), None, now);

        assert!(restore_version(&mut t, 2, Some("admin"), now).unwrap());
        assert_eq!(t.version, 4);
        assert_eq!(t.content, content("first"));
        assert_eq!(
            t.version_history.latest().and_then(|e| e.changed_by.clone()),
            Some("admin".to_string())
        );
    }

    #[test]
    fn test_restore_unknown_version_fails() {
        let mut t = template(10);
        let err = restore_version(&mut t, 42, None, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::VersionNotFound { version: 42, .. }));
        assert_eq!(t.version, 1);
    }
}
