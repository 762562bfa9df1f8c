use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde_json::Value;

use crate::diagnostics::DiagnosticsLog;
use crate::error::CoreError;
use crate::models::{AnnotationPayload, AnnotationTag, MessageKey, ReportId, PAYLOAD_VERSION};
use crate::storage::StorageBackend;

/// Tags per message. A key with no tags is absent, never mapped to an empty set.
pub type TagAssignments = BTreeMap<MessageKey, BTreeSet<AnnotationTag>>;

pub fn storage_key(prefix: &str, report_id: &ReportId) -> String {
    format!("{}:{}", prefix, report_id)
}

pub fn export_filename(report_id: &ReportId) -> String {
    format!("bubbly-annotations-{}.json", report_id)
}

/// Annotation state for one loaded report.
///
/// Every mutation is written through to the backend. Write failures are
/// logged and otherwise ignored; the in-memory state stays authoritative.
pub struct AnnotationStore<B: StorageBackend> {
    report_id: ReportId,
    storage_key: String,
    assignments: TagAssignments,
    backend: B,
    diagnostics: Option<DiagnosticsLog>,
}

impl<B: StorageBackend> AnnotationStore<B> {
    /// Opens the store and loads saved state for `report_id`, if any.
    ///
    /// Unreadable or foreign saved state is treated as no saved state.
    pub fn open(report_id: ReportId, prefix: &str, backend: B) -> Self {
        let storage_key = storage_key(prefix, &report_id);
        let assignments = load_saved(&backend, &storage_key, &report_id);
        Self {
            report_id,
            storage_key,
            assignments,
            backend,
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, log: DiagnosticsLog) -> Self {
        self.diagnostics = Some(log);
        self
    }

    pub fn report_id(&self) -> &ReportId {
        &self.report_id
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn assignments(&self) -> &TagAssignments {
        &self.assignments
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn get_tags(&self, key: &MessageKey) -> Vec<AnnotationTag> {
        self.assignments
            .get(key)
            .map(|tags| tags.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Adds or removes one tag. Names outside the vocabulary are ignored.
    /// Returns whether the assignment changed.
    pub fn set_tag(&mut self, key: &MessageKey, tag: &str, enabled: bool) -> bool {
        let Some(tag) = AnnotationTag::from_name(tag) else {
            tracing::debug!(tag, "ignoring tag outside the vocabulary");
            return false;
        };
        let changed = if enabled {
            self.assignments.entry(key.clone()).or_default().insert(tag)
        } else {
            match self.assignments.get_mut(key) {
                Some(tags) => {
                    let removed = tags.remove(&tag);
                    if tags.is_empty() {
                        self.assignments.remove(key);
                    }
                    removed
                }
                None => false,
            }
        };
        if changed {
            self.persist();
        }
        changed
    }

    pub fn export_payload(&self) -> AnnotationPayload {
        AnnotationPayload {
            version: PAYLOAD_VERSION,
            report_id: Some(self.report_id.clone()),
            updated_at: Some(Utc::now().to_rfc3339()),
            assignments: self
                .assignments
                .iter()
                .map(|(key, tags)| (key.clone(), tags.iter().map(|t| t.name().to_string()).collect()))
                .collect(),
        }
    }

    pub fn export_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(&self.export_payload())?)
    }

    pub fn export_filename(&self) -> String {
        export_filename(&self.report_id)
    }

    /// Replaces every assignment with the payload's.
    ///
    /// A payload stamped with another report is refused unless
    /// `allow_mismatch` is set; nothing changes on refusal. Returns the number
    /// of annotated messages after the import.
    pub fn import_payload(&mut self, payload: AnnotationPayload, allow_mismatch: bool) -> Result<usize, CoreError> {
        if let Some(found) = &payload.report_id {
            if found != &self.report_id && !allow_mismatch {
                return Err(CoreError::ReportMismatch {
                    expected: self.report_id.to_string(),
                    found: found.to_string(),
                });
            }
        }
        self.assignments = assignments_from_payload(&payload);
        self.persist();
        tracing::debug!(annotated = self.assignments.len(), "annotations imported");
        Ok(self.assignments.len())
    }

    pub fn import_json(&mut self, text: &str, allow_mismatch: bool) -> Result<usize, CoreError> {
        let payload = parse_payload(text)?;
        self.import_payload(payload, allow_mismatch)
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.export_payload())
            .map_err(CoreError::from)
            .and_then(|json| self.backend.write(&self.storage_key, &json));
        if let Err(err) = result {
            tracing::warn!(error = %err, key = %self.storage_key, "annotation state not persisted");
            if let Some(log) = &self.diagnostics {
                let _ = log.record("storage_write_error", &err.to_string());
            }
        }
    }
}

/// Validates an annotation document and turns it into a payload.
///
/// The document must be an object with an `assignments` object whose values
/// are lists. Non-string list entries are dropped; tag vocabulary filtering
/// happens on import.
pub fn parse_payload(text: &str) -> Result<AnnotationPayload, CoreError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CoreError::ImportFormat(format!("not valid JSON: {}", e)))?;
    let Value::Object(root) = value else {
        return Err(CoreError::ImportFormat("expected a JSON object".to_string()));
    };

    let version = match root.get("version") {
        None | Some(Value::Null) => PAYLOAD_VERSION,
        Some(v) => v
            .as_i64()
            .ok_or_else(|| CoreError::ImportFormat("version must be an integer".to_string()))?,
    };
    let report_id = match root.get("report_id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(ReportId::new(s.clone())),
        Some(_) => return Err(CoreError::ImportFormat("report_id must be a string".to_string())),
    };
    let updated_at = root
        .get("updated_at")
        .and_then(Value::as_str)
        .map(str::to_string);

    let Some(Value::Object(raw_assignments)) = root.get("assignments") else {
        return Err(CoreError::ImportFormat("assignments must be an object".to_string()));
    };
    let mut assignments = BTreeMap::new();
    for (key, tags) in raw_assignments {
        let Value::Array(tags) = tags else {
            return Err(CoreError::ImportFormat(format!("tags for a message must be a list, got {}", tags)));
        };
        let names = tags
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        assignments.insert(MessageKey::new(key.clone()), names);
    }

    Ok(AnnotationPayload {
        version,
        report_id,
        updated_at,
        assignments,
    })
}

fn assignments_from_payload(payload: &AnnotationPayload) -> TagAssignments {
    payload
        .assignments
        .iter()
        .filter_map(|(key, names)| {
            let tags: BTreeSet<AnnotationTag> = names.iter().filter_map(|n| AnnotationTag::from_name(n)).collect();
            (!tags.is_empty()).then(|| (key.clone(), tags))
        })
        .collect()
}

fn load_saved<B: StorageBackend>(backend: &B, key: &str, report_id: &ReportId) -> TagAssignments {
    let raw = match backend.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return TagAssignments::new(),
        Err(err) => {
            tracing::warn!(error = %err, key, "saved annotations unreadable, starting empty");
            return TagAssignments::new();
        }
    };
    let payload = match parse_payload(&raw) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, key, "saved annotations malformed, starting empty");
            return TagAssignments::new();
        }
    };
    if payload.report_id.as_ref().is_some_and(|found| found != report_id) {
        tracing::debug!(key, "saved annotations belong to another report, skipping");
        return TagAssignments::new();
    }
    assignments_from_payload(&payload)
}
