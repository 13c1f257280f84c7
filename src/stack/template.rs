// Copyright (c) 2025 - Cowboy AI, Inc.

//! Stack Templates
//!
//! The deterministic JSON rendering of a stack. Resources are keyed by
//! logical id in sorted order; references render as `{"ref": {..}}` and joins
//! as `{"join": [..]}`. Before a template is handed to the provisioner, every
//! cross-stack reference is replaced by the producer's realized value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet};

use super::{Stack, StackEnv};
use crate::domain::{AttrRef, StackName};
use crate::errors::{StackError, StackResult};

/// Provisioner input for one stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackTemplate {
    pub stack: StackName,
    pub env: StackEnv,
    pub dependencies: Vec<StackName>,
    pub tags: BTreeMap<String, String>,
    pub resources: Map<String, Json>,
    pub outputs: Map<String, Json>,
}

impl StackTemplate {
    /// Render a stack
    pub fn from_stack(stack: &Stack) -> StackResult<Self> {
        let mut resources = Map::new();
        for (logical_id, spec) in stack.resources() {
            resources.insert(logical_id.to_string(), serde_json::to_value(spec)?);
        }

        let mut outputs = Map::new();
        for (name, value) in stack.outputs() {
            outputs.insert(name.clone(), serde_json::to_value(value)?);
        }

        Ok(Self {
            stack: stack.name().clone(),
            env: stack.env().clone(),
            dependencies: stack.dependencies().iter().cloned().collect(),
            tags: stack.tags().clone(),
            resources,
            outputs,
        })
    }

    /// References into other stacks still present in the template
    pub fn imports(&self) -> BTreeSet<AttrRef> {
        let mut found = BTreeSet::new();
        for json in self.resources.values().chain(self.outputs.values()) {
            collect_references(json, &mut found);
        }
        found.retain(|reference| reference.is_import_for(&self.stack));
        found
    }

    /// Replace every cross-stack reference with its realized value
    ///
    /// References to the template's own resources stay in place; the
    /// provisioner resolves them while realizing the stack.
    pub fn resolve_imports<F>(&self, lookup: F) -> StackResult<Self>
    where
        F: Fn(&AttrRef) -> Option<String>,
    {
        let mut resolved = self.clone();
        for json in resolved
            .resources
            .values_mut()
            .chain(resolved.outputs.values_mut())
        {
            substitute(json, &|reference: &AttrRef| {
                if reference.is_import_for(&self.stack) {
                    lookup(reference)
                        .map(Some)
                        .ok_or_else(|| StackError::UnresolvedReference(reference.to_string()))
                } else {
                    Ok(None)
                }
            })?;
        }
        Ok(resolved)
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> StackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The reference encoded by a `{"ref": {..}}` node
fn as_reference(json: &Json) -> Option<AttrRef> {
    match json {
        Json::Object(map) if map.len() == 1 => map
            .get("ref")
            .and_then(|inner| serde_json::from_value(inner.clone()).ok()),
        _ => None,
    }
}

/// Collect every reference inside a rendered value
pub(crate) fn collect_references(json: &Json, found: &mut BTreeSet<AttrRef>) {
    if let Some(reference) = as_reference(json) {
        found.insert(reference);
        return;
    }

    match json {
        Json::Array(items) => items.iter().for_each(|item| collect_references(item, found)),
        Json::Object(map) => map.values().for_each(|item| collect_references(item, found)),
        _ => {}
    }
}

/// Replace references for which `replace` yields a value, then collapse
/// joins whose parts all became literals
pub(crate) fn substitute<F>(json: &mut Json, replace: &F) -> StackResult<()>
where
    F: Fn(&AttrRef) -> StackResult<Option<String>>,
{
    if let Some(reference) = as_reference(json) {
        if let Some(value) = replace(&reference)? {
            *json = Json::String(value);
        }
        return Ok(());
    }

    match json {
        Json::Array(items) => {
            for item in items.iter_mut() {
                substitute(item, replace)?;
            }
        }
        Json::Object(map) => {
            for item in map.values_mut() {
                substitute(item, replace)?;
            }
            if let Some(text) = collapsed_join(map) {
                *json = Json::String(text);
            }
        }
        _ => {}
    }
    Ok(())
}

fn collapsed_join(map: &Map<String, Json>) -> Option<String> {
    if map.len() != 1 {
        return None;
    }
    let parts = map.get("join")?.as_array()?;
    parts.iter().map(|part| part.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn db_ref() -> Json {
        json!({"ref": {"stack": "RedashRdsStack", "resource": "RedashDB", "attribute": "endpoint_address"}})
    }

    fn local_ref() -> Json {
        json!({"ref": {"stack": "RedashServerStack", "resource": "EcsCluster", "attribute": "arn"}})
    }

    #[test]
    fn test_collect_references() {
        let json = json!({"a": [db_ref(), {"join": ["x", local_ref()]}], "b": "plain"});
        let mut found = BTreeSet::new();
        collect_references(&json, &mut found);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_substitute_collapses_joins() {
        let mut json = json!({"url": {"join": ["postgresql://", db_ref(), ":5432"]}, "cluster": local_ref()});
        let stack = StackName::new("RedashServerStack").unwrap();

        substitute(&mut json, &|reference: &AttrRef| {
            Ok(reference
                .is_import_for(&stack)
                .then(|| "db.internal".to_string()))
        })
        .unwrap();

        assert_eq!(json["url"], json!("postgresql://db.internal:5432"));
        assert_eq!(json["cluster"], local_ref());
    }

    #[test]
    fn test_substitute_reports_missing() {
        let mut json = json!([db_ref()]);
        let result = substitute(&mut json, &|reference: &AttrRef| {
            Err(StackError::UnresolvedReference(reference.to_string()))
        });
        assert!(matches!(result, Err(StackError::UnresolvedReference(_))));
    }
}
