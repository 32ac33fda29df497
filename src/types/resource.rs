use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A schedulable entity that owns one row in the timeline.
///
/// Hierarchy may be expressed either by nesting `children` or by pointing a
/// flat resource at its parent through `parent_id`; both forms can be mixed.
/// Any field the source sends beyond the known ones lands in `extended_props`
/// and is addressable by spreadsheet columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Resource>,
    #[serde(flatten)]
    pub extended_props: BTreeMap<String, serde_json::Value>,
}

impl Resource {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Resource) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extended_props.insert(key.into(), value.into());
        self
    }

    /// Text value of a named field, as a spreadsheet column would read it.
    ///
    /// `id` and `title` map to the built-in fields; anything else is looked up
    /// in `extended_props`. Null and empty values read as `None`.
    pub fn field_text(&self, field: &str) -> Option<String> {
        let text = match field {
            "id" => self.id.clone(),
            "title" => self.title.clone(),
            "parentId" => self.parent_id.clone()?,
            other => match self.extended_props.get(other)? {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s.clone(),
                value => value.to_string(),
            },
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
