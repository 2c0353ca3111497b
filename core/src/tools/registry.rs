//! Tool catalog: the fixed set of operations the model may call

use crate::error::ToolError;
use crate::tools::ToolSpec;
use serde::Serialize;
use std::collections::HashMap;

/// Registry of tool specs, keyed by name, in registration order
///
/// Built once at startup and then shared read-only between runs.
#[derive(Debug, Default, Clone)]
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

/// What the model is told about one tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from specs, failing on the first duplicate name
    pub fn with_specs(specs: impl IntoIterator<Item = ToolSpec>) -> Result<Self, ToolError> {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.register(spec)?;
        }
        Ok(catalog)
    }

    /// Register a tool
    pub fn register(&mut self, spec: ToolSpec) -> Result<(), ToolError> {
        if self.index.contains_key(&spec.name) {
            return Err(ToolError::DuplicateName { name: spec.name });
        }
        tracing::debug!(tool = %spec.name, "registered tool");
        self.index.insert(spec.name.clone(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Get a tool by name
    pub fn lookup(&self, name: &str) -> Option<&ToolSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Describe every tool in registration order
    pub fn describe_all(&self) -> Vec<ToolDescription> {
        self.specs
            .iter()
            .map(|spec| ToolDescription {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.schema.to_json_schema(),
            })
            .collect()
    }

    /// Render the catalog as the block embedded in the system instructions
    pub fn render_description(&self) -> String {
        let mut out = String::from("Available Tools/Functions:\n");
        for tool in self.describe_all() {
            let parameters = serde_json::to_string_pretty(&tool.parameters)
                .unwrap_or_else(|_| tool.parameters.to_string());
            out.push_str(&format!(
                "\nTool: {}\nDescription: {}\nParameters: {}\n",
                tool.name, tool.description, parameters
            ));
        }
        out
    }
}
