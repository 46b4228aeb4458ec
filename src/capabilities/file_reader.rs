use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{Capability, ParamSpec, ParamType};
use crate::resources::ResourceStore;

/// Reads a registered resource by logical name.
pub struct FileReaderCapability {
    resources: Arc<ResourceStore>,
}

impl FileReaderCapability {
    pub fn new(resources: Arc<ResourceStore>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl Capability for FileReaderCapability {
    fn name(&self) -> &str {
        "file_reader"
    }

    fn description(&self) -> &str {
        "Read the content of a named resource. Only registered resource names are served."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "filename",
            ParamType::String,
            "Logical name of the resource to read",
        )]
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value> {
        let filename = params["filename"]
            .as_str()
            .ok_or_else(|| anyhow!("Missing filename parameter"))?;

        let content = self
            .resources
            .resolve(filename)
            .await
            .map_err(|e| anyhow!("File not found: {} ({})", filename, e))?;

        Ok(json!({
            "filename": filename,
            "content": content,
            "size": content.len(),
        }))
    }
}
