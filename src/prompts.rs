use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::PromptError;

/// A named template with `{placeholder}` slots. Placeholders are discovered
/// when the template is registered.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub template: String,
    pub placeholders: Vec<String>,
}

pub struct PromptStore {
    templates: HashMap<String, PromptTemplate>,
    placeholder_re: Regex,
}

impl PromptStore {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
            placeholder_re: Regex::new(r"\{([a-zA-Z0-9_]+)\}").expect("valid placeholder pattern"),
        }
    }

    /// A store pre-loaded with the templates the agents compose their
    /// instructions from.
    pub fn with_builtins() -> Self {
        let mut store = Self::new();
        store.register("summarize", "Summarize the following text: {text}");
        store.register(
            "fact_extraction",
            "Extract all salient factual information from the following text: '{text}'. \
             Identify distinct factual statements, key entities mentioned, and provide a \
             concise summary of the factual content. \
             Your response MUST be a JSON object containing ONLY the following keys: \
             'facts' (a list of strings, each a distinct factual statement), \
             'entities' (a list of relevant entities mentioned), \
             'statistics' (a list of numerical data or statistics extracted), \
             'summary' (a brief summary of the extracted facts), \
             'key_points' (a list of key points derived from the facts). \
             DO NOT include any additional text, explanations, or Markdown formatting.",
        );
        store.register(
            "sentiment_analysis",
            "Analyze the sentiment of the following text: '{text}'\n\n\
             Additional context: {context}\n\n\
             Return the primary sentiment as 'positive', 'negative', 'neutral', or 'mixed', \
             along with an overall confidence score between 0 and 1. \
             Also identify the specific emotional 'tone(s)' present and provide a \
             'justification' explaining why that sentiment was assigned. \
             Your response MUST be a JSON object containing ONLY the following keys: \
             'sentiment', 'confidence', 'tone' (a list of strings), and 'justification'. \
             DO NOT include any additional text, explanations, or Markdown formatting.",
        );
        store.register(
            "synthesis",
            "Original query: {query}\n\n\
             Gathered material from specialized agents and capabilities:\n{material}\n\n\
             Synthesize a comprehensive response that combines all the results. \
             Your response MUST be a JSON object containing ONLY the following keys: \
             'comprehensive_response' (the main answer to the query) and \
             'key_findings' (a list of strings). \
             DO NOT include any additional text, explanations, or Markdown formatting.",
        );
        store
    }

    /// Register a template, replacing any previous entry with the same name.
    pub fn register(&mut self, name: impl Into<String>, template: impl Into<String>) {
        let name = name.into();
        let template = template.into();
        let mut placeholders: Vec<String> = self
            .placeholder_re
            .captures_iter(&template)
            .map(|c| c[1].to_string())
            .collect();
        placeholders.sort();
        placeholders.dedup();

        self.templates.insert(
            name.clone(),
            PromptTemplate {
                name,
                template,
                placeholders,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.keys().cloned().collect();
        names.sort();
        names
    }

    /// Format a registered template. Fails if the template is unknown or any
    /// placeholder is missing from `variables`; never substitutes partially.
    /// Variables the template does not reference are ignored.
    pub fn format(
        &self,
        name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String, PromptError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))?;

        for placeholder in &template.placeholders {
            if !variables.contains_key(placeholder) {
                return Err(PromptError::MissingVariable {
                    placeholder: placeholder.clone(),
                });
            }
        }

        let mut formatted = template.template.clone();
        for placeholder in &template.placeholders {
            let slot = format!("{{{}}}", placeholder);
            formatted = formatted.replace(&slot, &variables[placeholder]);
        }
        Ok(formatted)
    }
}

impl Default for PromptStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a JSON variables object into the string map `format` expects.
/// String values are taken as-is, everything else keeps its JSON rendering.
pub fn stringify_variables(variables: &serde_json::Map<String, Value>) -> HashMap<String, String> {
    variables
        .iter()
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), rendered)
        })
        .collect()
}
