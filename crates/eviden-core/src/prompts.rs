//! Prompt library for generative narratives
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/eviden/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const INSIGHT_NARRATIVE: &str = include_str!("../../../prompts/insight_narrative.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Executive narrative over profile facts and KPIs
    InsightNarrative,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsightNarrative => "insight_narrative",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::InsightNarrative]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::InsightNarrative => defaults::INSIGHT_NARRATIVE,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt content (system + user sections)
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the user section with template variables replaced
    ///
    /// Falls back to the whole body when there is no `# User` section.
    pub fn render_user(&self, vars: &HashMap<&str, String>) -> String {
        render(self.user_section().unwrap_or(&self.content), vars)
    }

    /// Render the system section, if present
    pub fn render_system(&self, vars: &HashMap<&str, String>) -> Option<String> {
        self.system_section().map(|s| render(s, vars))
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt not cached: {}", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                tracing::debug!(
                    prompt = id.as_str(),
                    path = %override_path.display(),
                    "Using prompt override"
                );
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_dir
            .as_ref()
            .is_some_and(|d| d.join(format!("{}.md", id.as_str())).exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("eviden").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section body, up to the next top-level `# ` header
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

/// Replace `{{var}}` placeholders and resolve `{{#if var}}...{{/if}}` blocks
fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    // Conditionals first so a substituted value can never open a block
    let mut result = resolve_conditionals(template, vars);
    for (key, value) in vars {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}

/// Keep blocks whose variable is present and non-empty, drop the rest
fn resolve_conditionals(content: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = &result[var_start..var_start + var_end];
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_content = &result[block_start..block_start + endif_pos];
        let full_end = block_start + endif_pos + 7;

        let include = vars.get(var_name).is_some_and(|v| !v.is_empty());
        result = if include {
            format!("{}{}{}", &result[..if_start], block_content, &result[full_end..])
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_parse_embedded_prompts() {
        let mut library = PromptLibrary::embedded_only();
        for &id in PromptId::all() {
            let prompt = library.get(id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(!prompt.is_override);
            assert!(prompt.system_section().is_some());
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_render_insight_prompt() {
        let mut library = PromptLibrary::embedded_only();
        let prompt = library.get(PromptId::InsightNarrative).unwrap();
        let rendered = prompt.render_user(&vars(&[
            ("dataset_type", "Sales"),
            ("rows", "1,000"),
            ("kpis", "- Total Revenue: $600.00"),
            ("missing_details", ""),
        ]));
        assert!(rendered.contains("- Type: Sales"));
        assert!(rendered.contains("- Total Revenue: $600.00"));
        assert!(!rendered.contains("Most affected columns"));
        assert!(!rendered.contains("{{#if"));
    }

    #[test]
    fn test_conditional_blocks() {
        let template = "a{{#if x}} [x={{x}}]{{/if}} b{{#if y}} [y]{{/if}}";
        let rendered = render(template, &vars(&[("x", "1")]));
        assert_eq!(rendered, "a [x=1] b");
    }

    #[test]
    fn test_extract_section() {
        let content = "# System\nsys text\n\n# User\nuser text\n## Heading kept";
        assert_eq!(extract_section(content, "# System"), Some("sys text"));
        assert_eq!(
            extract_section(content, "# User"),
            Some("user text\n## Heading kept")
        );
        assert_eq!(extract_section(content, "# Missing"), None);
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# System\nno frontmatter").is_err());
        assert!(parse_prompt("---\nid: x\nversion: 1\ntask_type: narrative\n").is_err());
    }

    #[test]
    fn test_override_dir_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("insight_narrative.md"),
            "---\nid: insight_narrative\nversion: 2\ntask_type: narrative\n---\n\
             # User\nCustom {{dataset_type}}",
        )
        .unwrap();

        let mut library = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(library.has_override(PromptId::InsightNarrative));
        let prompt = library.get(PromptId::InsightNarrative).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 2);
        assert_eq!(
            prompt.render_user(&vars(&[("dataset_type", "Finance")])),
            "Custom Finance"
        );
    }
}
