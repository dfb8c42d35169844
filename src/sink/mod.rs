//! Deployment sinks - render the final context somewhere

use crate::campaign::roles;
use crate::core::PipelineContext;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::info;

/// Consumes a finished context and reports where it went
#[async_trait]
pub trait DeploymentSink: Send + Sync {
    /// Persist or render `ctx`; returns a location
    async fn deploy(&self, ctx: &PipelineContext) -> Result<String>;
}

/// Markdown deployment report: recommendation and brief
pub fn render_markdown(ctx: &PipelineContext, aggregator: &str) -> String {
    let recommendation = ctx
        .get_output(aggregator)
        .and_then(|output| output.get("recommendation"))
        .map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let brief = ctx.input_str("brief").unwrap_or_default();

    format!(
        "# Campaign Deployment\n\n## Recommendation: {}\n\n## Brief\n\n{}\n",
        recommendation, brief
    )
}

/// Writes the markdown report to a file
#[derive(Debug, Clone)]
pub struct MarkdownFileSink {
    path: PathBuf,
    aggregator: String,
}

impl MarkdownFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            aggregator: roles::AGGREGATOR.name.to_string(),
        }
    }

    /// Read the recommendation from a different unit's output
    pub fn with_aggregator(mut self, unit: impl Into<String>) -> Self {
        self.aggregator = unit.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DeploymentSink for MarkdownFileSink {
    async fn deploy(&self, ctx: &PipelineContext) -> Result<String> {
        write_file(&self.path, render_markdown(ctx, &self.aggregator)).await?;
        info!("Deployed to {}", self.path.display());
        Ok(self.path.display().to_string())
    }
}

/// Writes the whole serialized context as JSON
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeploymentSink for JsonFileSink {
    async fn deploy(&self, ctx: &PipelineContext) -> Result<String> {
        let json = serde_json::to_string_pretty(ctx).context("Failed to serialize context")?;
        write_file(&self.path, json).await?;
        info!("Wrote context to {}", self.path.display());
        Ok(self.path.display().to_string())
    }
}

async fn write_file(path: &Path, content: String) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Keeps rendered markdown reports in memory
#[derive(Debug, Default)]
pub struct InMemorySink {
    documents: RwLock<Vec<String>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn documents(&self) -> Vec<String> {
        self.documents.read().await.clone()
    }
}

#[async_trait]
impl DeploymentSink for InMemorySink {
    async fn deploy(&self, ctx: &PipelineContext) -> Result<String> {
        let mut documents = self.documents.write().await;
        documents.push(render_markdown(ctx, roles::AGGREGATOR.name));
        Ok(format!("memory:{}", documents.len() - 1))
    }
}
