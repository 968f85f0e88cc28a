// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Collaborators that work without a model backend.
//!
//! These keep the binary usable for wiring tests and demos: utterances come
//! from templates, experts from a fixed list, and no edits are proposed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::WalkDir;

use super::{
    EditGenerator, EditRequest, ExpertGenerator, Generated, KnowledgeBase, RepoSummarizer,
    UserPrompt, UtteranceGenerator, UtteranceRequest,
};
use crate::agents::AgentKind;
use crate::approval::ProposedEdit;
use crate::conversation::Turn;
use crate::error::CollaboratorError;

/// Directories never included in a repository summary.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git",
    "**/node_modules",
    "**/target",
    "**/__pycache__",
    "**/.venv",
    "**/dist",
    "**/build",
];

/// Maximum number of files listed in a summary.
pub const MAX_SUMMARY_FILES: usize = 500;

// ============================================================================
// Utterances
// ============================================================================

/// Template-based utterances.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateUtterances;

#[async_trait]
impl UtteranceGenerator for TemplateUtterances {
    async fn generate(
        &self,
        request: &UtteranceRequest,
        cancel: &CancellationToken,
    ) -> Result<Generated, CollaboratorError> {
        if cancel.is_cancelled() {
            return Err(CollaboratorError::Cancelled);
        }

        let last = request
            .history
            .last()
            .map(|turn| turn.preview(80))
            .unwrap_or_default();

        let text = match request.kind {
            AgentKind::SimulatedUser => request.intent.clone().unwrap_or_else(|| {
                format!("Please continue with the most important open point about {}.", request.topic)
            }),
            AgentKind::Moderator => {
                format!("Which aspects of {} have not been covered yet?", request.topic)
            }
            AgentKind::PureRag => format!("Retrieved context for: {}", last),
            AgentKind::PeerExpert | AgentKind::GeneralKnowledgeProvider => {
                if request.profile.role_description.is_empty() {
                    format!("{} on \"{}\"", request.profile.role_name, last)
                } else {
                    format!(
                        "{} ({}) on \"{}\"",
                        request.profile.role_name, request.profile.role_description, last
                    )
                }
            }
        };

        Ok(Generated::text(text))
    }
}

// ============================================================================
// Experts
// ============================================================================

/// Fixed list of peer experts.
#[derive(Debug, Clone)]
pub struct StaticExperts {
    pub experts: Vec<String>,
}

impl Default for StaticExperts {
    fn default() -> Self {
        Self {
            experts: vec![
                "Software Architect: Focus on module boundaries and data flow.".to_string(),
                "Test Engineer: Focus on edge cases and regression risk.".to_string(),
                "Code Reviewer: Focus on correctness and readability.".to_string(),
            ],
        }
    }
}

#[async_trait]
impl ExpertGenerator for StaticExperts {
    async fn generate_experts(
        &self,
        _topic: &str,
        _background: &str,
        _focus: &str,
        count: usize,
        _cancel: &CancellationToken,
    ) -> Result<Vec<String>, CollaboratorError> {
        Ok(self.experts.iter().take(count).cloned().collect())
    }
}

// ============================================================================
// Knowledge base
// ============================================================================

/// Knowledge base kept in memory for the lifetime of a session.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeBase {
    entries: Mutex<Vec<Turn>>,
    reorganizations: Mutex<usize>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn reorganizations(&self) -> usize {
        *self.reorganizations.lock().await
    }
}

#[async_trait]
impl KnowledgeBase for InMemoryKnowledgeBase {
    async fn insert(&self, turn: &Turn) -> Result<(), CollaboratorError> {
        self.entries.lock().await.push(turn.clone());
        Ok(())
    }

    async fn reorganize(
        &self,
        history: &[Turn],
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError> {
        if cancel.is_cancelled() {
            return Err(CollaboratorError::Cancelled);
        }
        *self.reorganizations.lock().await += 1;
        debug!(turns = history.len(), "Knowledge base reorganized");
        Ok(())
    }

    async fn summary(&self) -> String {
        self.entries
            .lock()
            .await
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.preview(200)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Edits
// ============================================================================

/// Edit generator that never proposes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEdits;

#[async_trait]
impl EditGenerator for NoEdits {
    async fn propose_edits(
        &self,
        _request: &EditRequest,
        _user: Arc<dyn UserPrompt>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ProposedEdit>, CollaboratorError> {
        Ok(Vec::new())
    }
}

// ============================================================================
// Repository summary
// ============================================================================

/// Summarizes a repository as an indented file tree.
#[derive(Debug, Clone)]
pub struct FileTreeSummarizer {
    exclude_globs: GlobSet,
    max_files: usize,
}

impl Default for FileTreeSummarizer {
    fn default() -> Self {
        let patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect();
        // The built-in patterns are known to be valid.
        let exclude_globs = Self::build_globset(&patterns).unwrap_or_else(|_| GlobSet::empty());
        Self {
            exclude_globs,
            max_files: MAX_SUMMARY_FILES,
        }
    }
}

impl FileTreeSummarizer {
    /// Create a summarizer with custom exclude patterns.
    pub fn new(exclude_patterns: &[String], max_files: usize) -> Result<Self, CollaboratorError> {
        Ok(Self {
            exclude_globs: Self::build_globset(exclude_patterns)?,
            max_files,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<GlobSet, CollaboratorError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                CollaboratorError::Summary(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| CollaboratorError::Summary(format!("Failed to build globset: {}", e)))
    }

    fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>, CollaboratorError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == root {
                    return true;
                }
                let relative = e.path().strip_prefix(root).unwrap_or(e.path());
                !self.exclude_globs.is_match(relative)
            })
        {
            let entry = entry.map_err(|e| {
                CollaboratorError::Summary(format!("Failed to walk directory: {}", e))
            })?;

            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Render the tree for `root` synchronously.
    pub fn render(&self, root: &Path) -> Result<String, CollaboratorError> {
        let files = self.collect_files(root)?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());

        let mut lines = vec![format!("{}/", name)];
        let mut seen_dirs = BTreeSet::new();

        for file in files.iter().take(self.max_files) {
            let components: Vec<_> = file.components().collect();
            let mut prefix = PathBuf::new();
            for (depth, component) in components.iter().enumerate() {
                prefix.push(component);
                let indent = "  ".repeat(depth + 1);
                let label = component.as_os_str().to_string_lossy();
                if depth + 1 < components.len() {
                    if seen_dirs.insert(prefix.clone()) {
                        lines.push(format!("{}{}/", indent, label));
                    }
                } else {
                    lines.push(format!("{}{}", indent, label));
                }
            }
        }

        if files.len() > self.max_files {
            lines.push(format!("  ... ({} more files)", files.len() - self.max_files));
        }

        Ok(lines.join("\n"))
    }
}

#[async_trait]
impl RepoSummarizer for FileTreeSummarizer {
    async fn summarize(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        if cancel.is_cancelled() {
            return Err(CollaboratorError::Cancelled);
        }
        let summarizer = self.clone();
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || summarizer.render(&root))
            .await
            .map_err(|e| CollaboratorError::Summary(format!("Summary task failed: {}", e)))?
    }
}
