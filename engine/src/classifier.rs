//! Commit classification.
//!
//! Classification is an ordered table of rules evaluated top to bottom; the
//! first rule whose predicate holds decides the category. Each rule is a
//! plain function over [`RuleInput`], so every rule can be checked on its
//! own and the table order is the priority order.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use retrograph_memory::CommitCategory;
use thiserror::Error;

/// Package manifests, environment files and build or bundler configuration.
const CONFIG_GLOBS: &[&str] = &[
    "**/package.json",
    "**/package-lock.json",
    "**/yarn.lock",
    "**/pnpm-lock.yaml",
    "**/Cargo.toml",
    "**/Cargo.lock",
    "**/go.mod",
    "**/go.sum",
    "**/pyproject.toml",
    "**/requirements*.txt",
    "**/setup.py",
    "**/setup.cfg",
    "**/Gemfile",
    "**/pom.xml",
    "**/build.gradle*",
    "**/composer.json",
    "**/.env",
    "**/.env.*",
    "**/tsconfig*.json",
    "**/webpack.config.*",
    "**/vite.config.*",
    "**/rollup.config.*",
    "**/babel.config.*",
    "**/.babelrc",
    "**/esbuild.config.*",
];

const TEST_GLOBS: &[&str] = &[
    "**/test/**",
    "**/tests/**",
    "**/__tests__/**",
    "**/spec/**",
    "**/*.test.*",
    "**/*.spec.*",
    "**/*_test.*",
    "**/test_*.*",
];

const DOC_GLOBS: &[&str] = &[
    "**/*.md",
    "**/*.mdx",
    "**/*.rst",
    "**/*.adoc",
    "**/docs/**",
    "**/doc/**",
    "**/README*",
    "**/CHANGELOG*",
];

/// Errors building the classifier's matchers.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Invalid file pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Invalid keyword pattern: {0}")]
    Regex(#[from] regex::Error),
}

fn build_set(globs: &[&str]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(GlobBuilder::new(glob).case_insensitive(true).build()?);
    }
    builder.build()
}

/// Path matchers for the config, test and docs buckets.
pub struct FilePatterns {
    config: GlobSet,
    tests: GlobSet,
    docs: GlobSet,
}

impl FilePatterns {
    pub fn new() -> Result<Self, ClassifierError> {
        Ok(Self {
            config: build_set(CONFIG_GLOBS)?,
            tests: build_set(TEST_GLOBS)?,
            docs: build_set(DOC_GLOBS)?,
        })
    }

    pub fn is_config(&self, path: &str) -> bool {
        self.config.is_match(path)
    }

    pub fn is_test(&self, path: &str) -> bool {
        self.tests.is_match(path)
    }

    pub fn is_doc(&self, path: &str) -> bool {
        self.docs.is_match(path)
    }

    pub fn any_config(&self, files: &[String]) -> bool {
        files.iter().any(|f| self.is_config(f))
    }

    pub fn any_test(&self, files: &[String]) -> bool {
        files.iter().any(|f| self.is_test(f))
    }
}

/// Structural summary of one commit's diff.
///
/// The four buckets are disjoint: a path lands in the first of config,
/// tests, docs that matches, otherwise in code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffMetadata {
    pub total_files: usize,
    pub total_lines_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub config_files: Vec<String>,
    pub test_files: Vec<String>,
    pub code_files: Vec<String>,
    pub doc_files: Vec<String>,
}

impl DiffMetadata {
    pub fn has_config(&self) -> bool {
        !self.config_files.is_empty()
    }

    pub fn has_tests(&self) -> bool {
        !self.test_files.is_empty()
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Default)]
pub struct RuleInput {
    pub file_count: usize,
    pub lines_changed: usize,
    pub touches_config: bool,
    pub touches_tests: bool,
    pub mentions_test_or_fix: bool,
    pub mentions_refactor: bool,
    pub mentions_fix: bool,
    pub mentions_feature: bool,
    pub mentions_docs: bool,
}

/// One row of the classification table.
pub struct ClassificationRule {
    pub name: &'static str,
    pub category: CommitCategory,
    pub confidence: f32,
    pub reason: &'static str,
    pub matches: fn(&RuleInput) -> bool,
}

fn config_rule(input: &RuleInput) -> bool {
    input.touches_config && input.file_count <= 5
}

fn test_rule(input: &RuleInput) -> bool {
    input.touches_tests && input.mentions_test_or_fix
}

fn refactor_rule(input: &RuleInput) -> bool {
    input.mentions_refactor || (input.file_count > 15 && input.lines_changed > 200)
}

fn fix_rule(input: &RuleInput) -> bool {
    input.mentions_fix
}

fn feature_rule(input: &RuleInput) -> bool {
    input.mentions_feature
}

fn docs_rule(input: &RuleInput) -> bool {
    input.mentions_docs
}

/// Classification rules in priority order.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "config",
        category: CommitCategory::Config,
        confidence: 0.9,
        reason: "Touches configuration files in a small change",
        matches: config_rule,
    },
    ClassificationRule {
        name: "test",
        category: CommitCategory::Test,
        confidence: 0.85,
        reason: "Touches test files and mentions tests or fixes",
        matches: test_rule,
    },
    ClassificationRule {
        name: "refactor",
        category: CommitCategory::Refactor,
        confidence: 0.9,
        reason: "Mentions refactoring or restructures many files",
        matches: refactor_rule,
    },
    ClassificationRule {
        name: "fix",
        category: CommitCategory::Fix,
        confidence: 0.88,
        reason: "Mentions a fix, bug, patch or resolution",
        matches: fix_rule,
    },
    ClassificationRule {
        name: "feature",
        category: CommitCategory::Feature,
        confidence: 0.82,
        reason: "Mentions adding or implementing functionality",
        matches: feature_rule,
    },
    ClassificationRule {
        name: "docs",
        category: CommitCategory::Docs,
        confidence: 0.75,
        reason: "Mentions documentation",
        matches: docs_rule,
    },
];

/// Confidence given to commits no rule matches.
pub const UNKNOWN_CONFIDENCE: f32 = 0.5;

/// Outcome of classifying one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: CommitCategory,
    pub confidence: f32,
    pub reason: String,
    /// Name of the rule that matched, `unknown` if none did.
    pub rule: &'static str,
}

/// Derives a category and diff metadata for commits.
pub struct CommitClassifier {
    patterns: FilePatterns,
    fix_keywords: Regex,
    feature_keywords: Regex,
    docs_keywords: Regex,
}

impl CommitClassifier {
    pub fn new() -> Result<Self, ClassifierError> {
        Ok(Self {
            patterns: FilePatterns::new()?,
            fix_keywords: Regex::new(r"(?i)\b(hot)?fix|\bbug|\bpatch|\bresolv")?,
            feature_keywords: Regex::new(r"(?i)feat|add|implement")?,
            docs_keywords: Regex::new(r"(?i)doc|readme")?,
        })
    }

    pub fn patterns(&self) -> &FilePatterns {
        &self.patterns
    }

    /// Compute the facts the rule table is evaluated against.
    pub fn rule_input(&self, message: &str, files: &[String], lines_changed: usize) -> RuleInput {
        let lower = message.to_lowercase();
        RuleInput {
            file_count: files.len(),
            lines_changed,
            touches_config: self.patterns.any_config(files),
            touches_tests: self.patterns.any_test(files),
            mentions_test_or_fix: lower.contains("test") || lower.contains("fix"),
            mentions_refactor: lower.contains("refactor"),
            mentions_fix: self.fix_keywords.is_match(message),
            mentions_feature: self.feature_keywords.is_match(message),
            mentions_docs: self.docs_keywords.is_match(message),
        }
    }

    /// Classify a commit; the first matching rule wins.
    pub fn classify(&self, message: &str, files: &[String], lines_changed: usize) -> Classification {
        let input = self.rule_input(message, files, lines_changed);

        RULES
            .iter()
            .find(|rule| (rule.matches)(&input))
            .map(|rule| Classification {
                category: rule.category,
                confidence: rule.confidence,
                reason: rule.reason.to_string(),
                rule: rule.name,
            })
            .unwrap_or_else(|| Classification {
                category: CommitCategory::Unknown,
                confidence: UNKNOWN_CONFIDENCE,
                reason: "No classification rule matched".to_string(),
                rule: "unknown",
            })
    }

    /// Bucket files by path and total the change magnitude.
    pub fn extract_metadata(
        &self,
        files: &[String],
        insertions: usize,
        deletions: usize,
    ) -> DiffMetadata {
        let mut metadata = DiffMetadata {
            total_files: files.len(),
            total_lines_changed: insertions + deletions,
            insertions,
            deletions,
            ..Default::default()
        };

        for file in files {
            let bucket = if self.patterns.is_config(file) {
                &mut metadata.config_files
            } else if self.patterns.is_test(file) {
                &mut metadata.test_files
            } else if self.patterns.is_doc(file) {
                &mut metadata.doc_files
            } else {
                &mut metadata.code_files
            };
            bucket.push(file.clone());
        }

        metadata
    }

    /// Whether a commit is worth turning into an event.
    ///
    /// Any config touch is significant regardless of size; other commits
    /// need more than 5 files or more than 50 changed lines.
    pub fn is_significant(&self, metadata: &DiffMetadata) -> bool {
        metadata.total_files > 5 || metadata.total_lines_changed > 50 || metadata.has_config()
    }
}
