//! Git output parsing for history reconstruction.

use super::GitMiningError;
use chrono::{DateTime, Utc};

/// Separator used in git log format output.
pub const FIELD_SEPARATOR: char = '|';

/// Git log format: hash, author name, strict ISO author date, subject.
pub const LOG_FORMAT: &str = "%H|%an|%aI|%s";

/// One commit from the history listing, with its diff statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub files: Vec<String>,
    pub insertions: usize,
    pub deletions: usize,
}

impl Commit {
    pub fn lines_changed(&self) -> usize {
        self.insertions + self.deletions
    }

    /// Attach diff statistics resolved by a separate lookup.
    pub fn with_stat(mut self, stat: DiffStat) -> Self {
        self.files = stat.files;
        self.insertions = stat.insertions;
        self.deletions = stat.deletions;
        self
    }
}

/// Files and line counts parsed from `git show --stat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub files: Vec<String>,
    pub insertions: usize,
    pub deletions: usize,
}

/// Parse one `hash|author|timestamp|subject` line.
///
/// The subject is the last field and may itself contain separators.
pub fn parse_log_line(line: &str) -> Result<Commit, GitMiningError> {
    let mut fields = line.splitn(4, FIELD_SEPARATOR);
    let (hash, author, date, subject) = match (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) {
        (Some(h), Some(a), Some(d), Some(s)) => (h.trim(), a.trim(), d.trim(), s.trim()),
        _ => {
            return Err(GitMiningError::ParseError(format!(
                "expected 4 fields in log line: {:?}",
                line
            )))
        }
    };

    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GitMiningError::ParseError(format!(
            "invalid commit hash: {:?}",
            hash
        )));
    }

    let timestamp = DateTime::parse_from_rfc3339(date)
        .map_err(|e| GitMiningError::ParseError(format!("invalid timestamp {:?}: {}", date, e)))?
        .with_timezone(&Utc);

    Ok(Commit {
        hash: hash.to_string(),
        author: author.to_string(),
        timestamp,
        message: subject.to_string(),
        files: Vec::new(),
        insertions: 0,
        deletions: 0,
    })
}

/// Parse git log output into commits, skipping malformed lines.
pub fn parse_log_output(output: &str) -> Vec<Commit> {
    let mut commits = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_log_line(line) {
            Ok(commit) => commits.push(commit),
            Err(e) => tracing::debug!("Skipping malformed log line: {}", e),
        }
    }

    commits
}

/// Parse `--stat` output into files and line totals.
///
/// Each file line reads `<path> | <N> <symbols>`. The share of `+` among the
/// `+`/`-` symbols apportions N between insertions and deletions. Binary
/// entries count as touched files with no lines. The trailing summary line
/// has no `|` and is ignored. Renames are recorded under their new path.
pub fn parse_stat_output(output: &str) -> DiffStat {
    let mut stat = DiffStat::default();

    for line in output.lines() {
        let Some((path, detail)) = line.rsplit_once(FIELD_SEPARATOR) else {
            continue;
        };
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        stat.files.push(resolve_rename(path));

        let detail = detail.trim();
        let mut parts = detail.splitn(2, char::is_whitespace);
        let Some(total) = parts.next().and_then(|n| n.parse::<usize>().ok()) else {
            continue;
        };
        let symbols = parts.next().unwrap_or("");
        let (insertions, deletions) = apportion(total, symbols);
        stat.insertions += insertions;
        stat.deletions += deletions;
    }

    stat
}

/// Destination path of a `--stat` rename entry.
///
/// Handles both `old.rs => new.rs` and the compact `src/{old => new}/a.rs`
/// form. Paths without `=>` are returned unchanged.
fn resolve_rename(path: &str) -> String {
    const ARROW: &str = " => ";

    if let Some((prefix, rest)) = path.split_once('{') {
        if let Some((inner, suffix)) = rest.split_once('}') {
            if let Some((_, new)) = inner.split_once(ARROW) {
                // An empty side leaves a doubled separator behind.
                return format!("{}{}{}", prefix, new, suffix).replace("//", "/");
            }
        }
    }

    match path.split_once(ARROW) {
        Some((_, new)) => new.trim().to_string(),
        None => path.to_string(),
    }
}

/// Split `total` changed lines by the ratio of `+` to `-` symbols.
fn apportion(total: usize, symbols: &str) -> (usize, usize) {
    let plus = symbols.chars().filter(|c| *c == '+').count();
    let minus = symbols.chars().filter(|c| *c == '-').count();

    if plus + minus == 0 {
        return (total, 0);
    }

    let insertions = (total as f64 * plus as f64 / (plus + minus) as f64).round() as usize;
    let insertions = insertions.min(total);
    (insertions, total - insertions)
}
