use aho_corasick::AhoCorasick;
use anyhow::{bail, Context, Result};
use globset::GlobBuilder;
use regex::RegexBuilder;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const DEFAULT_MAX_READ_LINES: usize = 1000;
const MAX_LIST_ENTRIES: usize = 1000;
const MAX_GLOB_MATCHES: usize = 500;
const MAX_SEARCH_MATCHES: usize = 500;

/// File operations confined to one working directory.
///
/// Every path argument is relative to that directory. Absolute paths, `..`
/// components and symlinks that lead outside are rejected before any I/O.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    working_dir: PathBuf,
    canonical_working_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct SearchMatch<'a> {
    line_number: usize,
    line: &'a str,
}

impl ToolExecutor {
    pub fn new(working_dir: PathBuf) -> Self {
        let canonical_working_dir =
            fs::canonicalize(&working_dir).unwrap_or_else(|_| working_dir.clone());
        Self {
            working_dir,
            canonical_working_dir,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub(crate) fn resolve_path(&self, path: &str) -> Result<PathBuf> {
        let path = path.trim();
        if path.is_empty() {
            bail!("Path cannot be empty");
        }
        if path.starts_with('/') || path.contains('\\') {
            bail!("Security error: absolute or platform-specific path not allowed: {path}");
        }

        let relative_path = Path::new(path);
        if relative_path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            bail!("Security error: path traversal detected: {path}");
        }

        let requested: PathBuf = self
            .working_dir
            .join(relative_path)
            .components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect();
        self.ensure_path_is_within_workspace(&requested)?;
        Ok(requested)
    }

    pub(crate) fn resolve_optional_path(&self, path: Option<&str>) -> Result<PathBuf> {
        match path.and_then(non_empty_trimmed) {
            None | Some(".") => Ok(self.working_dir.clone()),
            Some(value) => self.resolve_path(value),
        }
    }

    fn ensure_path_is_within_workspace(&self, path: &Path) -> Result<()> {
        let mut guard_path = path;
        while !guard_path.exists() {
            guard_path = guard_path
                .parent()
                .context("Security error: could not find an existing parent path")?;
        }

        let canonical_guard = fs::canonicalize(guard_path)
            .with_context(|| format!("Failed to canonicalize {}", guard_path.display()))?;
        if !canonical_guard.starts_with(&self.canonical_working_dir) {
            bail!(
                "Security error: path escapes working directory via symlink or traversal: {}",
                path.display()
            );
        }
        Ok(())
    }

    fn display_relative(&self, path: &Path, root: &Path) -> String {
        path.strip_prefix(root)
            .or_else(|_| path.strip_prefix(&self.working_dir))
            .map(|relative| relative.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| path.to_string_lossy().to_string())
    }

    /// Reads a whole file or an inclusive, 1-based line range of it.
    pub fn read_file(
        &self,
        path: &str,
        start_line: Option<usize>,
        end_line: Option<usize>,
        max_lines: Option<usize>,
    ) -> Result<String> {
        let resolved = self.resolve_path(path)?;
        let content = fs::read_to_string(&resolved)
            .with_context(|| format!("Failed to read file {path}"))?;
        let lines: Vec<&str> = content.split('\n').collect();
        let max_lines = max_lines
            .filter(|max| *max > 0)
            .unwrap_or(DEFAULT_MAX_READ_LINES);

        let start = start_line.filter(|start| *start > 0).unwrap_or(1);
        let end = end_line
            .filter(|end| *end > 0 && *end <= lines.len())
            .unwrap_or(lines.len());

        if start > lines.len() {
            bail!(
                "start_line ({start}) is greater than the total number of lines ({})",
                lines.len()
            );
        }
        if start > end {
            bail!("start line {start} is greater than end line {end}");
        }
        if end - start + 1 > max_lines {
            bail!("cannot read more than {max_lines} lines at once; pass start_line/end_line");
        }

        Ok(lines[start - 1..end].join("\n"))
    }

    pub fn write_file(&self, path: &str, content: &str, append: bool) -> Result<String> {
        let resolved = self.resolve_path(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).context("Failed to create parent directory")?;
        }
        let (chars, lines) = text_stats(content);

        if append {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&resolved)
                .with_context(|| format!("Failed to open {path} for appending"))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to append to {path}"))?;
            return Ok(format!("Appended to {path} ({chars} chars, {lines} lines)."));
        }

        fs::write(&resolved, content).with_context(|| format!("Failed to write file {path}"))?;
        Ok(format!("Wrote {path} ({chars} chars, {lines} lines)."))
    }

    /// Replaces every occurrence of `old_str`. Zero matches is reported, not
    /// treated as a failure.
    pub fn edit_file(&self, path: &str, old_str: &str, new_str: &str) -> Result<String> {
        if old_str.is_empty() {
            bail!("edit_file requires a non-empty old_str");
        }
        if old_str == new_str {
            bail!("old_str and new_str must be different");
        }

        let resolved = self.resolve_path(path)?;
        let content =
            fs::read_to_string(&resolved).with_context(|| format!("Failed to read file {path}"))?;

        let replacements = content.matches(old_str).count();
        if replacements == 0 {
            return Ok("No occurrences of `old_str` found. No changes made to the file.".to_string());
        }

        let new_content = content.replace(old_str, new_str);
        fs::write(&resolved, new_content).with_context(|| format!("Failed to edit file {path}"))?;
        Ok(format!(
            "OK. Edited {path} successfully. Made {replacements} replacement(s)."
        ))
    }

    pub fn list_files(
        &self,
        path: Option<&str>,
        recursive: bool,
        max_depth: usize,
        include_hidden: bool,
    ) -> Result<String> {
        let root = self.resolve_optional_path(path)?;
        if root.is_file() {
            return Ok(self.display_relative(&root, &self.working_dir));
        }
        if !root.is_dir() {
            bail!("Directory not found: {}", path.unwrap_or("."));
        }

        let depth = if recursive { max_depth.max(1) } else { 1 };
        let mut entries = Vec::new();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !should_skip_entry(entry, include_hidden));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
            let mut display = self.display_relative(entry.path(), &root);
            if entry.file_type().is_dir() {
                display.push('/');
            }
            entries.push(display);
            if entries.len() >= MAX_LIST_ENTRIES {
                entries.push(format!("... (truncated at {MAX_LIST_ENTRIES} entries)"));
                break;
            }
        }

        if entries.is_empty() {
            Ok("(no files found)".to_string())
        } else {
            Ok(entries.join("\n"))
        }
    }

    /// Line search inside one file. Results are a JSON array of
    /// `{line_number, line}` objects.
    pub fn search_file(
        &self,
        path: &str,
        query: &str,
        is_regex: bool,
        case_sensitive: bool,
        line: Option<usize>,
    ) -> Result<String> {
        if query.is_empty() {
            bail!("search_file requires a non-empty 'query' field");
        }
        let resolved = self.resolve_path(path)?;
        let content =
            fs::read_to_string(&resolved).with_context(|| format!("Failed to read file {path}"))?;

        let matcher: Box<dyn Fn(&str) -> bool> = if is_regex {
            let regex = RegexBuilder::new(query)
                .case_insensitive(!case_sensitive)
                .build()
                .context("invalid regular expression")?;
            Box::new(move |text: &str| regex.is_match(text))
        } else {
            let automaton = AhoCorasick::builder()
                .ascii_case_insensitive(!case_sensitive)
                .build([query])
                .context("invalid search query")?;
            Box::new(move |text: &str| automaton.is_match(text))
        };

        let matches: Vec<SearchMatch<'_>> = content
            .split('\n')
            .enumerate()
            .map(|(idx, text)| (idx + 1, text))
            .filter(|(number, _)| line.map_or(true, |wanted| wanted == *number))
            .filter(|(_, text)| matcher(text))
            .take(MAX_SEARCH_MATCHES)
            .map(|(line_number, line)| SearchMatch { line_number, line })
            .collect();

        serde_json::to_string_pretty(&matches).context("failed to encode search results")
    }

    /// Finds files under `path` whose relative path matches `pattern`.
    /// `*` stays within one directory level; `**` crosses levels.
    pub fn glob(&self, pattern: &str, path: Option<&str>) -> Result<String> {
        let pattern = non_empty_trimmed(pattern).context("glob requires a non-empty 'pattern'")?;
        let root = self.resolve_optional_path(path)?;
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();

        let mut found = Vec::new();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");
        for entry in walker.filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = self.display_relative(entry.path(), &root);
            if matcher.is_match(&relative) {
                found.push(relative);
                if found.len() >= MAX_GLOB_MATCHES {
                    break;
                }
            }
        }

        if found.is_empty() {
            return Ok(format!("No files found matching pattern: {pattern}"));
        }
        let listing: Vec<String> = found.iter().map(|file| format!("- {file}")).collect();
        Ok(format!(
            "Found {} file(s):\n{}",
            found.len(),
            listing.join("\n")
        ))
    }
}

pub(crate) fn non_empty_trimmed(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn text_stats(text: &str) -> (usize, usize) {
    (text.chars().count(), text.lines().count())
}

fn should_skip_entry(entry: &DirEntry, include_hidden: bool) -> bool {
    let name = entry.file_name().to_string_lossy();
    if !include_hidden && name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && matches!(name.as_ref(), "target" | "node_modules" | ".git")
}
