use super::executor::ToolExecutor;
use super::registry::{ToolDefinition, ToolRegistry};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_LIST_DEPTH: usize = 3;

#[derive(Deserialize)]
struct ReadFileInput {
    path: String,
    start_line: Option<usize>,
    end_line: Option<usize>,
    max_lines: Option<usize>,
}

#[derive(Deserialize)]
struct ListFilesInput {
    path: Option<String>,
    #[serde(default)]
    recursive: bool,
    max_depth: Option<usize>,
    #[serde(default)]
    include_hidden: bool,
}

#[derive(Deserialize)]
struct WriteFileInput {
    path: String,
    content: String,
    #[serde(default)]
    append: bool,
}

#[derive(Deserialize)]
struct EditFileInput {
    path: String,
    old_str: String,
    #[serde(default)]
    new_str: String,
}

#[derive(Deserialize)]
struct SearchFileInput {
    path: String,
    query: String,
    #[serde(default)]
    is_regex: bool,
    #[serde(default)]
    case_sensitive: bool,
    line: Option<usize>,
}

#[derive(Deserialize)]
struct GlobInput {
    pattern: String,
    path: Option<String>,
}

#[derive(Deserialize)]
struct ShellInput {
    command: String,
    directory: Option<String>,
}

fn parse_input<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T> {
    serde_json::from_value(args.clone()).with_context(|| format!("invalid arguments for {tool}"))
}

/// The standard tool set, every tool sandboxed to `working_dir`.
pub fn builtin_registry(working_dir: PathBuf) -> Result<ToolRegistry> {
    let executor = Arc::new(ToolExecutor::new(working_dir));
    ToolRegistry::new(vec![
        read_file(Arc::clone(&executor)),
        list_files(Arc::clone(&executor)),
        write_file(Arc::clone(&executor)),
        edit_file(Arc::clone(&executor)),
        search_file(Arc::clone(&executor)),
        glob(Arc::clone(&executor)),
        run_shell_command(executor),
    ])
}

fn read_file(executor: Arc<ToolExecutor>) -> ToolDefinition {
    ToolDefinition::new(
        "read_file",
        "Read the contents of a relative file path, either whole or a 1-based inclusive line range. Do not use this with directory names.",
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative path of a file in the working directory." },
                "start_line": { "type": "integer", "description": "First line to read (1-indexed). Defaults to 1." },
                "end_line": { "type": "integer", "description": "Last line to read (inclusive). Defaults to the end of the file." },
                "max_lines": { "type": "integer", "description": "Maximum number of lines to read. Defaults to 1000." }
            },
            "required": ["path"]
        }),
        move |_, args| {
            let input: ReadFileInput = parse_input("read_file", args)?;
            executor.read_file(&input.path, input.start_line, input.end_line, input.max_lines)
        },
    )
}

fn list_files(executor: Arc<ToolExecutor>) -> ToolDefinition {
    ToolDefinition::new(
        "list_files",
        "List files and directories at a relative path. Directories end with '/'. Defaults to the working directory.",
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative directory to list. Defaults to '.'." },
                "recursive": { "type": "boolean", "description": "Descend into subdirectories. Defaults to false." },
                "max_depth": { "type": "integer", "description": "Depth limit when recursive. Defaults to 3." },
                "include_hidden": { "type": "boolean", "description": "Include dotfiles. Defaults to false." }
            }
        }),
        move |_, args| {
            let input: ListFilesInput = parse_input("list_files", args)?;
            executor.list_files(
                input.path.as_deref(),
                input.recursive,
                input.max_depth.unwrap_or(DEFAULT_LIST_DEPTH),
                input.include_hidden,
            )
        },
    )
}

fn write_file(executor: Arc<ToolExecutor>) -> ToolDefinition {
    ToolDefinition::new(
        "write_file",
        "Create, overwrite, or append to a file. Parent directories are created as needed.",
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative path of the file to write." },
                "content": { "type": "string", "description": "Content to write." },
                "append": { "type": "boolean", "description": "Append instead of overwrite. Defaults to false." }
            },
            "required": ["path", "content"]
        }),
        move |_, args| {
            let input: WriteFileInput = parse_input("write_file", args)?;
            executor.write_file(&input.path, &input.content, input.append)
        },
    )
}

fn edit_file(executor: Arc<ToolExecutor>) -> ToolDefinition {
    ToolDefinition::new(
        "edit_file",
        "Replace every occurrence of old_str with new_str in a file. old_str must be non-empty and differ from new_str.",
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative path of the file to edit." },
                "old_str": { "type": "string", "description": "Exact text to search for." },
                "new_str": { "type": "string", "description": "Replacement text." }
            },
            "required": ["path", "old_str", "new_str"]
        }),
        move |_, args| {
            let input: EditFileInput = parse_input("edit_file", args)?;
            executor.edit_file(&input.path, &input.old_str, &input.new_str)
        },
    )
}

fn search_file(executor: Arc<ToolExecutor>) -> ToolDefinition {
    ToolDefinition::new(
        "search_file",
        "Search a file for a string or regex pattern. Returns matching lines with their line numbers as JSON.",
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative path of the file to search." },
                "query": { "type": "string", "description": "String or regex pattern to search for." },
                "is_regex": { "type": "boolean", "description": "Treat the query as a regular expression. Defaults to false." },
                "case_sensitive": { "type": "boolean", "description": "Case-sensitive matching. Defaults to false." },
                "line": { "type": "integer", "description": "Only search this line number." }
            },
            "required": ["path", "query"]
        }),
        move |_, args| {
            let input: SearchFileInput = parse_input("search_file", args)?;
            executor.search_file(
                &input.path,
                &input.query,
                input.is_regex,
                input.case_sensitive,
                input.line,
            )
        },
    )
}

fn glob(executor: Arc<ToolExecutor>) -> ToolDefinition {
    ToolDefinition::new(
        "glob",
        "Find files whose relative path matches a glob pattern such as 'src/**/*.rs'.",
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Glob pattern; '**' matches across directories." },
                "path": { "type": "string", "description": "Relative directory to search from. Defaults to '.'." }
            },
            "required": ["pattern"]
        }),
        move |_, args| {
            let input: GlobInput = parse_input("glob", args)?;
            executor.glob(&input.pattern, input.path.as_deref())
        },
    )
}

fn run_shell_command(executor: Arc<ToolExecutor>) -> ToolDefinition {
    ToolDefinition::new(
        "run_shell_command",
        "Execute a shell command with sh -c and return stdout, stderr and the exit code as JSON. Only use it with trusted commands.",
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "The shell command to execute." },
                "directory": { "type": "string", "description": "Relative directory to run in. Defaults to '.'." }
            },
            "required": ["command"]
        }),
        move |cancel, args| {
            let input: ShellInput = parse_input("run_shell_command", args)?;
            executor.run_shell_command(&input.command, input.directory.as_deref(), cancel)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn builtin_registry_declares_every_tool_once() {
        let temp = TempDir::new().expect("temp dir");
        let registry = builtin_registry(temp.path().to_path_buf()).expect("registry");
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "read_file",
                "list_files",
                "write_file",
                "edit_file",
                "search_file",
                "glob",
                "run_shell_command"
            ]
        );
        for declaration in registry.declarations() {
            assert_eq!(declaration.parameters["type"], "object");
        }
    }

    #[test]
    fn malformed_arguments_are_reported_as_errors() {
        let temp = TempDir::new().expect("temp dir");
        let registry = builtin_registry(temp.path().to_path_buf()).expect("registry");
        let tool = registry.get("read_file").expect("read_file");

        let err = tool
            .invoke(&CancellationToken::new(), &json!({"path": 42}))
            .expect_err("wrong type");
        assert!(err.to_string().contains("invalid arguments for read_file"));
    }

    #[test]
    fn write_then_read_through_registry() {
        let temp = TempDir::new().expect("temp dir");
        let registry = builtin_registry(temp.path().to_path_buf()).expect("registry");
        let cancel = CancellationToken::new();

        registry
            .get("write_file")
            .expect("write_file")
            .invoke(&cancel, &json!({"path": "a/b.txt", "content": "hello"}))
            .expect("write");
        let read = registry
            .get("read_file")
            .expect("read_file")
            .invoke(&cancel, &json!({"path": "a/b.txt"}))
            .expect("read");
        assert_eq!(read, "hello");
    }
}
