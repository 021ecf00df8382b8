use std::fs;
use std::path::Path;

/// Directories that say nothing about the project layout
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    "target",
    "dist",
    "build",
    ".next",
];

/// Root is level 0
const MAX_DEPTH: usize = 2;

const MAX_FILES_PER_DIR: usize = 10;

/// Manifests that characterize the tech stack, in reporting order
const MANIFESTS: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "go.mod",
    "Cargo.toml",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "composer.json",
];

const MAX_MANIFEST_CHARS: usize = 2000;

/// Indented listing of the directories and files under `root`
pub fn repo_structure(root: &Path) -> String {
    let mut lines = Vec::new();
    let name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| ".".to_owned());
    walk(root, &name, 0, &mut lines);
    lines.join("\n")
}

fn walk(dir: &Path, name: &str, level: usize, lines: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {
                if !EXCLUDED_DIRS.contains(&entry_name.as_str()) {
                    subdirs.push(entry_name);
                }
            }
            Ok(_) => files.push(entry_name),
            Err(_) => {}
        }
    }
    subdirs.sort();
    files.sort();

    let indent = " ".repeat(4 * level);
    let sub_indent = " ".repeat(4 * (level + 1));
    lines.push(format!("{indent}{name}/"));
    for file in files.iter().take(MAX_FILES_PER_DIR) {
        lines.push(format!("{sub_indent}{file}"));
    }
    if files.len() > MAX_FILES_PER_DIR {
        lines.push(format!(
            "{sub_indent}... (+{} more)",
            files.len() - MAX_FILES_PER_DIR
        ));
    }

    if level < MAX_DEPTH {
        for subdir in subdirs {
            walk(&dir.join(&subdir), &subdir, level + 1, lines);
        }
    }
}

/// Labeled excerpts of the dependency manifests found in `root`, if any
pub fn dependencies(root: &Path) -> Option<String> {
    let blocks: Vec<String> = MANIFESTS
        .iter()
        .filter_map(|name| {
            let content = fs::read_to_string(root.join(name)).ok()?;
            let excerpt: String = content.chars().take(MAX_MANIFEST_CHARS).collect();
            Some(format!("--- {name} ---\n{excerpt}"))
        })
        .collect();

    (!blocks.is_empty()).then(|| blocks.join("\n\n"))
}
