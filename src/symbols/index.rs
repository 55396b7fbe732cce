use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{qualify_reference, split_qualified, SymbolEnvironment};
use crate::core::Result;
use crate::language::{Go, LanguageSupport};
use crate::parser::{GoParser, Outline};

/// A type declaration with its embedded types, all fully qualified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub qualified: String,
    pub embedded: Vec<String>,
}

/// Snapshot of the type declarations of a Go module
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    module_root: Option<PathBuf>,
    module_path: Option<String>,
    entries: HashMap<String, TypeEntry>,
    by_simple: HashMap<String, Vec<String>>,
    embedded_by: HashMap<String, Vec<String>>,
}

impl TypeIndex {
    /// Build an index from `(qualified name, embedded qualified names)` pairs
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for (qualified, embedded) in entries {
            index.insert(TypeEntry {
                qualified: qualified.into(),
                embedded: embedded.into_iter().map(Into::into).collect(),
            });
        }
        index
    }

    /// Scan every `.go` file below `root`
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let (module_root, module_path) = match find_go_mod(root) {
            Some((dir, module)) => (dir, Some(module)),
            None => (root.to_path_buf(), None),
        };

        let mut index = Self {
            module_root: Some(module_root.clone()),
            module_path,
            ..Self::default()
        };
        let mut parser = GoParser::new()?;
        let language = Go::new();

        let walker = WalkDir::new(&module_root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0 || !(name.starts_with('.') || name == "vendor" || name == "testdata")
        });

        let mut files = 0usize;
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            let is_source = path.extension().is_some_and(|ext| ext == "go")
                && !path.to_string_lossy().ends_with("_test.go");
            if !entry.file_type().is_file() || !is_source {
                continue;
            }

            let (source, tree) = match parser.parse_file(path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let outline = Outline::read(&tree, &source, &language);
            let Some(package) = index.package_for(path) else {
                continue;
            };
            index.add_outline(&package, &outline, &language);
            files += 1;
        }

        debug!(
            "Indexed {} types from {} files under {}",
            index.entries.len(),
            files,
            module_root.display()
        );
        Ok(index)
    }

    /// Import path of the package containing `file`
    pub fn package_for(&self, file: &Path) -> Option<String> {
        let dir = file.parent()?;
        let module_root = self.module_root.as_ref()?;
        let relative = dir.strip_prefix(module_root).ok()?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let base = self.module_path.clone().or_else(|| {
            module_root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })?;
        if relative.is_empty() {
            Some(base)
        } else {
            Some(format!("{}/{}", base, relative))
        }
    }

    /// Record the type declarations of one parsed file
    pub fn add_outline(&mut self, package: &str, outline: &Outline, language: &dyn LanguageSupport) {
        for decl in outline.type_decls() {
            let embedded = decl
                .embedded
                .iter()
                .filter_map(|type_ref| qualify_reference(outline, language, Some(package), type_ref))
                .collect();
            self.insert(TypeEntry {
                qualified: format!("{}.{}", package, decl.name),
                embedded,
            });
        }
    }

    fn insert(&mut self, entry: TypeEntry) {
        let (_, simple) = split_qualified(&entry.qualified);
        let names = self.by_simple.entry(simple.to_string()).or_default();
        if !names.contains(&entry.qualified) {
            names.push(entry.qualified.clone());
        }
        for embedded in &entry.embedded {
            self.embedded_by
                .entry(embedded.clone())
                .or_default()
                .push(entry.qualified.clone());
        }
        self.entries.insert(entry.qualified.clone(), entry);
    }

    pub fn get(&self, qualified: &str) -> Option<&TypeEntry> {
        self.entries.get(qualified)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }
}

impl SymbolEnvironment for TypeIndex {
    fn type_exists(&self, name: &str) -> bool {
        self.entries.contains_key(name) || self.by_simple.contains_key(name)
    }

    fn resolve_type(&self, simple_name: &str, context_package: Option<&str>) -> Option<String> {
        let candidates = self.by_simple.get(simple_name)?;
        if let Some(package) = context_package {
            let local = format!("{}.{}", package, simple_name);
            if candidates.contains(&local) {
                return Some(local);
            }
        }
        match candidates.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        }
    }

    fn subtypes_of(&self, base: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([base]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if self.entries.contains_key(current) {
                out.push(current.to_string());
            }
            if let Some(children) = self.embedded_by.get(current) {
                queue.extend(children.iter().map(String::as_str));
            }
        }

        out.sort();
        out
    }

    fn embedded_types(&self, qualified: &str) -> Vec<String> {
        self.entries
            .get(qualified)
            .map(|entry| entry.embedded.clone())
            .unwrap_or_default()
    }
}

/// Nearest `go.mod` at or above `start`, with its module path
fn find_go_mod(start: &Path) -> Option<(PathBuf, String)> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join("go.mod");
        if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate).ok()?;
            let module = content.lines().find_map(|line| {
                line.trim()
                    .strip_prefix("module")
                    .map(|rest| rest.trim().trim_matches('"').to_string())
            })?;
            return Some((current.to_path_buf(), module));
        }
        dir = current.parent();
    }
    None
}
