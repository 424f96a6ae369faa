//! Ignore policies consulted before a directory child is visited.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::Match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

pub const GISTCTX_IGNORE: &str = ".gistctxignore";

/// Predicate marking a path as excluded from content collection.
pub trait IgnorePolicy: Send + Sync {
    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool;
}

/// Version-control ignore rules: `.gitignore` files between the repository root and the
/// path, `.git/info/exclude` and the user's global excludes file.
///
/// The repository is found from the path being checked, so files collected from outside the
/// working directory still honour their own repository's rules.
pub struct VcsIgnore {
    fixed_root: Option<PathBuf>,
    global: OnceCell<Option<Gitignore>>,
    roots: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
    cache: Mutex<HashMap<PathBuf, Option<Arc<Gitignore>>>>,
}

impl Default for VcsIgnore {
    fn default() -> Self {
        Self::discover()
    }
}

impl VcsIgnore {
    /// Find the enclosing git repository of every checked path. Outside a repository nothing
    /// is ignored.
    pub fn discover() -> Self {
        Self {
            fixed_root: None,
            global: OnceCell::new(),
            roots: Mutex::new(HashMap::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Use `root` as the repository root without consulting git or global excludes.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            fixed_root: Some(fs::canonicalize(&root).unwrap_or(root)),
            global: OnceCell::with_value(None),
            roots: Mutex::new(HashMap::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Work tree root of the repository containing `path`, if any.
    ///
    /// A directory holding a `.git` entry that git itself cannot open still counts as a root.
    pub fn repository_root(&self, path: &Path) -> Option<PathBuf> {
        if let Some(root) = &self.fixed_root {
            return Some(root.clone());
        }
        let path = normalize(path);
        let dir = path.parent().unwrap_or(&path).to_path_buf();
        if let Some(cached) = self.roots.lock().get(&dir) {
            return cached.clone();
        }

        let root = match gix::discover(&dir) {
            Ok(repo) => repo.work_dir().map(Path::to_path_buf),
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "git discovery failed, looking for a .git marker");
                dir.ancestors()
                    .find(|candidate| candidate.join(".git").exists())
                    .map(Path::to_path_buf)
            }
        }
        .map(|root| fs::canonicalize(&root).unwrap_or(root));
        tracing::debug!(dir = %dir.display(), root = ?root, "vcs ignore root");

        self.roots.lock().insert(dir, root.clone());
        root
    }

    fn global(&self) -> Option<&Gitignore> {
        self.global
            .get_or_init(|| {
                let (global, err) = Gitignore::global();
                if let Some(err) = err {
                    tracing::debug!(error = %err, "failed to load global gitignore");
                }
                (!global.is_empty()).then_some(global)
            })
            .as_ref()
    }

    fn matcher_for(&self, root: &Path, dir: &Path) -> Option<Arc<Gitignore>> {
        if let Some(cached) = self.cache.lock().get(dir) {
            return cached.clone();
        }

        let mut builder = GitignoreBuilder::new(dir);
        let mut found = false;
        let mut sources = vec![dir.join(".gitignore")];
        if dir == root {
            sources.push(root.join(".git").join("info").join("exclude"));
        }
        for source in sources.iter().filter(|source| source.is_file()) {
            if let Some(err) = builder.add(source) {
                tracing::warn!(path = %source.display(), error = %err, "invalid ignore rule");
            }
            found = true;
        }

        let matcher = if found {
            match builder.build() {
                Ok(gitignore) => Some(Arc::new(gitignore)),
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "failed to build gitignore");
                    None
                }
            }
        } else {
            None
        };

        self.cache.lock().insert(dir.to_path_buf(), matcher.clone());
        matcher
    }
}

impl IgnorePolicy for VcsIgnore {
    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let Some(root) = self.repository_root(path) else {
            return false;
        };
        let path = normalize(path);
        let Ok(relative) = path.strip_prefix(&root) else {
            return false;
        };
        if relative.components().next().is_some_and(|first| first.as_os_str() == ".git") {
            return true;
        }

        let mut ignored = self
            .global()
            .is_some_and(|global| global.matched(relative, is_dir).is_ignore());

        // Deeper .gitignore files override shallower ones.
        let mut dir = root.to_path_buf();
        let parents = relative.parent().into_iter().flat_map(Path::components);
        for component in std::iter::once(None).chain(parents.map(Some)) {
            if let Some(component) = component {
                dir.push(component);
            }
            if let Some(matcher) = self.matcher_for(&root, &dir) {
                match matcher.matched(&path, is_dir) {
                    Match::Ignore(_) => ignored = true,
                    Match::Whitelist(_) => ignored = false,
                    Match::None => {}
                }
            }
        }
        ignored
    }
}

/// Name-based ignore rules in the spirit of an IDE's "ignored files and folders" list.
#[derive(Debug, Clone)]
pub struct FileTypeIgnore {
    globs: GlobSet,
}

impl FileTypeIgnore {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            add_pattern(&mut builder, pattern.as_ref())?;
        }
        let globs = builder.build().context("failed to build file type matcher")?;
        Ok(Self { globs })
    }

    /// Build from configured patterns plus a `.gistctxignore` file in `dir`, if present.
    pub fn with_ignore_file<S: AsRef<str>>(patterns: &[S], dir: &Path) -> Result<Self> {
        let mut all: Vec<String> = patterns.iter().map(|p| p.as_ref().to_owned()).collect();
        all.extend(load_gistctxignore(dir)?);
        all.push(GISTCTX_IGNORE.to_owned());
        Self::new(&all)
    }
}

impl IgnorePolicy for FileTypeIgnore {
    fn is_ignored(&self, path: &Path, _is_dir: bool) -> bool {
        path.file_name()
            .is_some_and(|name| self.globs.is_match(Path::new(name)))
    }
}

/// Canonicalize `path`, falling back to its canonical parent for paths that do not exist.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn add_pattern(builder: &mut GlobSetBuilder, raw: &str) -> Result<()> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(());
    }
    let glob = Glob::new(trimmed).with_context(|| format!("invalid ignore pattern '{raw}'"))?;
    builder.add(glob);
    Ok(())
}

fn load_gistctxignore(dir: &Path) -> Result<Vec<String>> {
    let path = dir.join(GISTCTX_IGNORE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut patterns = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        patterns.push(trimmed.to_owned());
    }
    Ok(patterns)
}
