//! Collecting named blobs from an editor snapshot or a set of files.

use std::io;
use std::path::Path;

use anyhow::Result;

use crate::domain::model::{EditorSnapshot, NamedBlob, SelectionSource};
use crate::infra::config::Config;
use crate::infra::fs::{FileSystem, LocalFileSystem};
use crate::infra::ignore::{FileTypeIgnore, IgnorePolicy, VcsIgnore};

/// Receives per-file failures that were skipped during collection.
pub trait DiagnosticSink: Send + Sync {
    fn on_unreadable_file(&self, path: &Path, cause: &io::Error);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Path, &io::Error) + Send + Sync,
{
    fn on_unreadable_file(&self, path: &Path, cause: &io::Error) {
        self(path, cause)
    }
}

/// Sink that only relies on the `warn!` emitted by the collector itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn on_unreadable_file(&self, _path: &Path, _cause: &io::Error) {}
}

/// Turns a [`SelectionSource`] into upload-ready [`NamedBlob`]s.
///
/// Directory contents are flattened into a single name space: each directory level adds
/// `<dir name>_` in front of the names of the files below it, so `root/sub/b.txt` collected
/// from `root` becomes `root_sub_b.txt`. Files with empty or whitespace-only contents are
/// dropped, as are directory children rejected by any ignore policy.
pub struct ContentCollector {
    fs: Box<dyn FileSystem>,
    ignore: Vec<Box<dyn IgnorePolicy>>,
    sink: Box<dyn DiagnosticSink>,
}

impl Default for ContentCollector {
    fn default() -> Self {
        Self::new(LocalFileSystem)
    }
}

impl ContentCollector {
    pub fn new(fs: impl FileSystem + 'static) -> Self {
        Self {
            fs: Box::new(fs),
            ignore: Vec::new(),
            sink: Box::new(TracingSink),
        }
    }

    /// Local collector with the configured ignore policies. A `.gistctxignore` file is read
    /// from `workspace`; VCS rules come from whichever repository holds each collected path.
    pub fn from_config(config: &Config, workspace: &Path) -> Result<Self> {
        let mut collector = Self::new(LocalFileSystem);
        if config.ignore.vcs() {
            collector = collector.with_ignore_policy(VcsIgnore::discover());
        }
        let file_types = FileTypeIgnore::with_ignore_file(&config.ignore.file_types, workspace)?;
        Ok(collector.with_ignore_policy(file_types))
    }

    pub fn with_ignore_policy(mut self, policy: impl IgnorePolicy + 'static) -> Self {
        self.ignore.push(Box::new(policy));
        self
    }

    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Collect every eligible blob for `source`.
    pub fn collect(&self, source: &SelectionSource) -> Vec<NamedBlob> {
        match source {
            SelectionSource::Editor(editor) => from_editor(editor).into_iter().collect(),
            SelectionSource::FileList(paths) => paths
                .iter()
                .flat_map(|path| self.resolve(path, None))
                .collect(),
            SelectionSource::SingleFile(path) => self.resolve(path, None),
        }
    }

    /// Resolve a single file or directory with an optional name prefix.
    pub fn resolve(&self, path: &Path, prefix: Option<&str>) -> Vec<NamedBlob> {
        let mut blobs = Vec::new();
        self.resolve_into(path, prefix.unwrap_or_default(), &mut blobs);
        blobs
    }

    fn resolve_into(&self, path: &Path, prefix: &str, out: &mut Vec<NamedBlob>) {
        if self.fs.is_directory(path) {
            self.resolve_directory(path, prefix, out);
            return;
        }

        let text = match self.fs.read_text(path) {
            Ok(text) => text,
            Err(err) => {
                self.report_unreadable(path, &err);
                return;
            }
        };
        if is_blank(&text) {
            return;
        }

        let name = format!("{prefix}{}", self.fs.simple_name(path));
        out.push(NamedBlob { name, text });
    }

    fn resolve_directory(&self, dir: &Path, prefix: &str, out: &mut Vec<NamedBlob>) {
        let children = match self.fs.list_children(dir) {
            Ok(children) => children,
            Err(err) => {
                self.report_unreadable(dir, &err);
                return;
            }
        };

        let prefix = format!("{prefix}{}_", self.fs.simple_name(dir));
        tracing::debug!(dir = %dir.display(), %prefix, children = children.len(), "collecting directory");
        for child in &children {
            let is_dir = self.fs.is_directory(child);
            if self.is_ignored(child, is_dir) {
                tracing::debug!(path = %child.display(), "skipping ignored entry");
                continue;
            }
            self.resolve_into(child, &prefix, out);
        }
    }

    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.ignore
            .iter()
            .any(|policy| policy.is_ignored(path, is_dir))
    }

    fn report_unreadable(&self, path: &Path, err: &io::Error) {
        tracing::warn!(path = %path.display(), error = %err, "couldn't read the contents of the file");
        self.sink.on_unreadable_file(path, err);
    }
}

fn from_editor(editor: &EditorSnapshot) -> Option<NamedBlob> {
    let text = editor
        .selected_text()
        .filter(|selection| !selection.is_empty())
        .unwrap_or_else(|| editor.document_text());
    if is_blank(text) {
        return None;
    }
    Some(NamedBlob::new(editor.file_name().unwrap_or_default(), text))
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{BTreeMap, HashSet};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::infra::fs::Charset;

    /// In-memory tree that records every read attempt.
    #[derive(Default)]
    struct MemoryFs {
        files: BTreeMap<PathBuf, Vec<u8>>,
        dirs: BTreeMap<PathBuf, Vec<PathBuf>>,
        broken: HashSet<PathBuf>,
        broken_dirs: HashSet<PathBuf>,
        reads: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl MemoryFs {
        fn dir(mut self, path: &str, children: &[&str]) -> Self {
            let path = PathBuf::from(path);
            let children = children.iter().map(|child| path.join(child)).collect();
            self.dirs.insert(path, children);
            self
        }

        fn file(mut self, path: &str, contents: &str) -> Self {
            self.files.insert(path.into(), contents.as_bytes().to_vec());
            self
        }

        fn broken(mut self, path: &str) -> Self {
            self.broken.insert(path.into());
            self
        }

        fn broken_dir(mut self, path: &str) -> Self {
            self.broken_dirs.insert(path.into());
            self
        }
    }

    impl FileSystem for MemoryFs {
        fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.reads.lock().push(path.to_path_buf());
            if self.broken.contains(path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }

        fn detect_charset(&self, _path: &Path, bytes: &[u8]) -> Charset {
            Charset::detect(bytes)
        }

        fn list_children(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
            if self.broken_dirs.contains(dir) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            Ok(self.dirs.get(dir).cloned().unwrap_or_default())
        }

        fn is_directory(&self, path: &Path) -> bool {
            self.dirs.contains_key(path)
        }
    }

    struct NamedIgnore(&'static str);

    impl IgnorePolicy for NamedIgnore {
        fn is_ignored(&self, path: &Path, _is_dir: bool) -> bool {
            path.file_name().is_some_and(|name| name == self.0)
        }
    }

    fn sample_tree() -> MemoryFs {
        MemoryFs::default()
            .dir("root", &["a.txt", "sub"])
            .dir("root/sub", &["b.txt"])
            .file("root/a.txt", "x")
            .file("root/sub/b.txt", "y")
    }

    fn recording_sink() -> (Arc<Mutex<Vec<PathBuf>>>, impl DiagnosticSink) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |path: &Path, _cause: &io::Error| seen.lock().push(path.to_path_buf())
        };
        (seen, sink)
    }

    #[test]
    fn editor_selection_becomes_single_blob() {
        let collector = ContentCollector::new(MemoryFs::default());
        let editor =
            EditorSnapshot::new("whole doc", Some("fn main() {}".into()), Some("main.rs".into()));
        let blobs = collector.collect(&SelectionSource::Editor(editor));
        assert_eq!(blobs, vec![NamedBlob::new("main.rs", "fn main() {}")]);
    }

    #[test]
    fn editor_without_file_uses_empty_name() {
        let collector = ContentCollector::new(MemoryFs::default());
        let editor = EditorSnapshot::new("doc", Some("snippet".into()), None);
        let blobs = collector.collect(&SelectionSource::Editor(editor));
        assert_eq!(blobs, vec![NamedBlob::new("", "snippet")]);
    }

    #[test]
    fn editor_falls_back_to_document_text() {
        let collector = ContentCollector::new(MemoryFs::default());
        for selection in [None, Some(String::new())] {
            let editor = EditorSnapshot::new("full document", selection, Some("notes.md".into()));
            let blobs = collector.collect(&SelectionSource::Editor(editor));
            assert_eq!(blobs, vec![NamedBlob::new("notes.md", "full document")]);
        }
    }

    #[test]
    fn blank_editor_text_yields_nothing() {
        let collector = ContentCollector::new(MemoryFs::default());
        let selected = EditorSnapshot::new("document", Some(" \n\t ".into()), None);
        assert!(collector.collect(&SelectionSource::Editor(selected)).is_empty());

        let empty_doc = EditorSnapshot::new("   ", None, Some("a.rs".into()));
        assert!(collector.collect(&SelectionSource::Editor(empty_doc)).is_empty());
    }

    #[test]
    fn directories_flatten_with_underscore_prefix() {
        let collector = ContentCollector::new(sample_tree());
        let blobs = collector.collect(&SelectionSource::SingleFile("root".into()));
        assert_eq!(
            blobs,
            vec![
                NamedBlob::new("root_a.txt", "x"),
                NamedBlob::new("root_sub_b.txt", "y"),
            ]
        );
    }

    #[test]
    fn single_file_uses_plain_name() {
        let collector = ContentCollector::new(sample_tree());
        let blobs = collector.collect(&SelectionSource::SingleFile("root/sub/b.txt".into()));
        assert_eq!(blobs, vec![NamedBlob::new("b.txt", "y")]);
    }

    #[test]
    fn blank_files_are_dropped_without_diagnostics() {
        let fs = MemoryFs::default()
            .dir("dir", &["empty.txt", "spaces.txt", "real.txt"])
            .file("dir/empty.txt", "")
            .file("dir/spaces.txt", "  \n ")
            .file("dir/real.txt", "content");
        let (seen, sink) = recording_sink();
        let collector = ContentCollector::new(fs).with_sink(sink);

        let blobs = collector.collect(&SelectionSource::SingleFile("dir".into()));
        assert_eq!(blobs, vec![NamedBlob::new("dir_real.txt", "content")]);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn ignored_entries_are_never_read() {
        let fs = sample_tree()
            .dir("root", &["a.txt", "sub", "skip.log", "target"])
            .dir("root/target", &["out.txt"])
            .file("root/skip.log", "log")
            .file("root/target/out.txt", "built");
        let reads = fs.reads.clone();
        let collector = ContentCollector::new(fs)
            .with_ignore_policy(NamedIgnore("target"))
            .with_ignore_policy(FileTypeIgnore::new(&["*.log"]).unwrap());

        let blobs = collector.collect(&SelectionSource::SingleFile("root".into()));
        let names: Vec<_> = blobs.iter().map(|blob| blob.name.as_str()).collect();
        assert_eq!(names, ["root_a.txt", "root_sub_b.txt"]);

        let reads = reads.lock();
        assert!(!reads.contains(&PathBuf::from("root/skip.log")));
        assert!(!reads.contains(&PathBuf::from("root/target/out.txt")));
    }

    #[test]
    fn unreadable_file_is_reported_and_siblings_continue() {
        let fs = MemoryFs::default()
            .dir("root", &["a.txt", "locked.txt", "z.txt"])
            .file("root/a.txt", "first")
            .file("root/locked.txt", "secret")
            .file("root/z.txt", "last")
            .broken("root/locked.txt");
        let (seen, sink) = recording_sink();
        let collector = ContentCollector::new(fs).with_sink(sink);

        let blobs = collector.collect(&SelectionSource::SingleFile("root".into()));
        assert_eq!(
            blobs,
            vec![
                NamedBlob::new("root_a.txt", "first"),
                NamedBlob::new("root_z.txt", "last"),
            ]
        );
        assert_eq!(*seen.lock(), vec![PathBuf::from("root/locked.txt")]);
    }

    #[test]
    fn unlistable_directory_is_reported_and_siblings_continue() {
        let fs = MemoryFs::default()
            .dir("root", &["a.txt", "locked", "z.txt"])
            .dir("root/locked", &["hidden.txt"])
            .file("root/a.txt", "first")
            .file("root/locked/hidden.txt", "secret")
            .file("root/z.txt", "last")
            .broken_dir("root/locked");
        let reads = fs.reads.clone();
        let (seen, sink) = recording_sink();
        let collector = ContentCollector::new(fs).with_sink(sink);

        let blobs = collector.collect(&SelectionSource::SingleFile("root".into()));
        assert_eq!(
            blobs,
            vec![
                NamedBlob::new("root_a.txt", "first"),
                NamedBlob::new("root_z.txt", "last"),
            ]
        );
        assert_eq!(*seen.lock(), vec![PathBuf::from("root/locked")]);
        assert!(!reads.lock().contains(&PathBuf::from("root/locked/hidden.txt")));
    }

    #[test]
    fn collecting_twice_is_identical() {
        let collector = ContentCollector::new(sample_tree());
        let source = SelectionSource::SingleFile("root".into());
        assert_eq!(collector.collect(&source), collector.collect(&source));
    }

    #[test]
    fn file_list_concatenates_in_order() {
        let fs = sample_tree().file("other.txt", "z");
        let collector = ContentCollector::new(fs);

        let source = SelectionSource::FileList(vec!["other.txt".into(), "root".into()]);
        let mut expected = collector.resolve(Path::new("other.txt"), None);
        expected.extend(collector.resolve(Path::new("root"), None));

        let blobs = collector.collect(&source);
        assert_eq!(blobs, expected);
        assert_eq!(blobs[0], NamedBlob::new("other.txt", "z"));
        assert_eq!(blobs.len(), 3);
    }

    #[test]
    fn resolve_applies_explicit_prefix() {
        let collector = ContentCollector::new(sample_tree());
        let blobs = collector.resolve(Path::new("root/sub"), Some("pre_"));
        assert_eq!(blobs, vec![NamedBlob::new("pre_sub_b.txt", "y")]);
    }

    #[test]
    fn collects_from_local_directory() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("sub"))?;
        fs::write(root.join("a.txt"), "x")?;
        fs::write(root.join("sub/b.txt"), "y")?;
        fs::write(root.join("sub/blank.txt"), "\n")?;

        let collector = ContentCollector::default();
        let blobs = collector.collect(&SelectionSource::SingleFile(root));
        assert_eq!(
            blobs,
            vec![
                NamedBlob::new("root_a.txt", "x"),
                NamedBlob::new("root_sub_b.txt", "y"),
            ]
        );
        Ok(())
    }

    #[test]
    fn configured_collector_skips_gitignored_and_file_type_entries() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let workspace = temp.path();
        let project = workspace.join("project");
        fs::create_dir_all(workspace.join(".git/info"))?;
        fs::create_dir_all(project.join("__pycache__"))?;
        fs::write(workspace.join(".gitignore"), "*.log\n")?;
        fs::write(project.join("main.py"), "print('hi')")?;
        fs::write(project.join("debug.log"), "noise")?;
        fs::write(project.join("main.pyc"), "bytecode")?;
        fs::write(project.join("__pycache__/main.cpython.pyc"), "bytecode")?;

        let config = Config {
            ignore: crate::infra::config::Ignore {
                vcs: Some(true),
                file_types: vec!["*.pyc".into(), "__pycache__".into()],
            },
            ..Config::default()
        };
        let collector = ContentCollector::from_config(&config, workspace)?;
        let blobs = collector.collect(&SelectionSource::SingleFile(project));
        assert_eq!(blobs, vec![NamedBlob::new("project_main.py", "print('hi')")]);
        Ok(())
    }

    #[test]
    fn relative_directory_is_named_after_its_target() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let project = temp.path().join("proj");
        fs::create_dir_all(project.join("src"))?;
        fs::write(project.join("a.txt"), "x")?;
        fs::write(project.join("src/lib.rs"), "pub fn f() {}")?;

        let collector = ContentCollector::default();
        let blobs = collector.collect(&SelectionSource::SingleFile(project.join("src/..")));
        assert_eq!(
            blobs,
            vec![
                NamedBlob::new("proj_a.txt", "x"),
                NamedBlob::new("proj_src_lib.rs", "pub fn f() {}"),
            ]
        );
        Ok(())
    }

    #[test]
    fn gitignore_applies_when_working_directory_is_elsewhere() -> anyhow::Result<()> {
        let repo = tempfile::tempdir()?;
        let elsewhere = tempfile::tempdir()?;
        let src = repo.path().join("src");
        fs::create_dir_all(repo.path().join(".git"))?;
        fs::create_dir_all(src.join("node_modules"))?;
        fs::write(repo.path().join(".gitignore"), ".env\nnode_modules/\n")?;
        fs::write(src.join(".env"), "TOKEN=secret")?;
        fs::write(src.join("node_modules/dep.js"), "module.exports = {}")?;
        fs::write(src.join("main.rs"), "fn main() {}")?;

        let config = Config {
            ignore: crate::infra::config::Ignore {
                vcs: Some(true),
                file_types: Vec::new(),
            },
            ..Config::default()
        };
        let collector = ContentCollector::from_config(&config, elsewhere.path())?;
        let blobs = collector.collect(&SelectionSource::SingleFile(src));
        assert_eq!(blobs, vec![NamedBlob::new("src_main.rs", "fn main() {}")]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_are_not_followed() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("root");
        fs::create_dir_all(&root)?;
        fs::write(root.join("a.txt"), "x")?;
        std::os::unix::fs::symlink("..", root.join("loop"))?;
        std::os::unix::fs::symlink(".", root.join("self"))?;

        let collector = ContentCollector::default();
        let blobs = collector.collect(&SelectionSource::SingleFile(root));
        assert_eq!(blobs, vec![NamedBlob::new("root_a.txt", "x")]);
        Ok(())
    }
}
