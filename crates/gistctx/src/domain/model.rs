//! Domain models for selection sources and collected blobs.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::errors::DomainError;

/// A named unit of text destined for upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NamedBlob {
    pub name: String,
    pub text: String,
}

impl NamedBlob {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Editor state captured at invocation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub(crate) selected_text: Option<String>,
    pub(crate) document_text: String,
    pub(crate) file_name: Option<String>,
}

impl EditorSnapshot {
    pub fn new(
        document_text: impl Into<String>,
        selected_text: Option<String>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            selected_text,
            document_text: document_text.into(),
            file_name,
        }
    }

    /// Active selection, if the editor has one.
    pub fn selected_text(&self) -> Option<&str> {
        self.selected_text.as_deref()
    }

    /// Full text of the edited document.
    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    /// Simple name of the file backing the editor, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

/// What the user chose to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSource {
    Editor(EditorSnapshot),
    SingleFile(PathBuf),
    FileList(Vec<PathBuf>),
}

impl SelectionSource {
    /// Pick a source from independently optional host values.
    ///
    /// An editor wins over a file list, which wins over a single file. Having none of them is a
    /// caller bug and is reported as [`DomainError::NoSelectionSource`].
    pub fn from_parts(
        editor: Option<EditorSnapshot>,
        file: Option<PathBuf>,
        files: Option<Vec<PathBuf>>,
    ) -> Result<Self, DomainError> {
        if let Some(editor) = editor {
            return Ok(Self::Editor(editor));
        }
        if let Some(files) = files {
            return Ok(Self::FileList(files));
        }
        if let Some(file) = file {
            return Ok(Self::SingleFile(file));
        }
        Err(DomainError::NoSelectionSource)
    }

    /// Build a file-based source from paths given on a command line.
    pub fn from_paths(mut paths: Vec<PathBuf>) -> Result<Self, DomainError> {
        match paths.len() {
            0 => Err(DomainError::NoSelectionSource),
            1 => Ok(Self::SingleFile(paths.remove(0))),
            _ => Ok(Self::FileList(paths)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_takes_priority_over_files() {
        let editor = EditorSnapshot::new("doc", None, None);
        let source = SelectionSource::from_parts(
            Some(editor.clone()),
            Some("a.txt".into()),
            Some(vec!["b.txt".into()]),
        )
        .unwrap();
        assert_eq!(source, SelectionSource::Editor(editor));
    }

    #[test]
    fn file_list_takes_priority_over_single_file() {
        let source =
            SelectionSource::from_parts(None, Some("a.txt".into()), Some(vec!["b.txt".into()]))
                .unwrap();
        assert_eq!(source, SelectionSource::FileList(vec!["b.txt".into()]));
    }

    #[test]
    fn missing_source_is_reported() {
        let err = SelectionSource::from_parts(None, None, None).unwrap_err();
        assert!(matches!(err, DomainError::NoSelectionSource));
        assert!(SelectionSource::from_paths(Vec::new()).is_err());
    }

    #[test]
    fn single_path_becomes_single_file() {
        let source = SelectionSource::from_paths(vec!["only.rs".into()]).unwrap();
        assert_eq!(source, SelectionSource::SingleFile("only.rs".into()));
    }
}
