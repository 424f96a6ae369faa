//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("no editor, file or file list was provided")]
    NoSelectionSource,
    #[error("can't create empty gist")]
    NothingToUpload,
    #[error("you have to login to GitHub to create non-anonymous gists")]
    MissingCredentials,
}
