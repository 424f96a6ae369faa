//! Upload orchestration: one collection pass, one gist request.

use anyhow::Result;

use crate::app::collect::ContentCollector;
use crate::app::payload::GistPayload;
use crate::domain::errors::DomainError;
use crate::domain::model::SelectionSource;
use crate::infra::auth::AuthToken;
use crate::infra::clipboard::ClipboardSink;
use crate::infra::github::GistTransport;
use crate::infra::notify::Notifier;

const FAILED_TO_CREATE_GIST: &str = "Failed to create gist";

/// Per-invocation options chosen by the user.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub description: String,
    pub public: bool,
    pub anonymous: bool,
    pub auth: Option<AuthToken>,
    pub dry_run: bool,
    pub copy_url: bool,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The payload that would have been sent.
    DryRun(GistPayload),
    Created { url: String, copied_to_clipboard: bool },
}

/// Drives a gist upload from a selection source through to user notification.
pub struct UploadOrchestrator<'a> {
    collector: &'a ContentCollector,
    transport: &'a dyn GistTransport,
    notifier: &'a dyn Notifier,
    clipboard: Option<&'a dyn ClipboardSink>,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(
        collector: &'a ContentCollector,
        transport: &'a dyn GistTransport,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            collector,
            transport,
            notifier,
            clipboard: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: &'a dyn ClipboardSink) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn run(&self, source: &SelectionSource, request: &UploadRequest) -> Result<UploadOutcome> {
        let auth = if request.anonymous {
            None
        } else {
            match request.auth.as_ref() {
                Some(token) => Some(token),
                None if request.dry_run => None,
                None => {
                    self.notifier.warning(
                        FAILED_TO_CREATE_GIST,
                        "You have to login to GitHub to create non-anonymous Gists.",
                    );
                    return Err(DomainError::MissingCredentials.into());
                }
            }
        };

        let blobs = self.collector.collect(source);
        let payload = match GistPayload::from_blobs(&request.description, request.public, &blobs) {
            Ok(payload) => payload,
            Err(err) => {
                self.notifier.warning(FAILED_TO_CREATE_GIST, "Can't create empty gist");
                return Err(err.into());
            }
        };
        if payload.file_count() < blobs.len() {
            tracing::debug!(
                blobs = blobs.len(),
                files = payload.file_count(),
                "blobs with duplicate names were overwritten"
            );
        }

        if request.dry_run {
            return Ok(UploadOutcome::DryRun(payload));
        }

        let url = match self.transport.create_gist(&payload, auth) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = %err, "exception when creating a gist");
                self.notifier.error(FAILED_TO_CREATE_GIST, &err.to_string());
                return Err(err.into());
            }
        };
        tracing::info!(%url, files = payload.file_count(), "gist created");

        let copied_to_clipboard = request.copy_url && self.copy_url(&url);
        if !copied_to_clipboard {
            self.notifier
                .info_url("Gist Created Successfully", "Your gist url", &url);
        }

        Ok(UploadOutcome::Created {
            url,
            copied_to_clipboard,
        })
    }

    fn copy_url(&self, url: &str) -> bool {
        let Some(clipboard) = self.clipboard else {
            return false;
        };
        match clipboard.copy(url) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to copy gist url to clipboard");
                false
            }
        }
    }
}
