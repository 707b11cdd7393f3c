//! Best-effort clipboard copy across several browser techniques.
use crate::error::CopyError;
use crate::ports::{Notice, Notifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TechniqueId {
    /// Asynchronous system clipboard write.
    AsyncClipboard,
    /// Select a hidden input and issue the legacy copy command.
    SelectionCommand,
}

impl TechniqueId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AsyncClipboard => "async-clipboard",
            Self::SelectionCommand => "selection-command",
        }
    }
}

impl fmt::Display for TechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete way of writing text to the system clipboard.
#[async_trait(?Send)]
pub trait ClipboardPort {
    fn id(&self) -> TechniqueId;

    /// Write `text` to the clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`CopyError::Unavailable`] when the capability is missing and
    /// [`CopyError::WriteFailed`] when the browser rejects the write.
    async fn write_text(&self, text: &str) -> Result<(), CopyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyOutcome {
    Succeeded,
    Failed,
}

impl CopyOutcome {
    #[must_use]
    pub const fn succeeded(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Result of one pass over the technique list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub outcome: CopyOutcome,
    /// Technique that succeeded, if any.
    pub technique: Option<TechniqueId>,
    /// Failures swallowed along the way, in the order they happened.
    pub errors: Vec<(TechniqueId, CopyError)>,
}

/// Ordered list of clipboard techniques, tried until one succeeds.
#[derive(Clone, Default)]
pub struct CopyStrategy {
    ports: Vec<Rc<dyn ClipboardPort>>,
}

impl CopyStrategy {
    #[must_use]
    pub fn new(ports: Vec<Rc<dyn ClipboardPort>>) -> Self {
        Self { ports }
    }

    /// Arrange `available` ports in the configured `order`.
    ///
    /// Techniques named in `order` with no matching port are skipped, and
    /// ports not named in `order` are left out.
    #[must_use]
    pub fn ordered(available: &[Rc<dyn ClipboardPort>], order: &[TechniqueId]) -> Self {
        let ports = order
            .iter()
            .filter_map(|id| {
                let port = available.iter().find(|port| port.id() == *id).cloned();
                if port.is_none() {
                    log::warn!("no clipboard port registered for technique `{id}`");
                }
                port
            })
            .collect();
        Self { ports }
    }

    #[must_use]
    pub fn techniques(&self) -> Vec<TechniqueId> {
        self.ports.iter().map(|port| port.id()).collect()
    }

    /// Try each technique in order and stop at the first success.
    ///
    /// Failures are logged and recorded; only exhausting every technique
    /// yields [`CopyOutcome::Failed`].
    pub async fn attempt_copy(&self, text: &str) -> CopyReport {
        let mut errors = Vec::new();
        for port in &self.ports {
            let id = port.id();
            match port.write_text(text).await {
                Ok(()) => {
                    log::debug!("copied referral code with {id}");
                    return CopyReport {
                        outcome: CopyOutcome::Succeeded,
                        technique: Some(id),
                        errors,
                    };
                }
                Err(err) => {
                    log::warn!("clipboard technique {id} failed: {err}");
                    errors.push((id, err));
                }
            }
        }
        CopyReport {
            outcome: CopyOutcome::Failed,
            technique: None,
            errors,
        }
    }

    /// [`attempt_copy`](Self::attempt_copy) followed by a success or
    /// copy-manually notice.
    pub async fn copy_and_notify(&self, text: &str, notifier: &dyn Notifier) -> CopyReport {
        let report = self.attempt_copy(text).await;
        let notice = if report.outcome.succeeded() {
            Notice::Copied {
                code: text.to_string(),
            }
        } else {
            Notice::CopyFailed {
                code: text.to_string(),
            }
        };
        notifier.notify(notice);
        report
    }
}

impl fmt::Debug for CopyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyStrategy")
            .field("techniques", &self.techniques())
            .finish()
    }
}
