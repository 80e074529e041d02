//! Soft signals raised while scanning.

use std::fmt;

use crate::error::Result;

/// A condition observed during a scan that is not an error by itself.
///
/// The installed handler decides what happens: returning `Err` aborts the
/// scan in flight and the error is handed back to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A field grew past the configured maximum size.
    MaxFieldSizeExceeded {
        /// 1-based record number.
        line: usize,
        /// Bytes seen in the field when the limit was crossed.
        size: usize,
        /// Configured limit.
        limit: u32,
    },
    /// A row holding no data was skipped.
    EmptyRowSkipped {
        /// 1-based record number of the skipped row.
        line: usize,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::MaxFieldSizeExceeded { line, size, limit } => write!(
                f,
                "Line {line}: field size {size} exceeds the limit of {limit} bytes"
            ),
            Notification::EmptyRowSkipped { line } => write!(f, "Line {line}: empty row skipped"),
        }
    }
}

/// Callback receiving notifications.
pub type NotificationHandler = dyn Fn(Notification) -> Result<()> + Send + Sync;

/// Routes notifications to the installed handler, or to the log.
#[derive(Clone, Copy, Default)]
pub(crate) struct Notifier<'a> {
    handler: Option<&'a (dyn Fn(Notification) -> Result<()> + Send + Sync + 'a)>,
}

impl<'a> Notifier<'a> {
    pub(crate) const fn new(handler: Option<&'a (dyn Fn(Notification) -> Result<()> + Send + Sync + 'a)>) -> Self {
        Self { handler }
    }

    pub(crate) fn notify(&self, notification: Notification) -> Result<()> {
        match self.handler {
            Some(handler) => handler(notification),
            None => {
                tracing::debug!(%notification, "scan notification");
                Ok(())
            }
        }
    }
}
