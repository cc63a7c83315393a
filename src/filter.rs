//! Integration point with a mail sender's argument mapping.
//!
//! Mail libraries typically hand a hook a key/value mapping of the message
//! being sent (`to`, `subject`, `message`, `headers`, `attachments`). The
//! adapter only looks at `attachments` and leaves everything else alone.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use crate::editor::EditorProvider;
use crate::error::{Result, ShrinkError};
use crate::reduce::AttachmentSizeReducer;

/// Key holding the attachment list in the mail arguments.
pub const ATTACHMENTS_KEY: &str = "attachments";

/// Rewrites the `attachments` entry of outgoing mail arguments.
pub struct MailFilterAdapter<P> {
    reducer: AttachmentSizeReducer<P>,
}

impl<P: EditorProvider> MailFilterAdapter<P> {
    /// Wrap a reducer. Its configured size limit is used for every message.
    pub fn new(reducer: AttachmentSizeReducer<P>) -> Self {
        Self { reducer }
    }

    /// Replace `args["attachments"]` with the reduced list, if present.
    ///
    /// The value may be an array of path strings or a single string with one
    /// path per line. `null` counts as absent. The result is always written
    /// back as an array of strings.
    pub fn adapt(&self, mut args: Map<String, Value>) -> Result<Map<String, Value>> {
        let Some(value) = args.get(ATTACHMENTS_KEY) else {
            return Ok(args);
        };
        let Some(paths) = attachment_paths(value)? else {
            return Ok(args);
        };

        let outcome = self.reducer.reduce(&paths)?;
        debug!(
            count = paths.len(),
            rounds = outcome.rounds,
            status = ?outcome.status,
            "Filtered mail attachments"
        );

        let reduced = outcome
            .into_paths()
            .into_iter()
            .map(|p| Value::String(p.to_string_lossy().into_owned()))
            .collect();
        args.insert(ATTACHMENTS_KEY.to_string(), Value::Array(reduced));
        Ok(args)
    }
}

/// Read the attachment list out of its JSON value.
fn attachment_paths(value: &Value) -> Result<Option<Vec<PathBuf>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(
            s.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from)
                .collect(),
        )),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(PathBuf::from(s)),
                other => Err(ShrinkError::InvalidArgs(format!(
                    "attachment #{i} is not a path string: {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        other => Err(ShrinkError::InvalidArgs(format!(
            "'{ATTACHMENTS_KEY}' must be a list of paths or a newline-separated string, got {other}"
        ))),
    }
}
