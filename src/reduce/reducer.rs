//! The reduction loop.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::scratch::ScratchFiles;
use crate::editor::{EditorProvider, RasterEditorProvider};
use crate::error::{Result, ShrinkError};
use crate::model::attachment::AttachmentSet;
use crate::model::limit::SizeLimit;
use crate::model::outcome::{ReduceOutcome, ReduceStatus};

/// Default total size budget, in (decimal) megabytes.
pub const DEFAULT_MAX_TOTAL_SIZE_MB: f64 = 10.0;
/// Default number of resize rounds before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default per-round scale applied to width and height.
pub const DEFAULT_REDUCTION_FACTOR: f64 = 0.98;

/// Tuning for [`AttachmentSizeReducer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducerConfig {
    /// Size budget for all attachments together, in MB (before the 5% margin).
    pub max_total_size_mb: f64,
    /// Highest attempt number that still runs a resize round.
    pub max_attempts: u32,
    /// Scale applied to each side per round, in `(0, 1)`.
    pub reduction_factor: f64,
    /// Where resized copies are written. `None` = platform temp dir.
    pub temp_dir: Option<PathBuf>,
    /// Leave superseded intermediate files on disk.
    pub keep_intermediates: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            max_total_size_mb: DEFAULT_MAX_TOTAL_SIZE_MB,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            reduction_factor: DEFAULT_REDUCTION_FACTOR,
            temp_dir: None,
            keep_intermediates: false,
        }
    }
}

impl ReducerConfig {
    /// Check every knob is in range.
    pub fn validate(&self) -> Result<()> {
        SizeLimit::from_mb(self.max_total_size_mb)?;
        if self.max_attempts == 0 {
            return Err(ShrinkError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        let f = self.reduction_factor;
        if !f.is_finite() || f <= 0.0 || f >= 1.0 {
            return Err(ShrinkError::InvalidConfig(format!(
                "reduction_factor must be between 0 and 1 (exclusive), got {f}"
            )));
        }
        Ok(())
    }

    /// Directory resized copies go to.
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Shrinks image attachments until their combined size fits a limit.
///
/// Each round scales every editable image by `reduction_factor` and writes
/// the result to a new temp file; non-images pass through unchanged. Rounds
/// repeat on the already-resized files until the total is under the limit or
/// `max_attempts` rounds have run. Output order always matches input order.
pub struct AttachmentSizeReducer<P = RasterEditorProvider> {
    config: ReducerConfig,
    provider: P,
}

impl AttachmentSizeReducer<RasterEditorProvider> {
    /// Reducer using the built-in `image`-crate editor.
    pub fn with_raster_editor(config: ReducerConfig) -> Self {
        Self::new(config, RasterEditorProvider::new())
    }
}

impl<P: EditorProvider> AttachmentSizeReducer<P> {
    /// Create a reducer with the given tuning and editor provider.
    pub fn new(config: ReducerConfig, provider: P) -> Self {
        Self { config, provider }
    }

    /// The tuning in effect.
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Reduce using the configured size limit, starting at attempt 1.
    pub fn reduce(&self, attachments: &[PathBuf]) -> Result<ReduceOutcome> {
        self.reduce_with_limit(attachments, self.config.max_total_size_mb, 1)
    }

    /// Reduce against `mb_limit`, counting rounds from `attempt` (1-based).
    ///
    /// If `attempt` is already past `max_attempts` the input comes back
    /// unchanged without touching the filesystem. `attempt == 0` is rejected.
    pub fn reduce_with_limit(
        &self,
        attachments: &[PathBuf],
        mb_limit: f64,
        attempt: u32,
    ) -> Result<ReduceOutcome> {
        self.reduce_with_progress(attachments, mb_limit, attempt, None)
    }

    /// Like [`reduce_with_limit`](Self::reduce_with_limit), calling
    /// `progress(attempt, total_size)` after every resize round.
    pub fn reduce_with_progress(
        &self,
        attachments: &[PathBuf],
        mb_limit: f64,
        attempt: u32,
        progress: Option<&dyn Fn(u32, u64)>,
    ) -> Result<ReduceOutcome> {
        self.config.validate()?;
        if attempt == 0 {
            return Err(ShrinkError::InvalidConfig(
                "attempts are counted from 1".to_string(),
            ));
        }
        let limit = SizeLimit::from_mb(mb_limit)?;

        let mut scratch = ScratchFiles::new(
            self.config.resolved_temp_dir(),
            self.config.keep_intermediates,
        );
        // On error `scratch` drops here and deletes every file it made.
        let outcome = self.run(attachments, limit, attempt, &mut scratch, progress)?;
        scratch.release(outcome.attachments.iter());
        Ok(outcome)
    }

    fn run(
        &self,
        originals: &[PathBuf],
        limit: SizeLimit,
        mut attempt: u32,
        scratch: &mut ScratchFiles,
        progress: Option<&dyn Fn(u32, u64)>,
    ) -> Result<ReduceOutcome> {
        let mut current = originals.to_vec();
        let mut total: Option<u64> = None;
        let mut rounds: u32 = 0;

        loop {
            if attempt > self.config.max_attempts {
                if rounds > 0 {
                    warn!(
                        rounds,
                        total_size = total.unwrap_or_default(),
                        limit = limit.bytes(),
                        "Giving up: attachments still over the size limit"
                    );
                }
                return Ok(outcome(current, total, rounds, ReduceStatus::AttemptsExhausted));
            }

            let size = match total {
                Some(size) => size,
                None => AttachmentSet::total_size_of(&current)?,
            };
            if limit.fits(size) {
                debug!(total_size = size, limit = limit.bytes(), "Attachments within limit");
                return Ok(outcome(current, Some(size), rounds, ReduceStatus::AlreadyFits));
            }

            debug!(attempt, total_size = size, limit = limit.bytes(), "Over limit, resizing");
            current = self.resize_round(originals, &current, scratch)?;
            rounds += 1;

            let size = AttachmentSet::total_size_of(&current)?;
            total = Some(size);
            if let Some(progress) = progress {
                progress(attempt, size);
            }

            if limit.fits(size) {
                info!(rounds, total_size = size, "Attachments reduced within limit");
                return Ok(outcome(current, total, rounds, ReduceStatus::Fits));
            }
            attempt = match attempt.checked_add(1) {
                Some(next) => next,
                None => {
                    return Ok(outcome(current, total, rounds, ReduceStatus::AttemptsExhausted))
                }
            };
        }
    }

    /// One pass over every attachment. `originals` supplies the temp names.
    fn resize_round(
        &self,
        originals: &[PathBuf],
        current: &[PathBuf],
        scratch: &mut ScratchFiles,
    ) -> Result<Vec<PathBuf>> {
        let mut next = Vec::with_capacity(current.len());

        for (original, path) in originals.iter().zip(current) {
            match self.resize_one(original, path, scratch)? {
                Some(resized) => {
                    scratch.supersede(path);
                    next.push(resized);
                }
                None => next.push(path.clone()),
            }
        }

        Ok(next)
    }

    /// Resize a single file, or `None` if the provider cannot edit it.
    fn resize_one(
        &self,
        original: &Path,
        path: &Path,
        scratch: &mut ScratchFiles,
    ) -> Result<Option<PathBuf>> {
        let Some(mut editor) = self.provider.open(path)? else {
            debug!(path = %path.display(), "Not resizable, passing through");
            return Ok(None);
        };

        let (width, height) = editor.size();
        let (new_width, new_height) =
            scaled_dimensions(width, height, self.config.reduction_factor);
        editor.resize(new_width, new_height, false)?;

        let file = scratch.create_for(original)?;
        editor.save(file.path())?;
        let out = scratch.adopt(file)?;

        debug!(
            from = %path.display(),
            to = %out.display(),
            width = new_width,
            height = new_height,
            "Resized attachment"
        );
        Ok(Some(out))
    }
}

fn outcome(
    paths: Vec<PathBuf>,
    total_size: Option<u64>,
    rounds: u32,
    status: ReduceStatus,
) -> ReduceOutcome {
    ReduceOutcome {
        attachments: AttachmentSet::from(paths),
        total_size,
        rounds,
        status,
    }
}

/// Scale both sides by `factor`, rounding half away from zero, never below 1.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |side: u32| ((side as f64 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}
