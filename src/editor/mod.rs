//! Image-editing capability used by the reducer.
//!
//! The reducer only needs four things from an editor: open a file (or say it
//! cannot), report its dimensions, resize it and write it somewhere. Keeping
//! that behind a trait lets the codec be swapped out, and lets tests use a
//! fake whose output sizes are predictable.

pub mod raster;

use std::path::Path;

use crate::error::Result;

pub use raster::RasterEditorProvider;

/// An opened, editable image.
pub trait ImageEditor {
    /// Current `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);

    /// Resize to `width` x `height`.
    ///
    /// With `crop = false` the image is scaled to exactly the requested box;
    /// callers that want to keep the aspect ratio pass proportional
    /// dimensions. With `crop = true` the image is scaled to cover the box
    /// and the overflow is cropped.
    fn resize(&mut self, width: u32, height: u32, crop: bool) -> Result<()>;

    /// Encode the current image into `path`, overwriting its contents.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Hands out editors for files it understands.
pub trait EditorProvider {
    /// Open `path` for editing.
    ///
    /// Returns `Ok(None)` when the file is not something this provider can
    /// edit (not an image, unknown or unwritable format). That is a normal
    /// outcome: the reducer passes such files through untouched. I/O errors
    /// reading the file are returned as errors.
    fn open(&self, path: &Path) -> Result<Option<Box<dyn ImageEditor>>>;
}

impl<P: EditorProvider + ?Sized> EditorProvider for &P {
    fn open(&self, path: &Path) -> Result<Option<Box<dyn ImageEditor>>> {
        (**self).open(path)
    }
}

impl<P: EditorProvider + ?Sized> EditorProvider for Box<P> {
    fn open(&self, path: &Path) -> Result<Option<Box<dyn ImageEditor>>> {
        (**self).open(path)
    }
}
