//! Shared fixtures: a fake editor with predictable output sizes.
//!
//! A "fake image" file is exactly `width * height` bytes long and starts with
//! a 12-byte header: `FAKE`, then width and height as little-endian `u32`.
//! Resizing it therefore shrinks the file by the square of the factor.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use mailshrink::{EditorProvider, ImageEditor, Result, ShrinkError};

const MAGIC: &[u8; 4] = b"FAKE";
const HEADER_LEN: usize = 12;

/// Write a fake image of `width` x `height` (file size = width * height).
pub fn write_fake_image(path: &Path, width: u32, height: u32) {
    let len = (width as usize * height as usize).max(HEADER_LEN);
    let mut data = vec![0xABu8; len];
    data[..4].copy_from_slice(MAGIC);
    data[4..8].copy_from_slice(&width.to_le_bytes());
    data[8..12].copy_from_slice(&height.to_le_bytes());
    std::fs::write(path, data).unwrap();
}

/// Read back the dimensions stored in a fake image.
pub fn fake_dimensions(path: &Path) -> Option<(u32, u32)> {
    let data = std::fs::read(path).ok()?;
    if data.len() < HEADER_LEN || &data[..4] != MAGIC {
        return None;
    }
    let w = u32::from_le_bytes(data[4..8].try_into().ok()?);
    let h = u32::from_le_bytes(data[8..12].try_into().ok()?);
    Some((w, h))
}

/// How a [`FakeProvider`]'s editors behave when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Output size follows the new dimensions.
    Shrink,
    /// Output keeps the original byte length no matter the dimensions.
    NeverShrink,
    /// Saving fails once this many saves have succeeded.
    FailAfter(u32),
}

/// Counts what the reducer asked of the editors.
#[derive(Debug, Default)]
pub struct Calls {
    pub opens: Cell<u32>,
    pub resizes: Cell<u32>,
    pub saves: Cell<u32>,
}

pub struct FakeProvider {
    pub mode: SaveMode,
    pub calls: Rc<Calls>,
}

impl FakeProvider {
    pub fn new(mode: SaveMode) -> Self {
        Self {
            mode,
            calls: Rc::new(Calls::default()),
        }
    }
}

impl EditorProvider for FakeProvider {
    fn open(&self, path: &Path) -> Result<Option<Box<dyn ImageEditor>>> {
        self.calls.opens.set(self.calls.opens.get() + 1);
        let len = std::fs::metadata(path)
            .map_err(|e| ShrinkError::io(path, e))?
            .len();
        Ok(fake_dimensions(path).map(|(width, height)| {
            Box::new(FakeEditor {
                width,
                height,
                original_len: len,
                mode: self.mode,
                calls: Rc::clone(&self.calls),
            }) as Box<dyn ImageEditor>
        }))
    }
}

struct FakeEditor {
    width: u32,
    height: u32,
    original_len: u64,
    mode: SaveMode,
    calls: Rc<Calls>,
}

impl ImageEditor for FakeEditor {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32, crop: bool) -> Result<()> {
        assert!(!crop, "reducer must not crop");
        self.calls.resizes.set(self.calls.resizes.get() + 1);
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let SaveMode::FailAfter(n) = self.mode {
            if self.calls.saves.get() >= n {
                return Err(ShrinkError::image(path, "disk full"));
            }
        }
        self.calls.saves.set(self.calls.saves.get() + 1);

        write_fake_image(path, self.width, self.height);
        if self.mode == SaveMode::NeverShrink {
            let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
            file.set_len(self.original_len).unwrap();
        }
        Ok(())
    }
}

/// Number of regular files directly inside `dir`.
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .count()
}
