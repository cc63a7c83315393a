//! Attachment size reduction: shrink images round by round until the total
//! payload fits under the size limit or the attempt budget runs out.

pub mod reducer;
pub mod scratch;

pub use reducer::{scaled_dimensions, AttachmentSizeReducer, ReducerConfig};
