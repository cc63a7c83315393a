//! `mailshrink` — keep outgoing mail attachments under a provider size limit.
//!
//! Mail providers cap the total size of a message (Postmark: 10 MB). This
//! crate shrinks image attachments a little at a time until the attachment
//! set fits, leaving everything it cannot resize untouched.
//!
//! The core is [`reduce::AttachmentSizeReducer`]; [`filter::MailFilterAdapter`]
//! wraps it for mail-argument mappings.

pub mod config;
pub mod editor;
pub mod error;
pub mod filter;
pub mod model;
pub mod reduce;

pub use editor::{EditorProvider, ImageEditor, RasterEditorProvider};
pub use error::{Result, ShrinkError};
pub use filter::MailFilterAdapter;
pub use model::attachment::AttachmentSet;
pub use model::limit::SizeLimit;
pub use model::outcome::{ReduceOutcome, ReduceStatus};
pub use reduce::{AttachmentSizeReducer, ReducerConfig};
