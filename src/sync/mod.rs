//! Synchronization Module
//!
//! The state owners of the chat core:
//!
//! - [`ConversationListSync`] - the ordered conversation list and presence set
//! - [`MessageThreadSync`] - one open conversation's message collection
//! - [`ReadReceiptCoordinator`] - the one-shot mark-as-read guard
//!
//! Each synchronizer exclusively owns its collections and is mutated on the
//! owner task, either from a transport event or a completed fetch. Ordering
//! between an interleaved push and a pending page fetch is not guaranteed;
//! the de-dup-by-uuid contract keeps both paths convergent.

pub mod conversations;
pub mod read_receipts;
pub mod thread;

// Re-export the synchronizers
pub use conversations::ConversationListSync;
pub use read_receipts::ReadReceiptCoordinator;
pub use thread::{MessageThreadSync, ReplyPreview};
