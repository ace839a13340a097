//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, storage, and outbound HTTP calls.

mod conversation;
mod feed;
mod message;
mod profile;

pub use conversation::{ConversationService, ConversationView, ParticipantView};
pub use feed::{CommentView, FeedService, PostView};
pub use message::{MessageService, MessageView};
pub use profile::{CommunityMember, ProfileService, ProfileUpdate};
