//! Domain entity definitions.

mod admin;
mod blog;
mod category;
mod conversation;
mod credits;
mod ids;
mod inbox;
mod listing;
mod location;
mod money;
mod token;
mod user;

pub use admin::{DashboardStats, ModerationDecision};
pub use blog::BlogPost;
pub use category::Category;
pub use conversation::{ChatMessage, Conversation, ListingRef, Participant};
pub use credits::{CreditAccount, CreditTransaction};
pub use ids::{
    CategoryId, ConversationId, Identified, ListingId, MessageId, NotificationId, PostId,
    TransactionId, UserId,
};
pub use inbox::{InboxKind, InboxNotification};
pub use listing::{Listing, ListingStatus, SellerSummary};
pub use location::Location;
pub use money::Money;
pub use token::AuthToken;
pub use user::{User, UserRole, UserStatus};
