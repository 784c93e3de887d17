//! Typed identifiers for marketplace entities.

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "crate::domain::serde_utils::flexible_id")] pub u64);

        impl $name {
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

entity_id!(
    /// Marketplace user id.
    UserId
);
entity_id!(
    /// Listing id.
    ListingId
);
entity_id!(
    /// Category id.
    CategoryId
);
entity_id!(
    /// Conversation id.
    ConversationId
);
entity_id!(
    /// Chat message id.
    MessageId
);
entity_id!(
    /// Blog post id.
    PostId
);
entity_id!(
    /// Inbox notification id.
    NotificationId
);
entity_id!(
    /// Credit transaction id.
    TransactionId
);

/// Entities addressable by a stable id.
pub trait Identified {
    /// Id type used for de-duplication.
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Debug;

    /// Returns the entity id.
    fn id(&self) -> Self::Id;
}

impl Identified for super::CreditTransaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_string_and_number() {
        let a: ListingId = serde_json::from_str("\"17\"").unwrap();
        let b: ListingId = serde_json::from_str("17").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "17");
    }

    #[test]
    fn test_id_parse() {
        assert_eq!(" 9 ".parse::<UserId>().unwrap(), UserId(9));
        assert!("nine".parse::<UserId>().is_err());
    }

    fn key_of<T: Identified>(entity: &T) -> T::Id {
        entity.id()
    }

    #[test]
    fn test_identified_uses_entity_id() {
        let user = super::super::User::new(7_u64, "Ada", "ada@example.com");
        assert_eq!(key_of(&user), UserId(7));
    }
}
