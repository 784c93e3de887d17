mod auth_port;
mod marketplace_port;
mod notification_port;
mod token_storage_port;

pub use auth_port::{AuthPort, AuthSession, Credentials, Password, Registration};
pub use marketplace_port::{MarketplaceDataPort, NewListing};
pub use notification_port::NotificationPort;
pub use token_storage_port::TokenStoragePort;

#[cfg(test)]
pub mod mocks {
    pub use super::auth_port::mock::{MOCK_TOKEN, MockAuthPort};
    pub use super::marketplace_port::mock::MockMarketplace;
    pub use super::notification_port::mock::MockNotificationPort;
    pub use super::token_storage_port::mock::MockTokenStorage;
}
