mod footer_bar;
mod header_bar;
mod input;
mod listing_table;
mod notification_popup;

pub use footer_bar::{FooterBar, FooterBarStyle};
pub use header_bar::{HeaderBar, HeaderBarStyle};
pub use input::TextInput;
pub use listing_table::ListingTable;
pub use notification_popup::NotificationPopup;
