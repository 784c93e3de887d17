use serde::{Deserialize, Serialize};

use crate::domain::entities::Location;
use crate::domain::search::RecentSearches;

/// Small key-value state kept between sessions in `state.toml`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub location: Option<Location>,

    #[serde(default)]
    pub recent_searches: RecentSearches,

    /// Overrides the configured notification sound once toggled in the app.
    #[serde(default)]
    pub notification_sound: Option<bool>,

    #[serde(default)]
    pub last_tab: Option<String>,
}
