//! Twitter v2 REST glue: rule management and user lookup.

mod api;
mod rules;
mod users;

pub use api::TwitterApiClient;
pub use rules::{ActiveRule, StreamRule, extract_users, format_rules};
pub use users::{UserProfile, refresh_user_mappings};
