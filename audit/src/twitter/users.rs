//! Bulk user lookup and directory refresh.

use serde::Deserialize;
use tracing::info;

use crate::error::{AuditError, AuditResult};
use crate::storage::Storage;
use crate::twitter::api::TwitterApiClient;
use crate::types::UserMapping;

/// User lookup endpoint.
const USERS_BY_PATH: &str = "/2/users/by";

/// Maximum usernames per lookup request.
const LOOKUP_CHUNK_SIZE: usize = 100;

/// One resolved user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    data: Vec<UserProfile>,
}

impl TwitterApiClient {
    /// Resolves usernames to profiles, batching requests at the API limit.
    ///
    /// Usernames unknown to the API are silently absent from the result.
    pub async fn lookup_users(&self, usernames: &[String]) -> AuditResult<Vec<UserProfile>> {
        let mut profiles = Vec::with_capacity(usernames.len());

        for chunk in usernames.chunks(LOOKUP_CHUNK_SIZE) {
            let response: LookupResponse = self
                .get(USERS_BY_PATH, &[("usernames", chunk.join(","))])
                .await?;

            profiles.extend(response.data);
        }

        Ok(profiles)
    }
}

/// Resolves `usernames` and writes the id-to-name associations to storage.
///
/// Returns the number of mappings written. The stored name is the account's
/// handle, matching what the stream rules reference.
pub async fn refresh_user_mappings<S>(
    api: &TwitterApiClient,
    storage: &S,
    usernames: &[String],
) -> AuditResult<usize>
where
    S: Storage,
{
    let profiles = api.lookup_users(usernames).await?;

    let mappings = profiles
        .into_iter()
        .map(|profile| {
            let author_id = profile
                .id
                .parse::<i64>()
                .map_err(|_| AuditError::InvalidId(profile.id.clone()))?;

            Ok(UserMapping {
                author_id,
                author_name: profile.username,
            })
        })
        .collect::<AuditResult<Vec<_>>>()?;

    let count = mappings.len();
    storage.upsert_user_mappings(mappings).await?;

    info!(mappings = count, "refreshed the author directory");

    Ok(count)
}
