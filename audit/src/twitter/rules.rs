//! Stream rule formatting and synchronization.
//!
//! Each rule value is a disjunction of `from:<user>` clauses. The API caps a
//! rule value at 512 characters and an essential-access project at 5 rules, so
//! the tracked accounts are packed greedily, shortest names first. Blowing the
//! rule cap is logged, not fatal; the API rejects the extra rules itself.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::AuditResult;
use crate::twitter::api::TwitterApiClient;

/// Maximum length of one rule value.
const MAX_RULE_VALUE_LEN: usize = 512;

/// Maximum number of rules allowed with essential access.
const MAX_RULES: usize = 5;

/// Rule management endpoint.
const RULES_PATH: &str = "/2/tweets/search/stream/rules";

/// A rule to be added to the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRule {
    pub value: String,
    pub tag: String,
}

/// A rule currently deployed on the stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveRule {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetRulesResponse {
    #[serde(default)]
    data: Vec<ActiveRule>,
}

#[derive(Debug, Serialize)]
struct AddRulesRequest<'a> {
    add: &'a [StreamRule],
}

#[derive(Debug, Serialize)]
struct DeleteRulesRequest {
    delete: DeleteRuleIds,
}

#[derive(Debug, Serialize)]
struct DeleteRuleIds {
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SetRulesResponse {
    #[serde(default)]
    errors: Vec<RuleError>,
}

#[derive(Debug, Deserialize)]
struct RuleError {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

/// Packs usernames into stream rules.
///
/// Names are sorted shortest first and appended as `from:<name>` clauses joined
/// by ` OR ` until the next clause would overflow the value limit, at which
/// point a new rule is started. Each rule is tagged with its value length.
///
/// Needing more than [`MAX_RULES`] rules is logged as an error but the full
/// set is still returned; the API rejects the extras when they are deployed.
pub fn format_rules(usernames: &[String]) -> Vec<StreamRule> {
    let mut sorted: Vec<&str> = usernames.iter().map(String::as_str).collect();
    sorted.sort_by_key(|name| name.len());

    let mut values: Vec<String> = Vec::new();
    let mut current = String::new();

    for name in sorted {
        // "from:" is 5 bytes; close the current rule if the clause would
        // push it past the limit. An empty rule is never closed, so a single
        // oversized name still becomes its own (over-limit) clause.
        if !current.is_empty() && current.len() + 5 + name.len() >= MAX_RULE_VALUE_LEN {
            current.truncate(current.len() - " OR ".len());
            values.push(std::mem::take(&mut current));
        }

        current.push_str("from:");
        current.push_str(name);
        current.push_str(" OR ");
    }

    if !current.is_empty() {
        current.truncate(current.len() - " OR ".len());
        values.push(current);
    }

    if values.len() > MAX_RULES {
        error!(
            rules = values.len(),
            limit = MAX_RULES,
            "tracked accounts need more stream rules than the access tier allows"
        );
    }

    values
        .into_iter()
        .map(|value| StreamRule {
            tag: value.len().to_string(),
            value,
        })
        .collect()
}

/// Recovers the usernames referenced by a set of deployed rules.
pub fn extract_users(rules: &[ActiveRule]) -> Vec<String> {
    rules
        .iter()
        .flat_map(|rule| rule.value.split(" OR "))
        .filter_map(|clause| clause.trim().strip_prefix("from:"))
        .map(str::to_string)
        .collect()
}

impl TwitterApiClient {
    /// Fetches the rules currently deployed on the stream.
    pub async fn get_rules(&self) -> AuditResult<Vec<ActiveRule>> {
        let response: GetRulesResponse = self.get(RULES_PATH, &[]).await?;

        debug!(rules = response.data.len(), "fetched deployed stream rules");

        Ok(response.data)
    }

    /// Adds the given rules to the stream.
    pub async fn set_rules(&self, rules: &[StreamRule]) -> AuditResult<()> {
        let response: SetRulesResponse = self.post(RULES_PATH, &AddRulesRequest { add: rules }).await?;

        for error in &response.errors {
            warn!(
                title = error.title.as_deref().unwrap_or("unknown"),
                value = error.value.as_deref().unwrap_or(""),
                "stream rule was rejected"
            );
        }

        Ok(())
    }

    /// Deletes the rules with the given ids from the stream.
    pub async fn delete_rules(&self, ids: Vec<String>) -> AuditResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let request = DeleteRulesRequest {
            delete: DeleteRuleIds { ids },
        };
        let _: SetRulesResponse = self.post(RULES_PATH, &request).await?;

        Ok(())
    }

    /// Replaces the whole deployed rule set with rules tracking `usernames`.
    pub async fn replace_rules(&self, usernames: &[String]) -> AuditResult<Vec<StreamRule>> {
        let rules = format_rules(usernames);

        let deployed = self.get_rules().await?;
        self.delete_rules(deployed.into_iter().map(|rule| rule.id).collect())
            .await?;
        self.set_rules(&rules).await?;

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(count: usize, len: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{i:0width$}", width = len))
            .collect()
    }

    #[test]
    fn single_rule_for_a_few_accounts() {
        let users = vec!["alice".to_string(), "bob".to_string()];
        let rules = format_rules(&users);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].value, "from:bob OR from:alice");
        assert_eq!(rules[0].tag, rules[0].value.len().to_string());
    }

    #[test]
    fn rule_values_stay_under_the_limit() {
        let users = names(200, 12);
        let rules = format_rules(&users);

        assert!(rules.len() > 1);
        for rule in &rules {
            assert!(rule.value.len() < MAX_RULE_VALUE_LEN);
            assert!(!rule.value.ends_with(" OR "));
        }
    }

    #[test]
    fn accounts_beyond_the_rule_limit_are_still_formatted() {
        let users = names(800, 15);
        let rules = format_rules(&users);

        assert!(rules.len() > MAX_RULES);
        for rule in &rules {
            assert!(rule.value.len() < MAX_RULE_VALUE_LEN);
        }
    }

    #[test]
    fn oversized_name_becomes_its_own_rule() {
        let users = vec!["a".repeat(507)];
        let rules = format_rules(&users);

        assert_eq!(rules.len(), 1);
        assert!(rules[0].value.starts_with("from:"));
        assert!(!rules[0].value.ends_with(" OR "));
    }

    #[test]
    fn extraction_round_trips_formatting() {
        let users = vec![
            "alice".to_string(),
            "bob".to_string(),
            "carol".to_string(),
        ];
        let rules = format_rules(&users);

        let active: Vec<ActiveRule> = rules
            .into_iter()
            .map(|rule| ActiveRule {
                id: "1".to_string(),
                value: rule.value,
                tag: Some(rule.tag),
            })
            .collect();

        let mut recovered = extract_users(&active);
        recovered.sort();
        let mut expected = users;
        expected.sort();

        assert_eq!(recovered, expected);
    }

    #[test]
    fn no_accounts_produce_no_rules() {
        let rules = format_rules(&[]);
        assert!(rules.is_empty());
    }
}
