use super::{Row, array, join_field, number};
use crate::collector::CollectionRecord;
use serde_json::Value;

const POPULAR_FOLLOWERS: i64 = 10_000;
const MICRO_INFLUENCER_FOLLOWERS: i64 = 1_000;

pub(super) fn account_tier(followers: i64) -> &'static str {
    if followers > POPULAR_FOLLOWERS {
        "Popular"
    } else if followers > MICRO_INFLUENCER_FOLLOWERS {
        "Micro-influencer"
    } else {
        "Regular"
    }
}

/// Followers per followed account, rounded to 2 decimals. 0 when the user
/// follows nobody.
pub(super) fn follower_ratio(followers: i64, following: i64) -> f64 {
    if following > 0 {
        (followers as f64 / following as f64 * 100.0).round() / 100.0
    } else {
        0.0
    }
}

pub(super) fn retweeter_row(user: &Value, record: &CollectionRecord) -> Row {
    let mut row = Row::default();
    row.text("user_id", user.get("id"));
    row.push(
        "original_tweet_id",
        record.tweet_id.clone().unwrap_or_default(),
    );
    row.text("type", user.get("type"));
    row.text("username", user.get("userName"));
    row.text("name", user.get("name"));
    row.text("profile_url", user.get("url"));
    row.text("description", user.get("description"));
    row.text("location", user.get("location"));
    row.count("followers", user.get("followers"));
    row.count("following", user.get("following"));
    row.flag("can_dm", user.get("canDm"));
    row.text("created_at", user.get("createdAt"));
    row.count("favourites_count", user.get("favouritesCount"));
    row.count("media_count", user.get("mediaCount"));
    row.count("statuses_count", user.get("statusesCount"));
    row.flag("verified", user.get("verified"));
    row.flag("blue_verified", user.get("isBlueVerified"));
    row.text("verified_type", user.get("verifiedType"));
    row.text("profile_picture", user.get("profilePicture"));
    row.text("cover_picture", user.get("coverPicture"));
    row.flag("protected", user.get("protected"));
    row.flag("has_custom_timelines", user.get("hasCustomTimelines"));
    row.flag("is_translator", user.get("isTranslator"));
    row.flag("possibly_sensitive", user.get("possiblySensitive"));
    row.flag("is_automated", user.get("isAutomated"));
    row.text("automated_by", user.get("automatedBy"));
    row.flag("unavailable", user.get("unavailable"));
    row.text("unavailable_reason", user.get("unavailableReason"));
    row.text("message", user.get("message"));

    let bio = user.get("profile_bio").unwrap_or(&Value::Null);
    row.text("bio_description", bio.get("description"));
    let entities = bio.get("entities").unwrap_or(&Value::Null);
    let bio_urls: Vec<Value> = ["description", "url"]
        .iter()
        .flat_map(|section| array(entities.get(*section).and_then(|s| s.get("urls"))))
        .cloned()
        .collect();
    row.push("bio_urls", join_field(&bio_urls, "expanded_url"));
    row.push("bio_url_count", bio_urls.len().to_string());

    let withheld = strings(user.get("withheldInCountries"));
    row.push("withheld_countries", withheld.join(", "));
    row.push("withheld_country_count", withheld.len().to_string());

    let pinned = strings(user.get("pinnedTweetIds"));
    row.push("pinned_tweets", pinned.join(", "));
    row.push("pinned_tweet_count", pinned.len().to_string());

    let followers = number(user.get("followers"));
    let following = number(user.get("following"));
    row.push(
        "follower_ratio",
        follower_ratio(followers, following).to_string(),
    );
    row.push("account_tier", account_tier(followers));
    row.push("dataset", "retweeter");
    row.push("last_cursor", record.last_cursor.as_str());
    row.push(
        "resume_cursor",
        record.params.resume_cursor.clone().unwrap_or_default(),
    );
    row
}

fn strings(value: Option<&Value>) -> Vec<String> {
    array(value)
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{Collection, Target};
    use chrono::Local;
    use serde_json::json;

    fn value_of<'a>(row: &'a Row, column: &str) -> &'a str {
        row.cells
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_account_tier_boundaries() {
        assert_eq!(account_tier(10_001), "Popular");
        assert_eq!(account_tier(10_000), "Micro-influencer");
        assert_eq!(account_tier(1_001), "Micro-influencer");
        assert_eq!(account_tier(1_000), "Regular");
    }

    #[test]
    fn test_follower_ratio() {
        assert_eq!(follower_ratio(10, 3), 3.33);
        assert_eq!(follower_ratio(10, 0), 0.0);
    }

    #[test]
    fn test_retweeter_row() {
        let record = CollectionRecord::new(
            &Collection::new(Target::retweeters("55")),
            vec![],
            1,
            "cur".into(),
            &Local::now(),
        );
        let user = json!({
            "id": "u1",
            "userName": "bea",
            "followers": 2500,
            "following": 1000,
            "withheldInCountries": ["DE", "FR"],
            "pinnedTweetIds": ["9"],
            "profile_bio": {
                "description": "bio",
                "entities": {
                    "description": {"urls": [{"expanded_url": "https://a.example"}]},
                    "url": {"urls": [{"expanded_url": "https://b.example"}]}
                }
            }
        });
        let row = retweeter_row(&user, &record);

        assert_eq!(value_of(&row, "original_tweet_id"), "55");
        assert_eq!(value_of(&row, "follower_ratio"), "2.5");
        assert_eq!(value_of(&row, "account_tier"), "Micro-influencer");
        assert_eq!(value_of(&row, "withheld_countries"), "DE, FR");
        assert_eq!(value_of(&row, "withheld_country_count"), "2");
        assert_eq!(value_of(&row, "pinned_tweet_count"), "1");
        assert_eq!(value_of(&row, "bio_urls"), "https://a.example, https://b.example");
        assert_eq!(value_of(&row, "bio_url_count"), "2");
        assert_eq!(value_of(&row, "dataset"), "retweeter");
    }

    #[test]
    fn test_missing_profile_leaves_empty_bio_columns() {
        let record = CollectionRecord::new(
            &Collection::new(Target::retweeters("55")),
            vec![],
            1,
            String::new(),
            &Local::now(),
        );
        let row = retweeter_row(&json!({"id": "u2"}), &record);
        assert_eq!(value_of(&row, "bio_description"), "");
        assert_eq!(value_of(&row, "bio_url_count"), "0");
        assert_eq!(value_of(&row, "follower_ratio"), "0");
        assert_eq!(value_of(&row, "account_tier"), "Regular");
    }
}
