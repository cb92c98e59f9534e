use super::{Row, array, join_field, number};
use crate::collector::CollectionRecord;
use serde_json::Value;

pub(super) fn search_row(tweet: &Value, record: &CollectionRecord) -> Row {
    let mut row = Row::default();
    row.text("tweet_id", tweet.get("id"));
    tweet_columns(&mut row, tweet);
    row.push("dataset", "search");
    row.push("last_cursor", record.last_cursor.as_str());
    row
}

pub(super) fn reply_row(reply: &Value, record: &CollectionRecord) -> Row {
    let mut row = Row::default();
    row.text("reply_id", reply.get("id"));
    row.push(
        "original_tweet_id",
        record.tweet_id.clone().unwrap_or_default(),
    );
    tweet_columns(&mut row, reply);
    row.push("dataset", "reply");
    row.push("last_cursor", record.last_cursor.as_str());
    row.push(
        "resume_cursor",
        record.params.resume_cursor.clone().unwrap_or_default(),
    );
    row
}

fn tweet_columns(row: &mut Row, tweet: &Value) {
    row.text("type", tweet.get("type"));
    row.text("url", tweet.get("url"));
    row.text("text", tweet.get("text"));
    row.text("created_at", tweet.get("createdAt"));
    row.text("lang", tweet.get("lang"));
    row.count("retweets", tweet.get("retweetCount"));
    row.count("replies", tweet.get("replyCount"));
    row.count("likes", tweet.get("likeCount"));
    row.count("quotes", tweet.get("quoteCount"));
    row.count("views", tweet.get("viewCount"));
    row.count("bookmarks", tweet.get("bookmarkCount"));
    row.flag("is_reply", tweet.get("isReply"));
    row.text("source", tweet.get("source"));
    row.text("conversation_id", tweet.get("conversationId"));
    row.text("in_reply_to_id", tweet.get("inReplyToId"));
    row.text("in_reply_to_user_id", tweet.get("inReplyToUserId"));
    row.text("in_reply_to_username", tweet.get("inReplyToUsername"));

    let author = tweet.get("author").unwrap_or(&Value::Null);
    row.text("author_id", author.get("id"));
    row.text("author_username", author.get("userName"));
    row.text("author_name", author.get("name"));
    row.flag("author_verified", author.get("isVerified"));
    row.flag("author_blue_verified", author.get("isBlueVerified"));
    row.count("author_followers", author.get("followers"));
    row.count("author_following", author.get("following"));
    row.text("author_description", author.get("description"));
    row.text("author_location", author.get("location"));
    row.text("author_created_at", author.get("createdAt"));
    row.count("author_statuses_count", author.get("statusesCount"));

    let engagement = ["likeCount", "retweetCount", "replyCount", "quoteCount"]
        .iter()
        .map(|field| number(tweet.get(*field)))
        .sum::<i64>();
    row.push("engagement_total", engagement.to_string());

    let entities = tweet.get("entities").unwrap_or(&Value::Null);
    let hashtags = array(entities.get("hashtags"));
    let urls = array(entities.get("urls"));
    let mentions = array(entities.get("user_mentions"));
    row.push("hashtag_count", hashtags.len().to_string());
    row.push("hashtags", join_field(hashtags, "text"));
    row.push("url_count", urls.len().to_string());
    row.push("urls", join_field(urls, "expanded_url"));
    row.push("mention_count", mentions.len().to_string());
    row.push("mentions", join_field(mentions, "screen_name"));
}
