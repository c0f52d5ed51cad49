//! Data models for the fetch-and-join pipeline.
//!
//! This module contains the records fetched from the remote endpoints,
//! the nested aggregate built from them, and the summary derived from
//! the persisted aggregate.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The three remote collections the pipeline fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Users,
    Posts,
    Comments,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "users"),
            Resource::Posts => write!(f, "posts"),
            Resource::Comments => write!(f, "comments"),
        }
    }
}

/// A user record as served by the users endpoint.
///
/// Missing keys decode to their zero value, so partial records are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// A post record. `user_id` refers to [`User::id`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub title: String,
    pub body: String,
}

/// A comment record. `post_id` refers to [`Post::id`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: i64,
    #[serde(rename = "postId")]
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
}

/// A post together with the comments that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedPost {
    pub post: Post,
    /// Comments in the order they were fetched.
    #[serde(alias = "comment", default, deserialize_with = "null_as_empty")]
    pub comments: Vec<Comment>,
}

/// A user together with their posts, each carrying its comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedUser {
    pub user: User,
    /// Posts in the order they were fetched.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub posts: Vec<AggregatedPost>,
}

impl AggregatedUser {
    /// Number of comments across all of this user's posts.
    pub fn comment_count(&self) -> usize {
        self.posts.iter().map(|p| p.comments.len()).sum()
    }
}

/// Empty lists are written as `null` by some producers of aggregate files.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Summary statistics over a persisted aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSummary {
    /// Number of top-level user records.
    pub total_users: usize,
    /// Sum of posts over all users.
    pub total_posts: usize,
    /// Sum of comments over all posts.
    pub total_comments: usize,
    /// Name of the user with the most posts; empty when no user has any.
    pub most_posts_user: String,
    /// Post count of `most_posts_user`.
    pub most_posts: usize,
}

/// Dangling references found while joining the fetched collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAnomalies {
    /// IDs of posts whose `userId` matches no fetched user.
    pub orphan_posts: Vec<i64>,
    /// IDs of comments whose `postId` matches no attached post.
    pub orphan_comments: Vec<i64>,
}

impl JoinAnomalies {
    pub fn is_empty(&self) -> bool {
        self.orphan_posts.is_empty() && self.orphan_comments.is_empty()
    }

    /// Total number of records dropped by the join.
    pub fn len(&self) -> usize {
        self.orphan_posts.len() + self.orphan_comments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_display() {
        assert_eq!(Resource::Users.to_string(), "users");
        assert_eq!(Resource::Posts.to_string(), "posts");
        assert_eq!(Resource::Comments.to_string(), "comments");
    }

    #[test]
    fn test_post_uses_wire_keys() {
        let post: Post =
            serde_json::from_str(r#"{"id": 3, "userId": 7, "title": "t", "body": "b"}"#).unwrap();
        assert_eq!(post.user_id, 7);

        let json = serde_json::to_string(&post).unwrap();
        assert!(json.contains("\"userId\":7"));
        assert!(!json.contains("user_id"));
    }

    #[test]
    fn test_user_ignores_extra_fields() {
        let json = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {"city": "Gwenborough"},
            "phone": "1-770-736-8031 x56442"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "Bret");
    }

    #[test]
    fn test_partial_records_fill_zero_values() {
        let user: User = serde_json::from_str(r#"{"id": 1, "name": "Alice"}"#).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Alice");
        assert!(user.username.is_empty());
        assert!(user.email.is_empty());

        let post: Post = serde_json::from_str(r#"{"id": 10, "userId": 1}"#).unwrap();
        assert_eq!(post.user_id, 1);
        assert!(post.title.is_empty());

        let comment: Comment = serde_json::from_str(r#"{"postId": 10, "body": "B"}"#).unwrap();
        assert_eq!(comment.id, 0);
        assert_eq!(comment.post_id, 10);
        assert_eq!(comment.body, "B");
    }

    #[test]
    fn test_aggregated_post_accepts_legacy_keys() {
        let json = r#"{
            "post": {"id": 1, "userId": 1, "title": "t", "body": "b"},
            "comment": [{"id": 9, "postId": 1, "name": "n", "email": "e", "body": "c"}]
        }"#;
        let post: AggregatedPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].id, 9);
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let json = r#"[
            {"user": {"id": 1, "name": "A", "username": "a", "email": "a@x"}, "posts": null},
            {"user": {"id": 2, "name": "B", "username": "b", "email": "b@x"},
             "posts": [{"post": {"id": 5, "userId": 2, "title": "t", "body": "b"}, "comment": null}]},
            {"user": {"id": 3, "name": "C", "username": "c", "email": "c@x"}}
        ]"#;
        let users: Vec<AggregatedUser> = serde_json::from_str(json).unwrap();
        assert!(users[0].posts.is_empty());
        assert!(users[1].posts[0].comments.is_empty());
        assert!(users[2].posts.is_empty());
    }

    #[test]
    fn test_join_anomalies_len() {
        let anomalies = JoinAnomalies {
            orphan_posts: vec![1, 2],
            orphan_comments: vec![3],
        };
        assert_eq!(anomalies.len(), 3);
        assert!(!anomalies.is_empty());
        assert!(JoinAnomalies::default().is_empty());
    }
}
