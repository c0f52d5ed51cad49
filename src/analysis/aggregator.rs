//! Relational join and summary statistics.
//!
//! This module nests posts under users and comments under posts, reports
//! the records the join leaves behind, and computes summary statistics
//! over a joined document.

use crate::models::{
    AggregatedPost, AggregatedUser, Comment, DataSummary, JoinAnomalies, Post, User,
};
use std::collections::{HashMap, HashSet};

/// Group items by a key, keeping input order within each group.
fn group_by_key<T, F>(items: &[T], key: F) -> HashMap<i64, Vec<&T>>
where
    F: Fn(&T) -> i64,
{
    let mut grouped: HashMap<i64, Vec<&T>> = HashMap::new();

    for item in items {
        grouped.entry(key(item)).or_default().push(item);
    }

    grouped
}

/// Join the three collections into one record per user.
///
/// Output follows the order of `users`; posts and comments keep the
/// order they had in their input slices. Posts whose `userId` matches
/// no user and comments whose `postId` matches no attached post are
/// not part of the result (see [`find_anomalies`]).
pub fn aggregate(users: &[User], posts: &[Post], comments: &[Comment]) -> Vec<AggregatedUser> {
    let posts_by_user = group_by_key(posts, |p| p.user_id);
    let comments_by_post = group_by_key(comments, |c| c.post_id);

    users
        .iter()
        .map(|user| {
            let posts: Vec<AggregatedPost> = posts_by_user
                .get(&user.id)
                .map(|user_posts| {
                    user_posts
                        .iter()
                        .map(|post| AggregatedPost {
                            post: (*post).clone(),
                            comments: comments_by_post
                                .get(&post.id)
                                .map(|c| c.iter().map(|comment| (*comment).clone()).collect())
                                .unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            AggregatedUser {
                user: user.clone(),
                posts,
            }
        })
        .collect()
}

/// List the posts and comments that [`aggregate`] drops.
///
/// A comment counts as dangling when its post is missing or is itself
/// dangling, since either way it never reaches the output.
pub fn find_anomalies(users: &[User], posts: &[Post], comments: &[Comment]) -> JoinAnomalies {
    let user_ids: HashSet<i64> = users.iter().map(|u| u.id).collect();

    let (attached, orphaned): (Vec<&Post>, Vec<&Post>) =
        posts.iter().partition(|p| user_ids.contains(&p.user_id));
    let attached_post_ids: HashSet<i64> = attached.iter().map(|p| p.id).collect();

    JoinAnomalies {
        orphan_posts: orphaned.iter().map(|p| p.id).collect(),
        orphan_comments: comments
            .iter()
            .filter(|c| !attached_post_ids.contains(&c.post_id))
            .map(|c| c.id)
            .collect(),
    }
}

/// Compute counts and the user with the most posts in one pass.
///
/// Only a strictly greater post count replaces the current leader, so
/// ties go to the user seen first.
pub fn summarize(users: &[AggregatedUser]) -> DataSummary {
    let mut summary = DataSummary {
        total_users: users.len(),
        ..DataSummary::default()
    };

    for entry in users {
        let post_count = entry.posts.len();
        summary.total_posts += post_count;
        summary.total_comments += entry.comment_count();

        if post_count > summary.most_posts {
            summary.most_posts = post_count;
            summary.most_posts_user = entry.user.name.clone();
        }
    }

    summary
}
