use colored::Colorize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::pr::{Comment, PrError, PullRequest, PullRequestApi};

/// Marks comments written by this tool. Changing it orphans existing comments.
pub const HEADER: &str = "## Pull Request Summary from Gemini ✨";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Api(#[from] PrError),

    #[error("Pull request #{0} has no commits")]
    NoCommits(u64),
}

/// Which of the two terminal paths a publish took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Updated { comment_id: u64 },
    Created { comment_id: u64 },
}

/// First comment in `comments` satisfying `predicate`.
pub fn find_first<'a>(
    comments: &'a [Comment],
    predicate: impl Fn(&Comment) -> bool,
) -> Option<&'a Comment> {
    comments.iter().find(|c| predicate(c))
}

/// Whether `comment` is a previous summary posted by `bot_login`.
pub fn is_summary_comment(comment: &Comment, bot_login: &str) -> bool {
    comment.author == bot_login && comment.body.contains(HEADER)
}

/// Header and summary, without the trailing footer.
pub fn body_prefix(summary: &str) -> String {
    format!("{}\n {} \n---\n ", HEADER, summary)
}

pub fn updated_body(summary: &str, sha: &str) -> String {
    format!("{}Updated at `{}`\n", body_prefix(summary), sha)
}

pub fn generated_body(summary: &str, sha: &str) -> String {
    format!("{}Generated at `{}`\n", body_prefix(summary), sha)
}

/// The SHA stamped in the footer: the first commit as the provider listed it.
pub fn footer_sha(pr: &PullRequest) -> Result<&str, PublishError> {
    pr.commits
        .first()
        .map(|c| c.sha.as_str())
        .ok_or(PublishError::NoCommits(pr.number))
}

/// Edit the existing summary comment on the PR, or create one.
///
/// Only the first matching comment is edited, so repeated runs keep a
/// single summary comment per PR.
#[instrument(skip_all, fields(pr = pr.number))]
pub async fn publish(
    api: &dyn PullRequestApi,
    pr: &PullRequest,
    summary: &str,
    bot_login: &str,
) -> Result<PublishOutcome, PublishError> {
    let sha = footer_sha(pr)?;

    match find_first(&pr.comments, |c| is_summary_comment(c, bot_login)) {
        Some(existing) => {
            info!(comment_id = existing.id, "updating existing summary comment");
            let edited = api
                .edit_comment(existing.id, &updated_body(summary, sha))
                .await?;
            Ok(PublishOutcome::Updated {
                comment_id: edited.id,
            })
        }
        None => {
            info!("creating summary comment");
            let created = api
                .create_comment(pr.number, &generated_body(summary, sha))
                .await?;
            Ok(PublishOutcome::Created {
                comment_id: created.id,
            })
        }
    }
}

/// Print the comment body that would be published, for `--dry-run`.
pub fn print_preview(pr: &PullRequest, summary: &str) -> Result<(), PublishError> {
    let body = generated_body(summary, footer_sha(pr)?);
    println!();
    println!("{}", format!("PR #{}: \"{}\"", pr.number, pr.title).bold());
    println!("{}", "═══ Comment preview (not posted) ═══".cyan().bold());
    println!("{}", body);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::tests::{test_comment, test_pull_request, FakeApi};

    const BOT: &str = "github-actions[bot]";

    #[test]
    fn test_body_layout() {
        assert_eq!(
            generated_body("Adds a flow.", "abc123"),
            "## Pull Request Summary from Gemini ✨\n Adds a flow. \n---\n Generated at `abc123`\n"
        );
        assert_eq!(
            updated_body("Adds a flow.", "abc123"),
            "## Pull Request Summary from Gemini ✨\n Adds a flow. \n---\n Updated at `abc123`\n"
        );
    }

    #[test]
    fn test_find_first_returns_earliest_match() {
        let comments = vec![
            test_comment(1, "alice", "LGTM"),
            test_comment(2, BOT, HEADER),
            test_comment(3, BOT, HEADER),
        ];
        let found = find_first(&comments, |c| is_summary_comment(c, BOT)).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_find_first_none() {
        let comments = vec![test_comment(1, "alice", "LGTM")];
        assert!(find_first(&comments, |c| is_summary_comment(c, BOT)).is_none());
        assert!(find_first(&[], |_| true).is_none());
    }

    #[test]
    fn test_match_requires_bot_and_header() {
        assert!(!is_summary_comment(&test_comment(1, BOT, "Unrelated bot output"), BOT));
        assert!(!is_summary_comment(&test_comment(1, "alice", HEADER), BOT));
        assert!(is_summary_comment(
            &test_comment(1, BOT, &generated_body("x", "abc")),
            BOT
        ));
    }

    #[tokio::test]
    async fn test_creates_when_no_match() {
        let mut pr = test_pull_request();
        pr.comments = vec![test_comment(1, "alice", HEADER)];
        let api = FakeApi::new(pr.clone());

        let outcome = publish(&api, &pr, "Adds a flow.", BOT).await.unwrap();

        assert!(matches!(outcome, PublishOutcome::Created { .. }));
        let comments = api.comments();
        assert_eq!(comments.len(), 2);
        let created = &comments[1];
        assert!(created.body.starts_with(HEADER));
        assert!(created.body.contains("Generated at `abc123`"));
    }

    #[tokio::test]
    async fn test_updates_matching_comment_in_place() {
        let mut pr = test_pull_request();
        pr.comments = vec![
            test_comment(10, "alice", "first!"),
            test_comment(11, BOT, &generated_body("old", "old-sha")),
        ];
        let api = FakeApi::new(pr.clone());

        let outcome = publish(&api, &pr, "new summary", BOT).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Updated { comment_id: 11 });
        let comments = api.comments();
        assert_eq!(comments.len(), 2);
        assert!(comments[1].body.contains("new summary"));
        assert!(comments[1].body.contains("Updated at `abc123`"));
        assert_eq!(*api.creates.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_only_first_match_is_edited() {
        let mut pr = test_pull_request();
        pr.comments = vec![
            test_comment(1, BOT, HEADER),
            test_comment(2, BOT, HEADER),
        ];
        let api = FakeApi::new(pr.clone());

        publish(&api, &pr, "s", BOT).await.unwrap();

        assert_eq!(*api.edits.lock().unwrap(), 1);
        assert_eq!(api.comments()[1].body, HEADER);
    }

    #[tokio::test]
    async fn test_publish_twice_keeps_one_comment() {
        let mut pr = test_pull_request();
        pr.comments = vec![test_comment(5, BOT, &generated_body("earlier", "abc123"))];
        let api = FakeApi::new(pr);

        for _ in 0..2 {
            let pr = api.fetch_pull_request(7).await.unwrap();
            let outcome = publish(&api, &pr, "summary", BOT).await.unwrap();
            assert_eq!(outcome, PublishOutcome::Updated { comment_id: 5 });
        }

        assert_eq!(api.comments().len(), 1);
        assert_eq!(*api.creates.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_then_rerun_edits() {
        let api = FakeApi::new(test_pull_request());

        let pr = api.fetch_pull_request(7).await.unwrap();
        let first = publish(&api, &pr, "summary", BOT).await.unwrap();
        let pr = api.fetch_pull_request(7).await.unwrap();
        let second = publish(&api, &pr, "summary", BOT).await.unwrap();

        let PublishOutcome::Created { comment_id } = first else {
            panic!("expected create, got {first:?}");
        };
        assert_eq!(second, PublishOutcome::Updated { comment_id });
        assert_eq!(api.comments().len(), 1);
    }

    #[tokio::test]
    async fn test_footer_uses_first_listed_commit() {
        let mut pr = test_pull_request();
        pr.commits = vec![
            crate::pr::Commit { sha: "oldest".to_string() },
            crate::pr::Commit { sha: "newest".to_string() },
        ];
        let api = FakeApi::new(pr.clone());

        publish(&api, &pr, "s", BOT).await.unwrap();

        assert!(api.comments()[0].body.contains("Generated at `oldest`"));
    }

    #[tokio::test]
    async fn test_no_commits_is_an_error() {
        let mut pr = test_pull_request();
        pr.commits.clear();
        let api = FakeApi::new(pr.clone());

        let err = publish(&api, &pr, "s", BOT).await.unwrap_err();

        assert!(matches!(err, PublishError::NoCommits(7)));
        assert!(api.comments().is_empty());
    }

    #[test]
    fn test_print_preview_does_not_panic() {
        print_preview(&test_pull_request(), "summary").unwrap();
    }
}
