use std::sync::Arc;

use chrono::Duration;
use services::{
    AuthError, ErrorKind, ProgressService, ProgressServiceError, SessionTokenService, TokenClaims,
};
use storage::repository::{InMemoryRepository, UserRecord, UserRepository};
use trainer_core::analytics::Scope;
use trainer_core::model::{HISTORY_CAP, PasswordHash, ProgressDraft, User, UserId, Username};
use trainer_core::time::{Clock, fixed_now};

async fn seed_user(repo: &InMemoryRepository, username: &str) -> UserId {
    let user = User::new(
        UserId::new_random(),
        Username::parse(username).unwrap(),
        PasswordHash::new("73616c74$digest"),
        fixed_now(),
    );
    repo.insert_new_user(&UserRecord::from_user(&user))
        .await
        .unwrap();
    user.id()
}

fn progress_with(repo: &InMemoryRepository, clock: Clock) -> ProgressService {
    let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
    ProgressService::new(users, clock)
}

fn draft(accuracy: f64, comments: &str) -> ProgressDraft {
    ProgressDraft {
        completed_exercises: 5,
        accuracy,
        score: accuracy,
        level: 1,
        comments: comments.into(),
    }
}

fn claims_for(user_id: UserId) -> TokenClaims {
    let tokens = SessionTokenService::with_default_ttl(b"integration-secret".to_vec());
    let token = tokens.issue(user_id, "anna", fixed_now());
    tokens.verify(token.as_str(), fixed_now()).unwrap()
}

#[tokio::test]
async fn submit_folds_counts_and_streak() {
    let repo = InMemoryRepository::new();
    let user_id = seed_user(&repo, "anna").await;
    let progress = progress_with(&repo, Clock::fixed(fixed_now()));

    let mut last = None;
    for accuracy in [100.0, 100.0, 90.0, 100.0] {
        last = Some(progress.submit(user_id, draft(accuracy, "")).await.unwrap());
    }

    let update = last.unwrap();
    assert_eq!(update.history.len(), 4);
    assert_eq!(update.summary.progress_count, 4);
    assert_eq!(update.summary.correct_count, 3);
    assert_eq!(update.summary.incorrect_count, 0);
    assert_eq!(update.summary.streak, 1);
    assert_eq!(update.summary.total_exercises, 20);
}

#[tokio::test]
async fn submit_evicts_the_oldest_entry_past_the_cap() {
    let repo = InMemoryRepository::new();
    let user_id = seed_user(&repo, "anna").await;
    let progress = progress_with(&repo, Clock::fixed(fixed_now()));

    for n in 1..=10 {
        progress
            .submit(user_id, draft(0.0, &format!("entry {n}")))
            .await
            .unwrap();
    }
    let update = progress
        .submit(user_id, draft(100.0, "entry 11"))
        .await
        .unwrap();

    assert_eq!(update.history.len(), HISTORY_CAP);
    assert_eq!(update.history.entries()[0].comments(), "entry 2");
    assert_eq!(update.history.latest().unwrap().comments(), "entry 11");
    assert_eq!(update.summary.streak, 1);
    assert_eq!(update.summary.incorrect_count, 9);

    // the store holds the trimmed list, not just the returned view
    let stored = repo.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(stored.entries.len(), HISTORY_CAP);
    assert_eq!(stored.entries[0].comments, "entry 2");
}

#[tokio::test]
async fn submit_rejects_invalid_drafts_without_mutation() {
    let repo = InMemoryRepository::new();
    let user_id = seed_user(&repo, "anna").await;
    let progress = progress_with(&repo, Clock::fixed(fixed_now()));

    let err = progress
        .submit(user_id, draft(150.0, "out of range"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressServiceError::Validation(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let stored = repo.find_by_id(user_id).await.unwrap().unwrap();
    assert!(stored.entries.is_empty());
}

#[tokio::test]
async fn submit_requires_an_existing_user() {
    let repo = InMemoryRepository::new();
    let progress = progress_with(&repo, Clock::fixed(fixed_now()));

    let err = progress
        .submit(UserId::new_random(), draft(50.0, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressServiceError::UserNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn analytics_rejects_a_mismatched_token_subject() {
    let repo = InMemoryRepository::new();
    let user_id = seed_user(&repo, "anna").await;
    let other_id = seed_user(&repo, "bella").await;
    let progress = progress_with(&repo, Clock::fixed(fixed_now()));

    let err = progress
        .analytics_for(&claims_for(other_id), user_id, Scope::All)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProgressServiceError::Auth(AuthError::Forbidden)
    ));
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn analytics_average_is_exact() {
    let repo = InMemoryRepository::new();
    let user_id = seed_user(&repo, "anna").await;
    let progress = progress_with(&repo, Clock::fixed(fixed_now()));

    progress.submit(user_id, draft(50.0, "")).await.unwrap();
    progress.submit(user_id, draft(100.0, "")).await.unwrap();

    let summary = progress
        .analytics_for(&claims_for(user_id), user_id, Scope::All)
        .await
        .unwrap();
    assert_eq!(summary.average_accuracy, 75.0);
}

#[tokio::test]
async fn today_scope_sees_only_the_reference_day() {
    let repo = InMemoryRepository::new();
    let user_id = seed_user(&repo, "anna").await;

    let yesterday = fixed_now() - Duration::days(1);
    let progress_yesterday = progress_with(&repo, Clock::fixed(yesterday));
    progress_yesterday
        .submit(user_id, draft(100.0, "old perfect"))
        .await
        .unwrap();
    progress_yesterday
        .submit(user_id, draft(100.0, "old perfect too"))
        .await
        .unwrap();

    let progress_today = progress_with(&repo, Clock::fixed(fixed_now()));
    progress_today
        .submit(user_id, draft(100.0, "fresh"))
        .await
        .unwrap();

    let summary = progress_today
        .analytics_for(&claims_for(user_id), user_id, Scope::Today)
        .await
        .unwrap();

    assert_eq!(summary.progress_count, 1);
    assert_eq!(summary.correct_count, 1);
    assert_eq!(summary.streak, 1);
    // full-history aggregates stay global
    assert_eq!(summary.total_exercises, 15);
    assert_eq!(summary.average_accuracy, 100.0);

    let all = progress_today
        .analytics_for(&claims_for(user_id), user_id, Scope::All)
        .await
        .unwrap();
    assert_eq!(all.streak, 3);
}
