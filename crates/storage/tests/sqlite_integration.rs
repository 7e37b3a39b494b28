use chrono::Duration;
use storage::repository::{StorageError, UserRecord, UserRepository};
use storage::sqlite::SqliteRepository;
use trainer_core::model::{
    HISTORY_CAP, PasswordHash, ProgressDraft, ProgressEntry, User, UserId, Username,
};
use trainer_core::time::fixed_now;

fn build_user(username: &str) -> User {
    User::new(
        UserId::new_random(),
        Username::parse(username).unwrap(),
        PasswordHash::new("73616c74$matching-digest"),
        fixed_now(),
    )
}

fn entry(n: u32, accuracy: f64) -> ProgressEntry {
    ProgressDraft {
        completed_exercises: n,
        accuracy,
        score: f64::from(n) * 10.0,
        level: 1,
        comments: format!("round {n}"),
    }
    .validate(fixed_now() + Duration::minutes(i64::from(n)))
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_persists_user_and_entries() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut user = build_user("anna");
    user.record_progress(entry(1, 100.0));
    user.record_progress(entry(2, 40.0));
    repo.insert_new_user(&UserRecord::from_user(&user))
        .await
        .unwrap();

    let fetched = repo
        .find_by_username("anna")
        .await
        .expect("fetch")
        .expect("present")
        .into_user()
        .unwrap();

    assert_eq!(fetched.id(), user.id());
    assert_eq!(fetched.username().as_str(), "anna");
    assert_eq!(fetched.history().len(), 2);
    assert_eq!(fetched.history().entries()[0].accuracy(), 100.0);
    assert_eq!(fetched.history().latest().unwrap().comments(), "round 2");
}

#[tokio::test]
async fn sqlite_rejects_duplicate_username() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_duplicate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.insert_new_user(&UserRecord::from_user(&build_user("anna")))
        .await
        .unwrap();

    let err = repo
        .insert_new_user(&UserRecord::from_user(&build_user("anna")))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_replace_history_swaps_the_whole_list() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_replace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut user = build_user("anna");
    user.record_progress(entry(1, 10.0));
    repo.insert_new_user(&UserRecord::from_user(&user))
        .await
        .unwrap();

    for n in 2..=12 {
        user.record_progress(entry(n, 50.0));
    }
    repo.replace_history(user.id(), user.history()).await.unwrap();

    let fetched = repo
        .find_by_id(user.id())
        .await
        .unwrap()
        .unwrap()
        .into_user()
        .unwrap();

    assert_eq!(fetched.history().len(), HISTORY_CAP);
    // the two oldest entries were evicted before the swap
    assert_eq!(fetched.history().entries()[0].completed_exercises(), 3);
    assert_eq!(
        fetched.history().latest().unwrap().completed_exercises(),
        12
    );
}

#[tokio::test]
async fn sqlite_replace_history_requires_existing_user() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = build_user("ghost");
    let err = repo
        .replace_history(user.id(), user.history())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_update_password_hash_persists() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_pwhash?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = build_user("anna");
    repo.insert_new_user(&UserRecord::from_user(&user))
        .await
        .unwrap();

    repo.update_password_hash(user.id(), &PasswordHash::new("6e6577$new-digest"))
        .await
        .unwrap();

    let fetched = repo.find_by_id(user.id()).await.unwrap().unwrap();
    assert_eq!(fetched.password_hash, "6e6577$new-digest");

    let err = repo
        .update_password_hash(UserId::new_random(), &PasswordHash::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
