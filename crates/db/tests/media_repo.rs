//! Integration tests for the media record repository, focused on the
//! conditional lifecycle transitions.

use sqlx::PgPool;
use tini_core::media::GenerationMode;
use tini_db::models::media::{MediaListQuery, MediaRecord, NewMediaRecord};
use tini_db::models::status::MediaStatus;
use tini_db::repositories::{MediaRepo, UserRepo};

async fn create_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(pool, email, "hash")
        .await
        .expect("user creation should succeed")
        .id
}

async fn create_record(pool: &PgPool, user_id: i64, mode: GenerationMode) -> MediaRecord {
    MediaRepo::create(
        pool,
        &NewMediaRecord {
            user_id,
            mode_id: mode.id(),
            prompt: "a red fox in the snow",
            start_image_url: None,
            end_image_url: None,
            credits_charged: mode.credit_cost(),
        },
    )
    .await
    .expect("record creation should succeed")
}

#[sqlx::test(migrations = "./migrations")]
async fn new_records_start_pending_with_empty_output(pool: PgPool) {
    let user_id = create_user(&pool, "creator@test.com").await;
    let record = create_record(&pool, user_id, GenerationMode::Image).await;

    assert_eq!(record.status(), MediaStatus::Pending);
    assert_eq!(record.output_url, "");
    assert_eq!(record.storage_path, "");
    assert_eq!(record.run_id, None);
    assert_eq!(record.credits_charged, 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn attach_run_id_is_first_writer_wins(pool: PgPool) {
    let user_id = create_user(&pool, "runid@test.com").await;
    let record = create_record(&pool, user_id, GenerationMode::Video).await;

    assert!(MediaRepo::attach_run_id(&pool, record.id, "run-1").await.unwrap());
    assert!(!MediaRepo::attach_run_id(&pool, record.id, "run-2").await.unwrap());

    let row = MediaRepo::find_by_id(&pool, record.id).await.unwrap().unwrap();
    assert_eq!(row.run_id.as_deref(), Some("run-1"));
}

#[sqlx::test(migrations = "./migrations")]
async fn mark_processing_only_moves_pending_records(pool: PgPool) {
    let user_id = create_user(&pool, "processing@test.com").await;
    let record = create_record(&pool, user_id, GenerationMode::Image).await;

    assert!(MediaRepo::mark_processing(&pool, record.id).await.unwrap());
    // Second transition is a no-op.
    assert!(!MediaRepo::mark_processing(&pool, record.id).await.unwrap());

    let row = MediaRepo::find_by_id(&pool, record.id).await.unwrap().unwrap();
    assert_eq!(row.status(), MediaStatus::Processing);
}

#[sqlx::test(migrations = "./migrations")]
async fn complete_wins_exactly_once(pool: PgPool) {
    let user_id = create_user(&pool, "complete@test.com").await;
    let record = create_record(&pool, user_id, GenerationMode::Image).await;

    let first = MediaRepo::complete(&pool, record.id, "https://cdn/x.png", "media/1/x.png")
        .await
        .unwrap();
    let second = MediaRepo::complete(&pool, record.id, "https://cdn/y.png", "media/1/y.png")
        .await
        .unwrap();
    assert!(first);
    assert!(!second, "terminal records must not be rewritten");

    let row = MediaRepo::find_by_id(&pool, record.id).await.unwrap().unwrap();
    assert_eq!(row.status(), MediaStatus::Completed);
    assert_eq!(row.output_url, "https://cdn/x.png");
    assert_eq!(row.storage_path, "media/1/x.png");
}

#[sqlx::test(migrations = "./migrations")]
async fn fail_does_not_regress_a_completed_record(pool: PgPool) {
    let user_id = create_user(&pool, "sticky@test.com").await;
    let record = create_record(&pool, user_id, GenerationMode::Image).await;

    assert!(MediaRepo::complete(&pool, record.id, "https://cdn/x.png", "media/1/x.png")
        .await
        .unwrap());
    assert!(!MediaRepo::fail(&pool, record.id, "late failure").await.unwrap());

    let row = MediaRepo::find_by_id(&pool, record.id).await.unwrap().unwrap();
    assert_eq!(row.status(), MediaStatus::Completed);
    assert_eq!(row.error_message, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn record_dispatch_error_keeps_record_pending(pool: PgPool) {
    let user_id = create_user(&pool, "dispatch@test.com").await;
    let record = create_record(&pool, user_id, GenerationMode::Video).await;

    MediaRepo::record_dispatch_error(&pool, record.id, "connection refused")
        .await
        .unwrap();

    let row = MediaRepo::find_by_id(&pool, record.id).await.unwrap().unwrap();
    assert_eq!(row.status(), MediaStatus::Pending);
    assert_eq!(row.metadata["dispatch_error"], "connection refused");
}

#[sqlx::test(migrations = "./migrations")]
async fn list_by_user_filters_by_status(pool: PgPool) {
    let user_id = create_user(&pool, "lister@test.com").await;
    let a = create_record(&pool, user_id, GenerationMode::Image).await;
    let _b = create_record(&pool, user_id, GenerationMode::Video).await;
    MediaRepo::fail(&pool, a.id, "boom").await.unwrap();

    let all = MediaRepo::list_by_user(
        &pool,
        user_id,
        &MediaListQuery { status: None, limit: None },
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 2);

    let failed = MediaRepo::list_by_user(
        &pool,
        user_id,
        &MediaListQuery {
            status: Some("failed".to_string()),
            limit: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, a.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_completed_images_skips_videos_and_unfinished(pool: PgPool) {
    let user_id = create_user(&pool, "gallery@test.com").await;
    let image = create_record(&pool, user_id, GenerationMode::Image).await;
    let video = create_record(&pool, user_id, GenerationMode::Video).await;
    let _pending_image = create_record(&pool, user_id, GenerationMode::Image).await;

    MediaRepo::complete(&pool, image.id, "https://cdn/i.png", "media/1/i.png")
        .await
        .unwrap();
    MediaRepo::complete(&pool, video.id, "https://cdn/v.mp4", "media/1/v.mp4")
        .await
        .unwrap();

    let images = MediaRepo::list_completed_images(&pool, user_id).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, image.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_reports_whether_a_row_was_removed(pool: PgPool) {
    let user_id = create_user(&pool, "deleter@test.com").await;
    let record = create_record(&pool, user_id, GenerationMode::Image).await;

    assert!(MediaRepo::delete(&pool, record.id).await.unwrap());
    assert!(!MediaRepo::delete(&pool, record.id).await.unwrap());
    assert!(MediaRepo::find_by_id(&pool, record.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn fail_stale_only_touches_old_non_terminal_records(pool: PgPool) {
    let user_id = create_user(&pool, "sweeper@test.com").await;
    let stale = create_record(&pool, user_id, GenerationMode::Image).await;
    let done = create_record(&pool, user_id, GenerationMode::Image).await;
    MediaRepo::complete(&pool, done.id, "https://cdn/d.png", "media/1/d.png")
        .await
        .unwrap();

    // Future cutoff makes both records "old"; only the pending one flips.
    let cutoff = chrono::Utc::now() + chrono::Duration::minutes(5);
    let flipped = MediaRepo::fail_stale(&pool, cutoff, "Generation timed out")
        .await
        .unwrap();
    assert_eq!(flipped, 1);

    let row = MediaRepo::find_by_id(&pool, stale.id).await.unwrap().unwrap();
    assert_eq!(row.status(), MediaStatus::Failed);
    assert_eq!(row.error_message.as_deref(), Some("Generation timed out"));

    let done_row = MediaRepo::find_by_id(&pool, done.id).await.unwrap().unwrap();
    assert_eq!(done_row.status(), MediaStatus::Completed);
}
