//! Integration tests for the ingestion state machine.
//!
//! Tests cover:
//! - Movie and episode relocation end to end
//! - Rejections (extension, ambiguous name, declined) leave the file untouched
//! - Collisions in the watch and library directories
//! - Stabilization of zero-byte and deleted files

use media_sorter::core::ingest::{
    Confirm, IngestState, IngestionStateMachine, Outcome, Residual,
};
use media_sorter::core::parser::NameParser;
use media_sorter::core::planner::PathPlanner;
use media_sorter::core::stabilizer::Stabilizer;
use media_sorter::error::CollisionScope;
use media_sorter::models::media::{ContentType, MediaItem};
use media_sorter::utils::fs::RealFs;
use media_sorter::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Answers every prompt the same way and counts how often it was asked.
struct Scripted {
    answer: bool,
    asked: AtomicUsize,
}

impl Scripted {
    fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }
}

impl Confirm for Scripted {
    async fn confirm(&self, _item: &MediaItem) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

struct Library {
    _root: TempDir,
    watch: PathBuf,
    movies: PathBuf,
    tv: PathBuf,
}

impl Library {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let watch = root.path().join("watch");
        let movies = root.path().join("Movies");
        let tv = root.path().join("TV");
        for dir in [&watch, &movies, &tv] {
            fs::create_dir_all(dir).unwrap();
        }
        Self {
            _root: root,
            watch,
            movies,
            tv,
        }
    }

    fn drop_file(&self, name: &str, content: &str) -> MediaItem {
        let path = self.watch.join(name);
        fs::write(&path, content).unwrap();
        MediaItem::new(name, path)
    }

    fn machine(&self, confirm: Scripted) -> IngestionStateMachine<RealFs, Scripted> {
        self.machine_with(confirm, Stabilizer::new(Duration::from_millis(10), Some(20)))
    }

    fn machine_with(
        &self,
        confirm: Scripted,
        stabilizer: Stabilizer,
    ) -> IngestionStateMachine<RealFs, Scripted> {
        IngestionStateMachine::new(
            NameParser::new(),
            PathPlanner::new(&self.movies, &self.tv),
            stabilizer,
            RealFs,
            confirm,
        )
    }
}

fn expect_rejected(outcome: Outcome) -> media_sorter::core::ingest::Rejection {
    match outcome {
        Outcome::Rejected(rejection) => rejection,
        Outcome::Relocated(item) => panic!("expected rejection, got {:?}", item),
    }
}

fn exists(path: &Path) -> bool {
    path.exists()
}

// ========== SUCCESSFUL RELOCATION ==========

#[tokio::test]
async fn test_movie_is_renamed_and_moved() {
    let lib = Library::new();
    let item = lib.drop_file("the.matrix.1999.mkv", "fake video");

    let outcome = lib
        .machine(Scripted::new(true))
        .run(item, &CancellationToken::new())
        .await;

    let item = match outcome {
        Outcome::Relocated(item) => item,
        Outcome::Rejected(r) => panic!("unexpected rejection: {}", r),
    };
    let expected = lib.movies.join("The Matrix (1999).mkv");
    assert_eq!(item.content_type, ContentType::Movie);
    assert_eq!(item.title.as_deref(), Some("The Matrix"));
    assert_eq!(item.year.as_deref(), Some("1999"));
    assert!(item.episode_tag.is_none());
    assert_eq!(item.proposed_name.as_deref(), Some("The Matrix (1999).mkv"));
    assert_eq!(item.final_destination_path.as_deref(), Some(expected.as_path()));
    assert!(item.available);

    assert!(exists(&expected));
    assert_eq!(fs::read_to_string(&expected).unwrap(), "fake video");
    assert!(!exists(&lib.watch.join("the.matrix.1999.mkv")));
    assert!(!exists(&lib.watch.join("The Matrix (1999).mkv")));
}

#[tokio::test]
async fn test_episode_creates_season_directory() {
    let lib = Library::new();
    let item = lib.drop_file("breaking.bad.s01e05.mp4", "fake episode");

    let outcome = lib
        .machine(Scripted::new(true))
        .run(item, &CancellationToken::new())
        .await;

    assert!(outcome.is_relocated());
    let expected = lib
        .tv
        .join("Breaking Bad")
        .join("Season 1")
        .join("Breaking Bad - S01E05.mp4");
    assert!(exists(&expected));
    assert!(!exists(&lib.watch.join("breaking.bad.s01e05.mp4")));
}

#[tokio::test]
async fn test_episode_into_existing_season_directory() {
    let lib = Library::new();
    let season = lib.tv.join("Breaking Bad").join("Season 2");
    fs::create_dir_all(&season).unwrap();
    fs::write(season.join("Breaking Bad - S02E01.mkv"), "older").unwrap();

    let item = lib.drop_file("Breaking.Bad.S02E02.1080p.mkv", "newer");
    let outcome = lib
        .machine(Scripted::new(true))
        .run(item, &CancellationToken::new())
        .await;

    assert!(outcome.is_relocated());
    assert!(exists(&season.join("Breaking Bad - S02E02.mkv")));
    assert!(exists(&season.join("Breaking Bad - S02E01.mkv")));
}

// ========== REJECTIONS BEFORE ANY MUTATION ==========

#[tokio::test]
async fn test_unsupported_extension_is_rejected_untouched() {
    let lib = Library::new();
    let item = lib.drop_file("notes.1999.txt", "text");
    let confirm = Scripted::new(true);
    let machine = lib.machine(confirm);

    let rejection = expect_rejected(machine.run(item, &CancellationToken::new()).await);

    assert!(matches!(rejection.reason, Error::UnsupportedExtension(_)));
    assert_eq!(rejection.state, IngestState::Stabilizing);
    assert_eq!(
        rejection.residual,
        Residual::Untouched(lib.watch.join("notes.1999.txt"))
    );
    assert!(exists(&lib.watch.join("notes.1999.txt")));
}

#[tokio::test]
async fn test_empty_non_video_is_rejected_without_waiting() {
    let lib = Library::new();
    let item = lib.drop_file("notes.txt", "");
    let machine = lib.machine_with(
        Scripted::new(true),
        Stabilizer::new(Duration::from_millis(10), None),
    );

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        machine.run(item, &CancellationToken::new()),
    )
    .await
    .expect("unsupported file must not wait for stabilization");

    let rejection = expect_rejected(outcome);
    assert!(matches!(rejection.reason, Error::UnsupportedExtension(_)));
    assert_eq!(rejection.state, IngestState::Stabilizing);
    assert!(!rejection.item.available);
}

#[tokio::test]
async fn test_ambiguous_name_is_rejected() {
    let lib = Library::new();
    let item = lib.drop_file("home.video.mkv", "video");

    let rejection = expect_rejected(
        lib.machine(Scripted::new(true))
            .run(item, &CancellationToken::new())
            .await,
    );

    assert!(matches!(rejection.reason, Error::AmbiguousFilename(_)));
    assert!(exists(&lib.watch.join("home.video.mkv")));
}

#[tokio::test]
async fn test_declined_leaves_original_untouched() {
    let lib = Library::new();
    let item = lib.drop_file("heat.1995.mkv", "video");

    let rejection = expect_rejected(
        lib.machine(Scripted::new(false))
            .run(item, &CancellationToken::new())
            .await,
    );

    assert!(matches!(rejection.reason, Error::Declined(_)));
    assert_eq!(rejection.state, IngestState::AwaitingConfirmation);
    assert_eq!(
        rejection.item.proposed_name.as_deref(),
        Some("Heat (1995).mkv")
    );
    assert!(exists(&lib.watch.join("heat.1995.mkv")));
    assert!(!exists(&lib.movies.join("Heat (1995).mkv")));
}

// ========== COLLISIONS ==========

#[tokio::test]
async fn test_source_collision_leaves_original_untouched() {
    let lib = Library::new();
    fs::write(lib.watch.join("Heat (1995).mkv"), "someone else").unwrap();
    let item = lib.drop_file("heat.1995.mkv", "video");

    let rejection = expect_rejected(
        lib.machine(Scripted::new(true))
            .run(item, &CancellationToken::new())
            .await,
    );

    match &rejection.reason {
        Error::NameCollision { scope, .. } => assert_eq!(*scope, CollisionScope::Source),
        other => panic!("unexpected reason: {}", other),
    }
    assert_eq!(rejection.state, IngestState::Renaming);
    assert_eq!(
        fs::read_to_string(lib.watch.join("Heat (1995).mkv")).unwrap(),
        "someone else"
    );
    assert!(exists(&lib.watch.join("heat.1995.mkv")));
}

#[tokio::test]
async fn test_destination_collision_leaves_file_renamed() {
    let lib = Library::new();
    fs::write(lib.movies.join("Heat (1995).mkv"), "library copy").unwrap();
    let item = lib.drop_file("heat.1995.mkv", "new download");

    let rejection = expect_rejected(
        lib.machine(Scripted::new(true))
            .run(item, &CancellationToken::new())
            .await,
    );

    let renamed = lib.watch.join("Heat (1995).mkv");
    match &rejection.reason {
        Error::NameCollision { scope, path } => {
            assert_eq!(*scope, CollisionScope::Destination);
            assert_eq!(path, &lib.movies.join("Heat (1995).mkv"));
        }
        other => panic!("unexpected reason: {}", other),
    }
    assert_eq!(rejection.state, IngestState::Moving);
    assert_eq!(rejection.residual, Residual::Renamed(renamed.clone()));
    assert!(rejection.item.final_destination_path.is_none());

    // Renamed in place, not rolled back, and the library copy is intact.
    assert!(!exists(&lib.watch.join("heat.1995.mkv")));
    assert_eq!(fs::read_to_string(&renamed).unwrap(), "new download");
    assert_eq!(
        fs::read_to_string(lib.movies.join("Heat (1995).mkv")).unwrap(),
        "library copy"
    );
}

// ========== STABILIZATION ==========

#[tokio::test]
async fn test_zero_byte_file_waits_until_written() {
    let lib = Library::new();
    let item = lib.drop_file("alien.1979.mkv", "");
    let path = lib.watch.join("alien.1979.mkv");

    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&path, "now written").unwrap();
    });

    let machine = lib.machine_with(
        Scripted::new(true),
        Stabilizer::new(Duration::from_millis(10), None),
    );
    let outcome = machine.run(item, &CancellationToken::new()).await;
    writer.await.unwrap();

    assert!(outcome.is_relocated());
    assert_eq!(
        fs::read_to_string(lib.movies.join("Alien (1979).mkv")).unwrap(),
        "now written"
    );
}

#[tokio::test]
async fn test_zero_byte_file_times_out_when_bounded() {
    let lib = Library::new();
    let item = lib.drop_file("alien.1979.mkv", "");
    let confirm = Scripted::new(true);

    let machine = lib.machine_with(confirm, Stabilizer::new(Duration::from_millis(5), Some(3)));
    let rejection = expect_rejected(machine.run(item, &CancellationToken::new()).await);

    assert!(matches!(
        rejection.reason,
        Error::StabilizationTimeout { attempts: 3, .. }
    ));
    assert_eq!(rejection.state, IngestState::Stabilizing);
    assert!(!rejection.item.available);
    assert!(rejection.item.title.is_none());
}

#[tokio::test]
async fn test_deleted_file_is_reported_vanished() {
    let lib = Library::new();
    let item = lib.drop_file("alien.1979.mkv", "");
    let path = lib.watch.join("alien.1979.mkv");
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        fs::remove_file(&path).unwrap();
        trigger.cancel();
    });

    let machine = lib.machine_with(
        Scripted::new(true),
        Stabilizer::new(Duration::from_millis(10), None),
    );
    let rejection = expect_rejected(machine.run(item, &cancel).await);

    assert!(matches!(rejection.reason, Error::SourceVanished(_)));
    assert_eq!(rejection.state, IngestState::Stabilizing);
}
