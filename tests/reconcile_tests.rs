mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{BrokenSource, FakeMetadata, MemorySink, StaticSource, collaborators, drain, owned, source};
use gaps::domain::events::NotificationEvent;
use gaps::domain::{CollectionId, RunPhase, TmdbId};
use gaps::library::{LibraryEntry, LibrarySource};
use gaps::models::Movie;
use gaps::services::{Reconciler, RunHandle, RunOptions, RunOutcome};

fn options() -> RunOptions {
    RunOptions {
        current_year: 2030,
        image_base_url: "https://image.tmdb.org/t/p/w185".to_string(),
    }
}

fn saga() -> FakeMetadata {
    FakeMetadata::default()
        .with_movie(10, "Movie A", Some((99, "Saga")))
        .with_movie(11, "Movie B", Some((99, "Saga")))
        .with_collection(
            99,
            "Saga",
            &[(10, "Movie A", "2001-05-04"), (11, "Movie B", "2002-06-01")],
        )
}

async fn run(
    metadata: Arc<FakeMetadata>,
    sink: Arc<MemorySink>,
    sources: Vec<Arc<dyn LibrarySource>>,
) -> (gaps::services::RunReport, Arc<RunHandle>, Vec<NotificationEvent>) {
    let (deps, mut rx) = collaborators(metadata, sink);
    let handle = Arc::new(RunHandle::new());
    let report = Reconciler::new(deps, Arc::clone(&handle), options())
        .run(&sources)
        .await;
    (report, handle, drain(&mut rx))
}

#[tokio::test]
async fn recommends_missing_collection_member() {
    let metadata = Arc::new(saga());
    let sink = Arc::new(MemorySink::default());

    let (report, handle, events) = run(
        Arc::clone(&metadata),
        Arc::clone(&sink),
        source(vec![owned("Movie A", 2001).with_guid("tmdb://10")]),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.recommended.len(), 1);

    let movie = &report.recommended[0];
    assert_eq!(movie.title, "Movie B");
    assert_eq!(movie.year, 2002);
    assert_eq!(movie.tmdb_id, Some(TmdbId::new(11)));
    assert_eq!(movie.collection_id, Some(CollectionId::new(99)));
    assert_eq!(movie.collection_name.as_deref(), Some("Saga"));
    assert_eq!(movie.imdb_id.as_deref(), Some("tt0000011"));

    // A known TMDB id needs no search.
    assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 0);
    assert_eq!(metadata.collection_calls.load(Ordering::SeqCst), 1);

    assert_eq!(handle.phase(), RunPhase::Completed);
    assert_eq!(handle.total_count(), 1);
    assert_eq!(handle.searched_count(), 1);
    assert_eq!(handle.recommended_snapshot(), report.recommended);

    assert_eq!(sink.partial_writes.load(Ordering::SeqCst), 1);
    assert_eq!(
        sink.final_movies.lock().unwrap().clone(),
        Some(report.recommended.clone())
    );

    assert!(matches!(events.first(), Some(NotificationEvent::SearchStarted { .. })));
    assert!(matches!(
        events.last(),
        Some(NotificationEvent::SearchFinished { recommended: 1, .. })
    ));
    assert!(events.iter().any(|e| matches!(
        e,
        NotificationEvent::OwnedMoviesFound { total: 1, .. }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        NotificationEvent::SearchProgress { movie: Some(m), .. } if m.title == "Movie B"
    )));
}

#[tokio::test]
async fn recommendation_uses_the_canonical_title() {
    let metadata = Arc::new(saga().with_movie(11, "Movie B Extended Title", Some((99, "Saga"))));
    let sink = Arc::new(MemorySink::default());

    let (report, handle, _) = run(
        metadata,
        Arc::clone(&sink),
        source(vec![owned("Movie A", 2001).with_guid("tmdb://10")]),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    let titles: Vec<&str> = report.recommended.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Movie B Extended Title"]);
    assert_eq!(report.recommended[0].year, 2002);
    assert_eq!(report.recommended[0].tmdb_id, Some(TmdbId::new(11)));
    assert_eq!(handle.recommended_snapshot(), report.recommended);
    assert_eq!(
        sink.final_movies.lock().unwrap().clone(),
        Some(report.recommended.clone())
    );
}

#[tokio::test]
async fn member_without_release_date_is_skipped() {
    let metadata = Arc::new(
        saga()
            .with_movie(12, "Movie C", None)
            .with_collection(
                99,
                "Saga",
                &[
                    (10, "Movie A", "2001-05-04"),
                    (12, "Movie C", ""),
                    (11, "Movie B", "2002-06-01"),
                ],
            ),
    );

    let (report, _, _) = run(
        Arc::clone(&metadata),
        Arc::new(MemorySink::default()),
        source(vec![owned("Movie A", 2001).with_guid("tmdb://10")]),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    let titles: Vec<&str> = report.recommended.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Movie B"]);
    // Movie A details plus Movie B details, nothing for the undated member.
    assert_eq!(metadata.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shared_collection_is_fetched_once() {
    let metadata = Arc::new(
        saga()
            .with_movie(12, "Movie C", Some((99, "Saga")))
            .with_movie(13, "Movie D", Some((99, "Saga")))
            .with_collection(
                99,
                "Saga",
                &[
                    (10, "Movie A", "2001-05-04"),
                    (11, "Movie B", "2002-06-01"),
                    (12, "Movie C", "2005-01-01"),
                ],
            ),
    );

    // Movie D claims the collection but is not listed among its parts.
    let (report, _, _) = run(
        Arc::clone(&metadata),
        Arc::new(MemorySink::default()),
        source(vec![
            owned("Movie A", 2001).with_guid("tmdb://10"),
            owned("Movie B", 2002).with_guid("tmdb://11"),
            owned("Movie D", 2008).with_guid("tmdb://13"),
        ]),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(metadata.collection_calls.load(Ordering::SeqCst), 1);

    let titles: Vec<&str> = report.recommended.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Movie C"]);
    assert_eq!(report.searched, 3);
    assert_eq!(report.total, 3);
}

#[tokio::test]
async fn owned_and_future_members_are_never_recommended() {
    let metadata = Arc::new(
        saga()
            .with_movie(14, "Movie E", None)
            .with_movie(15, "Movie F", None)
            .with_collection(
                99,
                "Saga",
                &[
                    (10, "Movie A", "2001-05-04"),
                    (11, "Movie B", "2002-06-01"),
                    (14, "Movie E", "2030-01-01"),
                    (15, "Movie F", "2031-12-24"),
                ],
            ),
    );

    let (report, _, _) = run(
        Arc::clone(&metadata),
        Arc::new(MemorySink::default()),
        source(vec![
            owned("Movie A", 2001).with_guid("tmdb://10"),
            owned("Movie B", 2002),
        ]),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.recommended.is_empty());
    // Only Movie A needed details; Movie B was settled by the collection.
    assert_eq!(metadata.detail_calls.load(Ordering::SeqCst), 1);
    assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolves_by_imdb_then_title() {
    let metadata = Arc::new(
        saga()
            .with_imdb("tt0000010", 10)
            .with_search("Loner", 30)
            .with_movie(30, "Loner", None),
    );

    let (report, _, _) = run(
        Arc::clone(&metadata),
        Arc::new(MemorySink::default()),
        source(vec![
            owned("Movie A", 2001).with_guid("com.plexapp.agents.imdb://tt0000010?lang=en"),
            owned("Loner", 1999),
        ]),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(metadata.find_calls.load(Ordering::SeqCst), 1);
    assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.recommended.len(), 1);
    assert_eq!(report.recommended[0].title, "Movie B");
}

#[tokio::test]
async fn unresolved_movie_does_not_stop_the_run() {
    let metadata = Arc::new(saga().with_search("Movie A", 10));

    let (report, handle, _) = run(
        Arc::clone(&metadata),
        Arc::new(MemorySink::default()),
        source(vec![owned("Nobody Knows", 2000), owned("Movie A", 2001)]),
    )
    .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(handle.searched_count(), 2);
    assert_eq!(report.recommended.len(), 1);
    assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rejected_api_key_fails_the_run() {
    let metadata = Arc::new(FakeMetadata {
        unauthorized: true,
        ..saga()
    });
    let sink = Arc::new(MemorySink::default());

    let (report, handle, events) = run(
        Arc::clone(&metadata),
        Arc::clone(&sink),
        source(vec![owned("Movie A", 2001), owned("Movie B", 2002)]),
    )
    .await;

    assert!(matches!(report.outcome, RunOutcome::Failed(_)));
    assert_eq!(handle.phase(), RunPhase::Failed);
    assert!(handle.status().error.is_some());
    // The first call fails and nothing else is attempted.
    assert_eq!(metadata.calls(), 1);
    assert!(sink.final_movies.lock().unwrap().is_some());
    assert!(matches!(
        events.last(),
        Some(NotificationEvent::SearchFailed { .. })
    ));
}

#[tokio::test]
async fn cancellation_stops_before_the_next_call() {
    let metadata = Arc::new(
        saga()
            .with_movie(20, "Other", Some((98, "Other Saga")))
            .with_collection(98, "Other Saga", &[(21, "Other 2", "2010-01-01")]),
    );
    let sink = Arc::new(MemorySink::default());
    let (deps, mut rx) = collaborators(Arc::clone(&metadata), Arc::clone(&sink));
    let handle = Arc::new(RunHandle::new());
    *metadata.cancel_on_collection.lock().unwrap() = Some(Arc::clone(&handle));

    let sources = source(vec![
        owned("Movie A", 2001).with_guid("tmdb://10"),
        owned("Other", 2009).with_guid("tmdb://20"),
    ]);
    let report = Reconciler::new(deps, Arc::clone(&handle), options())
        .run(&sources)
        .await;

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.recommended.is_empty());
    assert_eq!(handle.phase(), RunPhase::Cancelled);
    assert_eq!(metadata.collection_calls.load(Ordering::SeqCst), 1);
    // Movie B's details were never requested and "Other" was never reached.
    assert_eq!(metadata.detail_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.final_movies.lock().unwrap().clone(), Some(Vec::new()));

    let events = drain(&mut rx);
    assert!(matches!(
        events.last(),
        Some(NotificationEvent::SearchCancelled { recommended: 0, .. })
    ));
}

#[tokio::test]
async fn cancelled_run_keeps_partial_recommendations() {
    let metadata = Arc::new(
        saga()
            .with_movie(20, "Other", Some((98, "Other Saga")))
            .with_movie(21, "Other 2", Some((98, "Other Saga")))
            .with_collection(
                98,
                "Other Saga",
                &[(20, "Other", "2009-01-01"), (21, "Other 2", "2010-01-01")],
            ),
    );
    let sink = Arc::new(MemorySink::default());
    let (deps, mut rx) = collaborators(Arc::clone(&metadata), Arc::clone(&sink));
    let handle = Arc::new(RunHandle::new());
    // Movie B is already recommended by the time "Other" is resolved.
    *metadata.cancel_on_details.lock().unwrap() = Some((TmdbId::new(20), Arc::clone(&handle)));

    let sources = source(vec![
        owned("Movie A", 2001).with_guid("tmdb://10"),
        owned("Other", 2009).with_guid("tmdb://20"),
    ]);
    let report = Reconciler::new(deps, Arc::clone(&handle), options())
        .run(&sources)
        .await;

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    let titles: Vec<&str> = report.recommended.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Movie B"]);
    assert_eq!(handle.recommended_snapshot(), report.recommended);
    assert_eq!(
        sink.final_movies.lock().unwrap().clone(),
        Some(report.recommended.clone())
    );
    assert_eq!(handle.phase(), RunPhase::Cancelled);
    // The second collection was never fetched.
    assert_eq!(metadata.collection_calls.load(Ordering::SeqCst), 1);

    let events = drain(&mut rx);
    assert!(matches!(
        events.last(),
        Some(NotificationEvent::SearchCancelled { recommended: 1, .. })
    ));
}

#[tokio::test]
async fn all_sources_failing_fails_the_run() {
    let metadata = Arc::new(saga());
    let sources: Vec<Arc<dyn LibrarySource>> = vec![Arc::new(BrokenSource), Arc::new(BrokenSource)];

    let (report, handle, _) = run(Arc::clone(&metadata), Arc::new(MemorySink::default()), sources).await;

    assert!(matches!(report.outcome, RunOutcome::Failed(_)));
    assert_eq!(handle.phase(), RunPhase::Failed);
    assert_eq!(metadata.calls(), 0);
}

#[tokio::test]
async fn one_failing_source_is_tolerated() {
    let metadata = Arc::new(saga());
    let sources: Vec<Arc<dyn LibrarySource>> = vec![
        Arc::new(BrokenSource),
        Arc::new(StaticSource(vec![
            owned("Movie A", 2001).with_guid("tmdb://10"),
            LibraryEntry::new("No Year", None),
        ])),
    ];

    let (report, handle, _) = run(metadata, Arc::new(MemorySink::default()), sources).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(handle.total_count(), 1);
    assert_eq!(report.recommended.len(), 1);
}

#[tokio::test]
async fn known_movies_skip_lookups_and_are_saved() {
    let metadata = Arc::new(saga());
    let sink = Arc::new(MemorySink::default());

    let mut known = Movie::new("Movie A", 2001);
    known.tmdb_id = Some(TmdbId::new(10));
    known.collection_id = Some(CollectionId::new(99));
    known.collection_name = Some("Saga".to_string());
    sink.known.lock().unwrap().push(known);

    let (report, _, _) = run(
        Arc::clone(&metadata),
        Arc::clone(&sink),
        source(vec![owned("Movie A", 2001)]),
    )
    .await;

    assert_eq!(report.recommended.len(), 1);
    // Only the recommended member needed details.
    assert_eq!(metadata.detail_calls.load(Ordering::SeqCst), 1);
    assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 0);

    let saved = sink.known.lock().unwrap().clone();
    let movie_b = saved.iter().find(|m| m.title == "Movie B").unwrap();
    assert_eq!(movie_b.tmdb_id, Some(TmdbId::new(11)));
}
