mod utils;

use chrono::Duration;
use utils::{capture, join, kill, t0, TestSetupBuilder};

use mofocup::cup::CupRepository;
use mofocup::scoring::ranking_ratio;
use mofocup::{Category, HostEvent};

#[tokio::test]
async fn dispatched_events_accumulate_points_and_answer_commands() {
    let setup = TestSetupBuilder::new().build().await;

    setup.dispatcher.dispatch(&join(1, "alpha")).await;
    setup.dispatcher.dispatch(&join(2, "bravo")).await;

    // alpha takes three kills and an even-teams capture, bravo one kill.
    for _ in 0..3 {
        setup.dispatcher.dispatch(&kill(2, 1, "L")).await;
    }
    setup.dispatcher.dispatch(&kill(1, 2, "L")).await;
    setup.dispatcher.dispatch(&capture(1, 4, 4)).await;

    let kills = setup
        .repository
        .category_score(setup.cup.id, 1, Category::Kill)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kills.points, 3);

    let captures = setup
        .repository
        .category_score(setup.cup.id, 1, Category::Capture)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(captures.points, 4);

    // Flush + recompute, then query through the command surface.
    let now = chrono::Utc::now();
    setup.dispatcher.dispatch(&HostEvent::Tick { now }).await;

    let lines = setup.commands.respond(1, "cup", &[], now).await;
    assert!(lines[0].contains("capture"));
    assert!(lines.iter().any(|l| l.contains("alpha")));

    let rank_lines = setup
        .commands
        .respond(1, "rank", &["kill".to_string()], now)
        .await;
    assert_eq!(rank_lines, vec!["You are ranked #1 in the kill cup.".to_string()]);

    // bravo never captured: unranked there, not position 1.
    let unranked = setup
        .commands
        .respond(2, "rank", &["capture".to_string()], now)
        .await;
    assert_eq!(
        unranked,
        vec!["You are not ranked in the capture cup yet.".to_string()]
    );
}

#[tokio::test]
async fn equal_rates_tie_break_by_playing_time_then_id() {
    let setup = TestSetupBuilder::new()
        .with_cup_window(t0() - Duration::days(7), t0() + Duration::days(23))
        .build()
        .await;
    let cup_id = setup.cup.id;
    let repo = &setup.repository;

    // A: 100 points over a full day. B: 50 points over half a day. Same
    // rate, so both ratios are 100 and the faster accumulator wins the tie.
    // C matches B exactly except for the higher BZID.
    for (bz_id, callsign, points, seconds) in [
        (1_i64, "aaa", 100_i64, 86_400_i64),
        (2, "bbb", 50, 43_200),
        (3, "ccc", 50, 43_200),
    ] {
        repo.upsert_player(cup_id, bz_id, callsign).await.unwrap();
        repo.add_playing_time(cup_id, bz_id, seconds).await.unwrap();
        repo.add_points(cup_id, bz_id, Category::Capture, points)
            .await
            .unwrap();
        repo.store_ratio(
            cup_id,
            bz_id,
            Category::Capture,
            ranking_ratio(points, seconds),
        )
        .await
        .unwrap();
    }

    let top = setup.service.leaderboard(Category::Capture, t0()).await.unwrap();

    assert_eq!(top.len(), 3);
    assert!(top.iter().all(|e| e.ratio == 100));
    let order: Vec<i64> = top.iter().map(|e| e.bz_id).collect();
    assert_eq!(order, vec![2, 3, 1]);
}

#[tokio::test]
async fn ratios_follow_points_per_day_after_flush() {
    let setup = TestSetupBuilder::new()
        .with_cup_window(t0() - Duration::days(7), t0() + Duration::days(23))
        .build()
        .await;
    let service = &setup.service;

    service.handle_join(1, "alpha", t0()).await.unwrap();
    service.handle_join(2, "bravo", t0()).await.unwrap();

    // alpha: two even 4v4 captures (8 points). bravo: one (4 points).
    for _ in 0..2 {
        service
            .handle_scoring_event(&capture(1, 4, 4), t0())
            .await
            .unwrap();
    }
    service
        .handle_scoring_event(&capture(2, 4, 4), t0())
        .await
        .unwrap();

    // Both part after exactly one day, then the tick recomputes.
    let later = t0() + Duration::days(1);
    service.handle_part(1, later).await.unwrap();
    service.handle_part(2, later).await.unwrap();
    service.handle_tick(later).await.unwrap();

    let top = service.leaderboard(Category::Capture, later).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!((top[0].bz_id, top[0].ratio), (1, 8));
    assert_eq!((top[1].bz_id, top[1].ratio), (2, 4));

    assert_eq!(
        service.rank_of(1, Category::Capture, later).await.unwrap(),
        Some(1)
    );
    assert_eq!(
        service.rank_of(2, Category::Capture, later).await.unwrap(),
        Some(2)
    );
}

#[tokio::test]
async fn closed_cup_stays_frozen_but_queryable() {
    let setup = TestSetupBuilder::new()
        .with_cup_window(t0(), t0() + Duration::hours(1))
        .build()
        .await;
    let service = &setup.service;

    service.handle_join(1, "alpha", t0()).await.unwrap();
    service
        .handle_scoring_event(&capture(1, 4, 4), t0())
        .await
        .unwrap();
    service
        .handle_part(1, t0() + Duration::minutes(30))
        .await
        .unwrap();
    service.handle_tick(t0() + Duration::minutes(30)).await.unwrap();

    let frozen = setup
        .service
        .leaderboard_for(setup.cup.id, Category::Capture)
        .await
        .unwrap();
    assert_eq!(frozen.len(), 1);
    let frozen_ratio = frozen[0].ratio;

    // After the window closes, scoring events are dropped and the frozen
    // data never changes; the live query reports no current cup.
    let after_close = t0() + Duration::hours(2);
    service
        .handle_scoring_event(&capture(1, 4, 4), after_close)
        .await
        .unwrap();
    service.handle_tick(after_close).await.unwrap();

    let still_frozen = setup
        .service
        .leaderboard_for(setup.cup.id, Category::Capture)
        .await
        .unwrap();
    assert_eq!(still_frozen[0].points, 4);
    assert_eq!(still_frozen[0].ratio, frozen_ratio);

    let lines = setup.commands.respond(1, "cup", &[], after_close).await;
    assert_eq!(lines, vec!["No cup is currently running.".to_string()]);
}

#[tokio::test]
async fn genocide_and_rampage_feed_their_own_categories() {
    let setup = TestSetupBuilder::new().build().await;

    setup.dispatcher.dispatch(&join(1, "alpha")).await;
    for _ in 0..5 {
        setup.dispatcher.dispatch(&kill(2, 1, "G")).await;
    }

    let geno = setup
        .repository
        .category_score(setup.cup.id, 1, Category::Geno)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(geno.points, 25);

    let bounty = setup
        .repository
        .category_score(setup.cup.id, 1, Category::Bounty)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bounty.points, 2);

    let kills = setup
        .repository
        .category_score(setup.cup.id, 1, Category::Kill)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kills.points, 5);
}

#[tokio::test]
async fn host_events_serialize_for_the_wire() {
    // Host bindings forward events as JSON in some deployments; the enum
    // has to round-trip.
    let event = kill(3, 7, "G");
    let encoded = serde_json::to_string(&event).unwrap();
    let decoded: HostEvent = serde_json::from_str(&encoded).unwrap();

    match decoded {
        HostEvent::PlayerKilled {
            victim_id,
            killer_id,
            weapon,
            ..
        } => {
            assert_eq!((victim_id, killer_id), (3, 7));
            assert_eq!(weapon, "G");
        }
        other => panic!("unexpected event after round-trip: {other:?}"),
    }
}
