//! Background refill flow: exclusivity, termination, flag hygiene.

use bytes::Bytes;
use qotd_core::{BallotOutcome, QuoteId, Vote};

use crate::helpers::{rig, user};

#[tokio::test]
async fn exhausted_pool_settles_into_permanent_empty() {
    let r = rig();
    // the spec's concrete scenario: three authors, user bob owns q2
    r.submit("q1", "alice").await;
    let own = r.submit("q2", "bob").await;
    r.submit("q3", "carol").await;
    let bob = user("bob");

    let mut pairs_seen = 0;
    let mut consecutive_empty = 0;
    for _ in 0..20 {
        match r.engine.request_ballot(r.today(), &bob).await.unwrap() {
            BallotOutcome::Pair(ballot) => {
                assert!(!ballot.contains(&own));
                pairs_seen += 1;
                consecutive_empty = 0;
                r.engine
                    .cast_vote(r.today(), &bob, Vote::Skip)
                    .await
                    .unwrap();
            }
            BallotOutcome::Empty => {
                r.engine.refills().wait(r.today(), &bob).await;
                consecutive_empty += 1;
            }
        }
    }

    // bob has at most one valid pair (q1 vs q3); after that the pool is
    // exhausted for him and stays exhausted
    assert!(pairs_seen <= 1);
    assert!(consecutive_empty >= 3);
    assert!(r
        .engine
        .ballot_of(r.today(), &bob)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn refill_clears_its_flag_on_every_exit() {
    let r = rig();
    // every candidate is alice's own, so her requests always reject and
    // every refill exhausts
    let today = r.today();
    let q1 = r.register("a1", "alice", today);
    let q2 = r.register("a2", "alice", today);
    r.store
        .sadd(
            &format!("today:{today}:quotes"),
            &[q1.as_str().to_owned(), q2.as_str().to_owned()],
        )
        .await
        .unwrap();
    let alice = user("alice");

    for _ in 0..3 {
        assert_eq!(
            r.engine.request_ballot(today, &alice).await.unwrap(),
            BallotOutcome::Empty
        );
        r.engine.refills().wait(today, &alice).await;
        // the flag is released, so the next request may try again
        assert!(!r
            .store
            .exists(&format!("today:{today}:refill:alice"))
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn held_flag_blocks_sampling_for_the_user() {
    let r = rig();
    r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;
    let today = r.today();
    let carol = user("carol");

    // simulate a refill held by another process instance
    assert!(r
        .store
        .set_nx(&format!("today:{today}:refill:carol"), Bytes::from_static(b"1"))
        .await
        .unwrap());

    for _ in 0..3 {
        assert_eq!(
            r.engine.request_ballot(today, &carol).await.unwrap(),
            BallotOutcome::Empty
        );
    }
    assert_eq!(r.engine.refills().scheduled_total(), 0);

    // once the holder releases, a pair flows again
    r.store
        .del(&format!("today:{today}:refill:carol"))
        .await
        .unwrap();
    assert!(matches!(
        r.engine.request_ballot(today, &carol).await.unwrap(),
        BallotOutcome::Pair(_)
    ));
}

#[tokio::test]
async fn refills_for_different_users_run_independently() {
    let r = rig();
    // alice and bob each own half the pool, so both reject often
    r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;
    r.submit("q3", "carol").await;
    r.submit("q4", "dave").await;
    let today = r.today();

    for (i, name) in ["alice", "bob", "carol", "dave"].iter().enumerate() {
        let own = QuoteId::new(format!("q{}", i + 1));
        match r.engine.request_ballot(today, &user(name)).await.unwrap() {
            BallotOutcome::Pair(ballot) => assert!(!ballot.contains(&own)),
            BallotOutcome::Empty => {}
        }
    }

    // let any background work settle; no task may linger forever
    for name in ["alice", "bob", "carol", "dave"] {
        r.engine.refills().wait(today, &user(name)).await;
    }
    assert_eq!(r.engine.refills().active_count(), 0);
}

#[tokio::test]
async fn shutdown_aborts_background_work() {
    let r = rig();
    r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;
    let today = r.today();

    let _ = r.engine.request_ballot(today, &user("alice")).await.unwrap();
    r.engine.shutdown();
    assert_eq!(r.engine.refills().active_count(), 0);
}
