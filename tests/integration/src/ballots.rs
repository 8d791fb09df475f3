//! Ballot flow: pairing constraints, idempotent delivery, voting.

use qotd_core::{BallotOutcome, Clock, Vote, VoteError};

use crate::helpers::{rig, user};

#[tokio::test]
async fn a_pair_is_distinct_and_never_self_authored() {
    let r = rig();
    r.submit("q1", "alice").await;
    let own = r.submit("q2", "bob").await;
    r.submit("q3", "carol").await;
    let bob = user("bob");

    // drive bob through every ballot he can get; none may contain q2
    for _ in 0..10 {
        match r.engine.request_ballot(r.today(), &bob).await.unwrap() {
            BallotOutcome::Pair(ballot) => {
                assert_ne!(ballot.first, ballot.second);
                assert!(!ballot.contains(&own));
                r.engine
                    .cast_vote(r.today(), &bob, Vote::Skip)
                    .await
                    .unwrap();
            }
            BallotOutcome::Empty => {
                r.engine.refills().wait(r.today(), &bob).await;
            }
        }
    }
}

#[tokio::test]
async fn outstanding_ballot_is_served_until_voted() {
    let r = rig();
    r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;
    let carol = user("carol");

    let BallotOutcome::Pair(first) = r.engine.request_ballot(r.today(), &carol).await.unwrap()
    else {
        panic!("two foreign candidates must yield a pair");
    };
    // retried deliveries return the same pair without consuming candidates
    for _ in 0..3 {
        let BallotOutcome::Pair(again) = r.engine.request_ballot(r.today(), &carol).await.unwrap()
        else {
            panic!("outstanding ballot must be re-delivered");
        };
        assert_eq!(first, again);
    }

    r.engine
        .cast_vote(r.today(), &carol, Vote::For(first.first.clone()))
        .await
        .unwrap();
    assert!(r
        .engine
        .ballot_of(r.today(), &carol)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn undersized_pool_yields_empty() {
    let r = rig();
    let carol = user("carol");

    assert_eq!(
        r.engine.request_ballot(r.today(), &carol).await.unwrap(),
        BallotOutcome::Empty
    );

    r.submit("q1", "alice").await;
    assert_eq!(
        r.engine.request_ballot(r.today(), &carol).await.unwrap(),
        BallotOutcome::Empty
    );
    // a one-candidate pool schedules no background work
    assert_eq!(r.engine.refills().scheduled_total(), 0);
}

#[tokio::test]
async fn votes_require_an_offered_candidate() {
    let r = rig();
    r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;
    let outsider = r.register("q9", "dave", r.today());
    let carol = user("carol");

    let err = r
        .engine
        .cast_vote(r.today(), &carol, Vote::For(outsider.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, VoteError::NoActiveBallot));

    let BallotOutcome::Pair(ballot) = r.engine.request_ballot(r.today(), &carol).await.unwrap()
    else {
        panic!("two foreign candidates must yield a pair");
    };
    let err = r
        .engine
        .cast_vote(r.today(), &carol, Vote::For(outsider))
        .await
        .unwrap_err();
    assert!(matches!(err, VoteError::InvalidChoice));

    // the failed vote left the ballot in place
    assert_eq!(
        r.engine.ballot_of(r.today(), &carol).await.unwrap(),
        Some(ballot)
    );
}

#[tokio::test]
async fn skip_abandons_without_scoring() {
    let r = rig();
    r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;
    let carol = user("carol");

    // skipping with nothing outstanding is fine
    r.engine
        .cast_vote(r.today(), &carol, Vote::Skip)
        .await
        .unwrap();

    let BallotOutcome::Pair(_) = r.engine.request_ballot(r.today(), &carol).await.unwrap() else {
        panic!("two foreign candidates must yield a pair");
    };
    r.engine
        .cast_vote(r.today(), &carol, Vote::Skip)
        .await
        .unwrap();

    assert!(r
        .engine
        .ballot_of(r.today(), &carol)
        .await
        .unwrap()
        .is_none());
    r.clock.advance_days(1);
    assert_eq!(
        r.engine
            .winner_of(r.clock.today().pred().unwrap())
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn accepted_ballots_never_repeat_a_candidate() {
    let r = rig();
    for i in 1..=6 {
        r.submit(&format!("q{i}"), &format!("author{i}")).await;
    }
    let viewer = user("viewer");
    let mut offered: Vec<String> = Vec::new();

    loop {
        match r.engine.request_ballot(r.today(), &viewer).await.unwrap() {
            BallotOutcome::Pair(ballot) => {
                for q in [&ballot.first, &ballot.second] {
                    assert!(
                        !offered.contains(&q.as_str().to_owned()),
                        "{q} was offered twice"
                    );
                    offered.push(q.as_str().to_owned());
                }
                r.engine
                    .cast_vote(r.today(), &viewer, Vote::Skip)
                    .await
                    .unwrap();
            }
            BallotOutcome::Empty => {
                if r.engine.refills().is_active(r.today(), &viewer) {
                    r.engine.refills().wait(r.today(), &viewer).await;
                    continue;
                }
                break;
            }
        }
    }
    // six candidates, pairs of two: at most three ballots ever
    assert!(offered.len() <= 6);
}
