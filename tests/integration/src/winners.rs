//! Winner queries: day-close gating and exact vote counts.

use qotd_core::{BallotOutcome, Vote, WinnerError};

use crate::helpers::{rig, user};

#[tokio::test]
async fn the_current_day_never_reveals_results() {
    let r = rig();
    let err = r.engine.winner_of(r.today()).await.unwrap_err();
    assert!(matches!(err, WinnerError::DayNotClosed));

    let err = r
        .engine
        .winner_of(r.today().succ().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, WinnerError::DayNotClosed));
}

#[tokio::test]
async fn a_closed_day_without_votes_has_no_result() {
    let r = rig();
    assert_eq!(
        r.engine.winner_of(r.today().pred().unwrap()).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn every_vote_is_counted_exactly_once() {
    let r = rig();
    let q1 = r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;
    let voting_day = r.today();

    // two candidates means every voter sees the same pair; five voters
    // all prefer q1
    for name in ["carol", "dave", "erin", "frank", "grace"] {
        let voter = user(name);
        let BallotOutcome::Pair(ballot) = r.engine.request_ballot(voting_day, &voter).await.unwrap()
        else {
            panic!("a two-candidate pool must pair every fresh voter");
        };
        assert!(ballot.contains(&q1));
        r.engine
            .cast_vote(voting_day, &voter, Vote::For(q1.clone()))
            .await
            .unwrap();
    }

    r.clock.advance_days(1);
    let winner = r.engine.winner_of(voting_day).await.unwrap().unwrap();
    assert_eq!(winner.quote, q1);
    assert_eq!(winner.votes, 5);
}

#[tokio::test]
async fn days_score_independently() {
    let r = rig();
    let day_one = r.today();
    let q1 = r.submit("q1", "alice").await;
    r.submit("q2", "bob").await;

    let carol = user("carol");
    let BallotOutcome::Pair(_) = r.engine.request_ballot(day_one, &carol).await.unwrap() else {
        panic!("a two-candidate pool must pair carol");
    };
    r.engine
        .cast_vote(day_one, &carol, Vote::For(q1.clone()))
        .await
        .unwrap();

    r.clock.advance_days(1);
    let day_two = r.today();
    let q3 = r.register("q3", "alice", day_two);
    let q4 = r.register("q4", "bob", day_two);
    r.engine.submit(day_two, &user("alice"), &q3).await.unwrap();
    r.engine.submit(day_two, &user("bob"), &q4).await.unwrap();

    let BallotOutcome::Pair(_) = r.engine.request_ballot(day_two, &carol).await.unwrap() else {
        panic!("a fresh day must pair carol again");
    };
    r.engine
        .cast_vote(day_two, &carol, Vote::For(q4.clone()))
        .await
        .unwrap();

    // day one settled; day two is still open
    let winner = r.engine.winner_of(day_one).await.unwrap().unwrap();
    assert_eq!(winner.quote, q1);
    assert_eq!(winner.votes, 1);
    assert!(r.engine.winner_of(day_two).await.is_err());

    r.clock.advance_days(1);
    let winner = r.engine.winner_of(day_two).await.unwrap().unwrap();
    assert_eq!(winner.quote, q4);
}
