//! Concurrent bookings from independent workers sharing one database file.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{booking, june_first, TestDb};
use tablebook_lib::{
    BookingError, Cancellation, CreateReservationRequest, ErrorKind, ReservationFilter,
    ReservationId,
};

const WORKERS: usize = 8;

fn race(db: &TestDb, requests: Vec<CreateReservationRequest>) -> Vec<Result<ReservationId, BookingError>> {
    let barrier = Arc::new(Barrier::new(requests.len()));
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            // each worker gets its own connections, like a separate invocation
            let coordinator = db.coordinator();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                coordinator.create_reservation(&request, &Cancellation::new())
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect()
}

fn assert_single_winner(results: &[Result<ReservationId, BookingError>]) {
    let committed = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::Conflict))
        .count();
    assert_eq!(committed, 1, "exactly one worker commits: {results:?}");
    assert_eq!(conflicts, results.len() - 1, "all others conflict: {results:?}");
}

#[test]
fn identical_slots_have_exactly_one_winner() {
    let db = TestDb::with_tables(&[5]);
    let requests = (0..WORKERS)
        .map(|_| booking(5, "18:00", "19:00"))
        .collect();

    let results = race(&db, requests);
    assert_single_winner(&results);

    let stored = db
        .coordinator()
        .list_reservations(&ReservationFilter::default())
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[test]
fn overlapping_but_different_slots_have_exactly_one_winner() {
    let db = TestDb::with_tables(&[5]);
    // every slot contains 18:21-19:00, so each pair overlaps
    let requests = (0..WORKERS as u32)
        .map(|i| {
            let start = format!("18:{:02}", i * 3);
            let end = format!("19:{:02}", i * 3);
            booking(5, &start, &end)
        })
        .collect();

    let results = race(&db, requests);
    assert_single_winner(&results);

    let stored = db
        .coordinator()
        .list_reservations(&ReservationFilter {
            table_number: Some(5),
            date: Some(june_first()),
        })
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[test]
fn disjoint_slots_all_commit_under_race() {
    let db = TestDb::with_tables(&[5]);
    let requests = (0..WORKERS as u32)
        .map(|i| {
            let start = format!("{:02}:00", 10 + i);
            let end = format!("{:02}:00", 11 + i);
            booking(5, &start, &end)
        })
        .collect();

    let results = race(&db, requests);
    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert_eq!(
        db.coordinator()
            .list_reservations(&ReservationFilter::default())
            .unwrap()
            .len(),
        WORKERS
    );
}

#[test]
fn same_idempotency_key_under_race_yields_one_reservation() {
    let db = TestDb::with_tables(&[5]);
    let requests = (0..WORKERS)
        .map(|_| booking(5, "18:00", "19:00").with_idempotency_key("client-retry"))
        .collect();

    let results = race(&db, requests);
    let ids: Vec<ReservationId> = results
        .into_iter()
        .map(|r| r.expect("keyed retries resolve to the winner"))
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
}
