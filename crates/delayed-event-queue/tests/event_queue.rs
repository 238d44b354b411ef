use chrono::{DateTime, Duration, Utc};
use delayed_event_queue::{Event, EventQueue, StorageEvent};
use tempfile::tempdir;

fn event(name: &str) -> StorageEvent {
    StorageEvent::new(Event::new(name))
}

fn names(events: &[StorageEvent]) -> Vec<String> {
    events.iter().map(|e| e.event.event_type.clone()).collect()
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

#[test]
fn test_pull_skips_retry_deferred_event() {
    let dir = tempdir().unwrap();
    let queue =
        EventQueue::new(3, Duration::seconds(1), dir.path().join(".amplitude.cache")).unwrap();
    let now = Utc::now();

    queue.push_new(event("1"));
    let mut deferred = event("2");
    deferred.retry_at = Some(now + Duration::seconds(10));
    queue.push_new(deferred);
    queue.push_new(event("3"));

    let pulled = queue.pull(3, now);

    assert_eq!(names(&pulled), vec!["1", "3"]);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.count(now), 0);

    let reopened =
        EventQueue::new(3, Duration::seconds(1), dir.path().join(".amplitude.cache")).unwrap();
    assert_eq!(reopened.len(), 1);
}

#[test]
fn test_full_queue_pulls_in_submission_order() {
    for capacity in [1, 2, 5, 17] {
        let dir = tempdir().unwrap();
        let queue = EventQueue::new(capacity, Duration::hours(24), dir.path().join("q")).unwrap();
        queue.pull_forced(0, Utc::now());

        let expected: Vec<String> = (0..capacity).map(|i| format!("event-{i}")).collect();
        for name in &expected {
            queue.push_new(event(name));
        }

        assert_eq!(names(&queue.pull(capacity, Utc::now())), expected);
    }
}

#[test]
fn test_partial_queue_waits_for_interval() {
    let dir = tempdir().unwrap();
    let interval = Duration::minutes(30);
    let queue = EventQueue::new(10, interval, dir.path().join("q")).unwrap();
    queue.pull_forced(0, Utc::now());
    queue.push_new(event("a"));
    let last = queue.last_submitted_at();

    for offset in [Duration::zero(), Duration::minutes(10), Duration::minutes(29)] {
        assert!(queue.pull(10, last + offset).is_empty());
        assert_eq!(queue.len(), 1);
    }
    assert_eq!(names(&queue.pull(10, last + interval + Duration::seconds(1))), vec!["a"]);
}

#[test]
fn test_return_back_front_of_next_batch() {
    let dir = tempdir().unwrap();
    let queue = EventQueue::new(1, Duration::zero(), dir.path().join("q")).unwrap();
    queue.push_new(event("d"));
    queue.push_new(event("e"));

    queue.return_back(vec![event("a"), event("b"), event("c")]);

    let far_future = Utc::now() + Duration::days(365);
    assert_eq!(names(&queue.pull(10, far_future)), vec!["a", "b", "c", "d", "e"]);
}

// The next three follow the original storage's own test suite, with a
// capacity of 1 in place of 0.

#[test]
fn test_simple() {
    let dir = tempdir().unwrap();
    let queue = EventQueue::new(1, Duration::zero(), dir.path().join("TestSimple.cache")).unwrap();

    for (i, name) in ["event-A", "event-B", "event-C", "event-D"].iter().enumerate() {
        queue.push_new(event(name));
        assert_eq!(queue.count(epoch()), i + 1);
    }

    let chunk = queue.pull(3, epoch());
    assert_eq!(queue.count(epoch()), 1);
    assert_eq!(names(&chunk), vec!["event-A", "event-B", "event-C"]);

    queue.push_new(event("event-B"));
    queue.push_new(event("event-C"));
    queue.push_new(event("event-A"));
    assert_eq!(queue.count(epoch()), 4);

    assert_eq!(names(&queue.pull(3, epoch())), vec!["event-D", "event-B", "event-C"]);
    assert_eq!(queue.count(epoch()), 1);
    assert_eq!(names(&queue.pull(3, epoch())), vec!["event-A"]);
    assert_eq!(queue.count(epoch()), 0);
    assert!(queue.pull(3, epoch()).is_empty());
}

#[test]
fn test_return_back() {
    let dir = tempdir().unwrap();
    let queue =
        EventQueue::new(1, Duration::zero(), dir.path().join("TestReturnBack.cache")).unwrap();
    for name in ["event-A", "event-B", "event-C", "event-D", "event-E"] {
        queue.push_new(event(name));
    }

    assert_eq!(queue.count(epoch()), 5);
    let chunk = queue.pull(4, epoch());
    assert_eq!(names(&chunk), vec!["event-A", "event-B", "event-C", "event-D"]);

    let now = Utc::now();
    let mut by_name = chunk.into_iter();
    let a = by_name.next().unwrap();
    let b = by_name.next().unwrap();
    let c = by_name.next().unwrap();
    let d = by_name.next().unwrap();
    queue.return_back(vec![b, c, d, a]);

    assert_eq!(queue.count(now), 5);
    assert_eq!(
        names(&queue.pull(4, now)),
        vec!["event-B", "event-C", "event-D", "event-A"]
    );
    assert_eq!(queue.count(now), 1);
    assert_eq!(names(&queue.pull(4, now)), vec!["event-E"]);
    assert_eq!(queue.count(now), 0);
    assert!(queue.pull(4, now).is_empty());
}

#[test]
fn test_cache_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("TestCache.cache");

    let first = EventQueue::new(1, Duration::zero(), &path).unwrap();
    for name in ["event-A", "event-B", "event-C", "event-D", "event-E"] {
        first.push_new(event(name));
    }
    assert_eq!(first.count(epoch()), 5);
    assert_eq!(names(&first.pull(2, epoch())), vec!["event-A", "event-B"]);

    let second = EventQueue::new(1, Duration::zero(), &path).unwrap();
    assert_eq!(second.count(epoch()), 3);
    assert_eq!(names(&second.pull(2, epoch())), vec!["event-C", "event-D"]);
}

#[test]
fn test_concurrent_pushes_all_persisted() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let dir = tempdir().unwrap();
    let path = dir.path().join(".amplitude.cache");
    let queue = EventQueue::new(1000, Duration::hours(24), &path).unwrap();

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let queue = &queue;
            scope.spawn(move || {
                for i in 0..PER_THREAD {
                    queue.push_new(event(&format!("{t}-{i}")));
                }
            });
        }
    });

    assert_eq!(queue.len(), THREADS * PER_THREAD);

    let reopened = EventQueue::new(1000, Duration::hours(24), &path).unwrap();
    assert_eq!(reopened.len(), THREADS * PER_THREAD);

    // Each producer's events keep their relative order.
    let pulled = names(&reopened.pull_forced(THREADS * PER_THREAD, Utc::now()));
    for t in 0..THREADS {
        let prefix = format!("{t}-");
        let own: Vec<&String> = pulled.iter().filter(|n| n.starts_with(&prefix)).collect();
        let expected: Vec<String> = (0..PER_THREAD).map(|i| format!("{t}-{i}")).collect();
        assert_eq!(own, expected.iter().collect::<Vec<_>>());
    }
}
