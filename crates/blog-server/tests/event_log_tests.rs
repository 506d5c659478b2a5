//! Event log pipeline behavior: ordering, backpressure, shutdown and
//! sink failures.

use async_trait::async_trait;
use blog_server::events::{
    EventLog, EventLogConfig, EventSink, FileSink, MemorySink, TIMESTAMP_FORMAT,
};
use chrono::NaiveDateTime;
use std::io;
use std::sync::Arc;
use std::time::Duration;

fn config(capacity: usize, write_delay: Duration) -> EventLogConfig {
    EventLogConfig {
        capacity,
        write_delay,
        ..Default::default()
    }
}

/// Split `[timestamp] event\n` into its parts, checking the layout
fn parse_line(line: &str) -> (NaiveDateTime, &str) {
    let body = line.strip_suffix('\n').expect("line ends with a newline");
    let rest = body.strip_prefix('[').expect("line starts with a timestamp");
    let (timestamp, event) = rest.split_once("] ").expect("timestamp is closed");
    let parsed = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .expect("timestamp matches the line format");
    (parsed, event)
}

#[tokio::test]
async fn test_stop_drains_every_event_in_order() {
    let sink = MemorySink::new();
    let log = EventLog::new(sink.clone(), config(100, Duration::ZERO));
    log.start().unwrap();

    for i in 0..50 {
        log.log_event(format!("event {}", i));
    }
    log.stop().await;

    let lines = sink.lines();
    assert_eq!(lines.len(), 50);
    for (i, line) in lines.iter().enumerate() {
        let (_, event) = parse_line(line);
        assert_eq!(event, format!("event {}", i));
    }
    assert!(sink.is_closed());

    let stats = log.stats();
    assert_eq!(stats.accepted, 50);
    assert_eq!(stats.written, 50);
    assert_eq!(stats.dropped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_full_queue_drops_without_blocking() {
    let sink = MemorySink::new();
    let log = EventLog::new(sink.clone(), config(100, Duration::from_secs(1)));
    log.start().unwrap();

    // No await between sends, so the consumer cannot run on this
    // single-threaded runtime until the burst is over.
    for i in 0..150 {
        log.log_event(format!("burst {}", i));
    }

    let stats = log.stats();
    assert!(stats.dropped >= 50, "dropped {}", stats.dropped);
    assert_eq!(stats.accepted + stats.dropped, 150);

    // The survivors are the first events sent, still in order
    log.stop().await;
    let lines = sink.lines();
    assert_eq!(lines.len() as u64, stats.accepted);
    assert_eq!(parse_line(&lines[0]).1, "burst 0");
}

#[tokio::test]
async fn test_events_after_stop_are_rejected() {
    let sink = MemorySink::new();
    let log = EventLog::new(sink.clone(), config(10, Duration::ZERO));
    log.start().unwrap();
    log.log_event("before");
    log.stop().await;

    log.log_event("after");
    log.stop().await;

    assert_eq!(sink.lines().len(), 1);
    assert_eq!(log.stats().rejected, 1);
    assert!(log.start().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_stops_both_wait_for_drain() {
    let sink = MemorySink::new();
    let log = EventLog::new(sink.clone(), config(10, Duration::from_secs(1)));
    log.start().unwrap();
    for i in 0..5 {
        log.log_event(format!("queued {}", i));
    }

    let first = async {
        log.stop().await;
        sink.lines().len()
    };
    let second = async {
        log.stop().await;
        sink.lines().len()
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, 5);
    assert_eq!(second, 5);
    assert!(sink.is_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_racing_stop_never_loses_events() {
    for _ in 0..50 {
        let sink = MemorySink::new();
        let log = Arc::new(EventLog::new(sink.clone(), config(10, Duration::ZERO)));
        for i in 0..5 {
            log.log_event(format!("queued {}", i));
        }

        let starter = tokio::spawn({
            let log = Arc::clone(&log);
            async move { log.start() }
        });
        log.stop().await;
        let _ = starter.await.unwrap();

        assert_eq!(sink.lines().len(), 5);
        assert!(sink.is_closed());
        assert_eq!(log.stats().written, 5);
    }
}

#[tokio::test(start_paused = true)]
async fn test_write_delay_throttles_consumer() {
    let sink = MemorySink::new();
    let log = EventLog::new(sink.clone(), config(10, Duration::from_secs(1)));
    log.start().unwrap();

    let started = tokio::time::Instant::now();
    for i in 0..3 {
        log.log_event(format!("slow {}", i));
    }

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(sink.lines().len(), 1);

    log.stop().await;
    assert_eq!(sink.lines().len(), 3);
    assert!(started.elapsed() >= Duration::from_secs(3));
}

/// Sink that fails every other write
#[derive(Default)]
struct FlakySink {
    calls: usize,
    lines: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[async_trait]
impl EventSink for FlakySink {
    async fn append(&mut self, line: &str) -> io::Result<()> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(io::Error::other("disk full"));
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_sink_failures_do_not_stop_consumer() {
    let sink = FlakySink::default();
    let written = sink.lines.clone();
    let log = EventLog::new(sink, config(10, Duration::ZERO));
    log.start().unwrap();

    for i in 0..4 {
        log.log_event(format!("event {}", i));
    }
    log.stop().await;

    let stats = log.stats();
    assert_eq!(stats.written, 2);
    assert_eq!(stats.write_failures, 2);

    let written = written.lock().unwrap();
    assert_eq!(parse_line(&written[0]).1, "event 0");
    assert_eq!(parse_line(&written[1]).1, "event 2");
}

#[tokio::test]
async fn test_file_backed_log_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit").join("logs.txt");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[2024-01-01 00:00:00] earlier run\n").unwrap();

    let log = EventLog::open(EventLogConfig {
        path: path.clone(),
        capacity: 10,
        write_delay: Duration::ZERO,
    })
    .await
    .unwrap();
    log.start().unwrap();
    log.log_event("user 1 created post 1");
    log.log_event("user 1 created comment 1");
    log.stop().await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "[2024-01-01 00:00:00] earlier run");
    assert!(lines[1].ends_with("] user 1 created post 1"));
    assert!(lines[2].ends_with("] user 1 created comment 1"));
}

#[tokio::test]
async fn test_file_sink_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.txt");
    let sink = FileSink::open(&path).await.unwrap();
    assert_eq!(sink.path(), path.as_path());
}
