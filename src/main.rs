//! Scripted producer / consumer run on a capacity 2 queue.
//!
//! The two threads hand off to each other over flume channels so the
//! pushes and pops always interleave the same way:
//!
//! ```text
//! Push(1)              Pop() -> 1
//! Push(2) Push(3)
//! Push(4) (drops 2)    Pop() -> 3  Pop() -> 4
//!                      Pop() ... blocks
//! Push(5)              ... -> 5
//! ```
//!
//! Usage: `ringq [config.json]`
//!
//! Only `verbose` is taken from the config, the script needs a capacity of 2.
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flume::{Receiver, Sender};
use log::{info, warn, Level, Log, Metadata, Record};
use ringq::{Config, Queue, Result};

const DEMO_CAPACITY: usize = 2;

struct StderrLogger {
    level: Level,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logger(verbose: bool) {
    let level = match verbose {
        true => Level::Trace,
        false => Level::Info,
    };
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
}

fn closed<E>(_: E) -> ringq::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "handshake channel closed").into()
}

fn demo_queue(config: Config) -> Result<Queue<i32>> {
    let demo = config.capacity(DEMO_CAPACITY);
    if demo != config {
        warn!("ignoring configured capacity, the demo runs with a capacity of {DEMO_CAPACITY}");
    }
    Queue::with_config(demo)
}

fn writer(
    queue: Arc<Queue<i32>>,
    read_ready: Receiver<()>,
    write_ready: Sender<()>,
) -> Result<()> {
    queue.push(1);
    info!("Push(1)");

    read_ready.recv().map_err(closed)?;

    queue.push(2);
    info!("Push(2)");
    queue.push(3);
    info!("Push(3)");
    queue.push(4);
    info!("Push(4) // drops 2");

    write_ready.send(()).map_err(closed)?;
    read_ready.recv().map_err(closed)?;

    // Give the reader time to block in `pop`
    thread::sleep(Duration::from_millis(100));

    queue.push(5);
    info!("Push(5)");
    Ok(())
}

fn reader(
    queue: Arc<Queue<i32>>,
    read_ready: Sender<()>,
    write_ready: Receiver<()>,
) -> Result<Vec<i32>> {
    let mut popped = vec![];

    let value = queue.pop();
    info!("Pop() -> {value}");
    popped.push(value);

    read_ready.send(()).map_err(closed)?;
    write_ready.recv().map_err(closed)?;

    for _ in 0..2 {
        let value = queue.pop();
        info!("Pop() -> {value}");
        popped.push(value);
    }

    read_ready.send(()).map_err(closed)?;

    let value = queue.pop();
    info!("Pop() -> {value} // is released");
    popped.push(value);
    Ok(popped)
}

fn run(queue: Arc<Queue<i32>>) -> Result<Vec<i32>> {
    let (read_tx, read_rx) = flume::unbounded();
    let (write_tx, write_rx) = flume::unbounded();

    let writer_handle = thread::spawn({
        let queue = Arc::clone(&queue);
        move || writer(queue, read_rx, write_tx)
    });
    let reader_handle = thread::spawn(move || reader(queue, read_tx, write_rx));

    let writer_res = writer_handle.join().expect("writer thread panicked");
    let reader_res = reader_handle.join().expect("reader thread panicked");
    writer_res?;
    reader_res
}

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_logger(config.is_verbose());

    let queue = Arc::new(demo_queue(config)?);
    run(Arc::clone(&queue))?;
    info!("{} value(s) left in the queue", queue.len());
    Ok(())
}
