//! Shared helpers for the queue integration tests.
#![allow(dead_code)]

use std::ops::{Deref, DerefMut};

use posix_mq::{MessageQueue, Mode, OpenFlags, OpenOptions};
use rand::Rng;

/// Builds a unique queue name: one leading separator, one random segment.
pub fn rand_name() -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    let mut name = String::with_capacity(36);
    name.push('/');
    for _ in 0..30 {
        name.push(CHARS[rng.gen_range(0..CHARS.len())] as char);
    }
    name.push_str(".tmp");
    name
}

/// Whether this environment can create message queues.
///
/// Containers and locked-down CI hosts frequently lack a usable mqueue
/// setup (kernel config, mounted /dev/mqueue, SELinux policy,
/// RLIMIT_MSGQUEUE), so probe with a throwaway queue and let callers skip
/// when the probe fails.
pub fn mqueue_available() -> bool {
    init_tracing();
    match create_queue(1, 16) {
        Ok(_) => true,
        Err(err) => {
            eprintln!("skipping: cannot create message queues in this environment ({err})");
            false
        }
    }
}

/// Opens a fresh read-write queue with the given bounds. The caller owns
/// cleanup.
pub fn open_queue(depth: i64, msg_size: i64) -> anyhow::Result<MessageQueue> {
    Ok(OpenOptions::new()
        .flags(
            OpenFlags::READ_WRITE
                | OpenFlags::CREATE
                | OpenFlags::EXCLUSIVE
                | OpenFlags::CLOEXEC,
        )
        .create_with(Mode::from_bits_truncate(0o600), depth, msg_size)
        .open(&rand_name())?)
}

/// Opens a fresh read-write queue with the given bounds, unlinked when the
/// returned guard drops so failed tests do not leak kernel objects.
pub fn create_queue(depth: i64, msg_size: i64) -> anyhow::Result<TestQueue> {
    Ok(TestQueue(open_queue(depth, msg_size)?))
}

/// A queue that unlinks itself on drop.
pub struct TestQueue(pub MessageQueue);

impl Deref for TestQueue {
    type Target = MessageQueue;

    fn deref(&self) -> &MessageQueue {
        &self.0
    }
}

impl DerefMut for TestQueue {
    fn deref_mut(&mut self) -> &mut MessageQueue {
        &mut self.0
    }
}

impl Drop for TestQueue {
    fn drop(&mut self) {
        let _ = self.0.unlink();
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
