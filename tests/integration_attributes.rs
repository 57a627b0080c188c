//! Attribute snapshot behavior against real kernel queues.
#![cfg(target_os = "linux")]

mod common;

use anyhow::Result;
use posix_mq::{attr, AttributeFlags, NoDeadline, OpenFlags, OpenOptions};

#[test]
fn attributes_echo_creation_bounds() -> Result<()> {
    if !common::mqueue_available() {
        return Ok(());
    }
    let mq = common::create_queue(4, 64)?;
    let attr = mq.get_attr()?;
    assert_eq!(attr.max_queue_depth, 4);
    assert_eq!(attr.max_message_size, 64);
    assert_eq!(attr.current_depth, 0);
    assert_eq!(attr.flags, AttributeFlags::empty());
    Ok(())
}

#[test]
fn current_depth_tracks_sends() -> Result<()> {
    if !common::mqueue_available() {
        return Ok(());
    }
    let mq = common::create_queue(4, 64)?;
    for i in 0..3u8 {
        mq.send(&NoDeadline, &[i], u32::from(i))?;
    }
    assert_eq!(mq.get_attr()?.current_depth, 3);
    Ok(())
}

#[test]
fn set_blocking_returns_the_snapshot_from_before_the_change() -> Result<()> {
    if !common::mqueue_available() {
        return Ok(());
    }
    let mq = common::create_queue(4, 64)?;

    // Created blocking; the pre-change snapshot has no flags set.
    let before = mq.set_blocking(false)?;
    assert!(!before.is_nonblocking());
    assert!(mq.get_attr()?.is_nonblocking());

    // And switching back reports the non-blocking state it replaced.
    let before = mq.set_blocking(true)?;
    assert!(before.is_nonblocking());
    assert!(!mq.get_attr()?.is_nonblocking());
    Ok(())
}

#[test]
fn set_blocking_preserves_capacity_bounds() -> Result<()> {
    if !common::mqueue_available() {
        return Ok(());
    }
    let mq = common::create_queue(4, 64)?;
    let snapshot = mq.set_blocking(false)?;
    assert_eq!(snapshot.max_queue_depth, 4);
    assert_eq!(snapshot.max_message_size, 64);
    Ok(())
}

#[test]
fn creating_without_attributes_uses_system_defaults() -> Result<()> {
    if !common::mqueue_available() {
        return Ok(());
    }
    // The defaults come from /proc/sys/fs/mqueue; skip where unreadable.
    let (depth, size) = match (attr::default_queue_depth(), attr::default_message_size()) {
        (Ok(depth), Ok(size)) => (depth, size),
        (depth, size) => {
            eprintln!("skipping: mqueue defaults unreadable ({depth:?}, {size:?})");
            return Ok(());
        }
    };

    let mq = OpenOptions::new()
        .flags(
            OpenFlags::READ_WRITE
                | OpenFlags::CREATE
                | OpenFlags::EXCLUSIVE
                | OpenFlags::CLOEXEC,
        )
        .open(&common::rand_name())?;
    let attr = mq.get_attr()?;
    let result = (|| {
        assert_eq!(attr.max_queue_depth, depth);
        assert_eq!(attr.max_message_size, size);
        Ok(())
    })();
    mq.unlink().ok();
    result
}
