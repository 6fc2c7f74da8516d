//! Cross-thread channel behavior: FIFO delivery, blocking and wakeup,
//! commit-gated visibility, and close/drain semantics.

use std::thread;
use std::time::Duration;

use bufseq_rs::{builder, SeqSink, SeqSource};

const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn letters() -> Vec<u16> {
    ALPHABET.encode_utf16().collect()
}

#[test]
fn test_alphabet_one_letter_at_a_time() {
    for capacity in 2..=6 {
        let (mut tx, rx) = builder::for_chars().build_channel(capacity);

        let producer = thread::spawn(move || {
            for unit in letters() {
                tx.append(unit);
                tx.commit(tx.end());
            }
            tx.close();
        });

        let consumer = thread::spawn(move || {
            let mut rx = rx;
            let mut out = String::new();
            let mut cur = rx.start();
            while let Some(unit) = rx.read(cur) {
                out.push(char::from_u32(u32::from(unit)).unwrap());
                let next = rx.advance(cur, 1).unwrap();
                rx.commit(next);
                cur = next;
            }
            out
        });

        producer.join().unwrap();
        assert_eq!(consumer.join().unwrap(), ALPHABET, "capacity {capacity}");
    }
}

#[test]
fn test_alphabet_bulk_chunks() {
    // Uneven producer chunks against a fixed consumer window of four.
    let chunks = [3usize, 1, 5, 2, 6, 4, 5];
    assert_eq!(chunks.iter().sum::<usize>(), 26);

    for capacity in [7, 9, 11, 13] {
        let (mut tx, rx) = builder::for_chars().build_channel(capacity);

        let producer = thread::spawn(move || {
            let units = letters();
            let mut sent = 0;
            for &chunk in &chunks {
                let stop = sent + chunk;
                while sent < stop {
                    sent += tx.append_slice(&units, sent, stop);
                    tx.commit(tx.end());
                }
            }
            tx.close();
        });

        let consumer = thread::spawn(move || {
            let mut rx = rx;
            let mut out = String::new();
            loop {
                let mut dest = [0u16; 5];
                let n = rx.read_into(rx.start(), &mut dest, 1, 4);
                if n == 0 {
                    break;
                }
                out.push_str(&String::from_utf16(&dest[1..1 + n]).unwrap());
                let consumed = rx.advance(rx.start(), n as u64).unwrap();
                rx.commit(consumed);
            }
            out
        });

        producer.join().unwrap();
        assert_eq!(consumer.join().unwrap(), ALPHABET, "capacity {capacity}");
    }
}

#[test]
fn test_no_tear_without_commit() {
    let (mut tx, rx) = builder::for_ints().build_channel(8);
    for v in 0..5 {
        tx.append(v);
    }
    // Nothing committed: the reader sees an empty readable region.
    assert_eq!(rx.start(), rx.end());
    assert_eq!(rx.available(), 0);
    let mut dest = [0; 4];
    // advance finds no readable element either.
    assert_eq!(rx.advance(rx.start(), 1), None);

    tx.commit(tx.end());
    assert_eq!(rx.available(), 5);
    assert_eq!(rx.read_into(rx.start(), &mut dest, 0, 4), 4);
    assert_eq!(dest, [0, 1, 2, 3]);
}

#[test]
fn test_conservation_accounting() {
    let (mut tx, mut rx) = builder::for_ints().build_channel(8);

    tx.append_slice(&[1, 2, 3], 0, 3);
    let first_three = tx.end();
    tx.append_slice(&[4, 5], 0, 2);
    tx.commit(first_three);

    // produced == consumed + readable + written
    assert_eq!(rx.available(), 3);
    assert_eq!(tx.uncommitted(), 2);

    let mut out = [0; 2];
    assert_eq!(rx.read_into(rx.start(), &mut out, 0, 2), 2);
    rx.commit(rx.advance(rx.start(), 2).unwrap());
    assert_eq!(2 + rx.available() + tx.uncommitted(), 5);

    // Close discards the uncommitted pair; consumed never exceeds produced.
    tx.close();
    assert_eq!(tx.uncommitted(), 0);
    assert_eq!(rx.available(), 1);
}

#[test]
fn test_blocked_append_unblocks_on_reader_commit() {
    let (mut tx, mut rx) = builder::for_ints().build_channel(2);
    assert_eq!(tx.append_slice(&[1, 2], 0, 2), 2);
    tx.commit(tx.end());

    let producer = thread::spawn(move || {
        tx.append(3); // full: parks until the reader commits
        tx.commit(tx.end());
        tx.close();
    });

    thread::sleep(Duration::from_millis(50));
    let mut out = [0; 2];
    assert_eq!(rx.read_into(rx.start(), &mut out, 0, 2), 2);
    rx.commit(rx.advance(rx.start(), 2).unwrap());

    producer.join().unwrap();
    assert_eq!(rx.read(rx.start()), Some(3));
}

#[test]
fn test_close_unblocks_blocked_reader() {
    let (mut tx, rx) = builder::for_ints().build_channel(2);

    let consumer = thread::spawn(move || rx.read(rx.start()));

    thread::sleep(Duration::from_millis(50));
    tx.close();
    assert_eq!(consumer.join().unwrap(), None);
}

#[test]
fn test_need_capacity_waits_for_free_cell() {
    let (mut tx, mut rx) = builder::for_ints().build_channel(4);
    assert_eq!(tx.need_capacity(1), 4);
    tx.append(1);
    assert_eq!(tx.need_capacity(1), 3);

    // Fill the ring, then have the consumer free one cell from another
    // thread while the producer is parked in need_capacity.
    tx.append_slice(&[2, 3, 4], 0, 3);
    tx.commit(tx.end());

    let waiter = thread::spawn(move || {
        let free = tx.need_capacity(1);
        (tx, free)
    });

    thread::sleep(Duration::from_millis(50));
    rx.commit(rx.advance(rx.start(), 1).unwrap());

    let (_tx, free) = waiter.join().unwrap();
    assert_eq!(free, 1);
}

#[test]
fn test_dropping_writer_closes() {
    let (tx, rx) = builder::for_ints().build_channel(2);
    let consumer = thread::spawn(move || rx.read(rx.start()));
    thread::sleep(Duration::from_millis(50));
    drop(tx);
    assert_eq!(consumer.join().unwrap(), None);
}

#[test]
fn test_fifo_under_contention() {
    const TOTAL: i32 = 5_000;
    let (mut tx, rx) = builder::for_ints().build_channel(16);

    let producer = thread::spawn(move || {
        let values: Vec<i32> = (0..TOTAL).collect();
        let mut sent = 0usize;
        while sent < values.len() {
            sent += tx.append_slice(&values, sent, values.len());
            tx.commit(tx.end());
        }
        tx.close();
    });

    let consumer = thread::spawn(move || {
        let mut rx = rx;
        let mut seen = Vec::new();
        let mut dest = [0i32; 32];
        let dest_len = dest.len();
        loop {
            let n = rx.read_into(rx.start(), &mut dest, 0, dest_len);
            if n == 0 {
                break;
            }
            seen.extend_from_slice(&dest[..n]);
            rx.commit(rx.advance(rx.start(), n as u64).unwrap());
        }
        seen
    });

    producer.join().unwrap();
    let seen = consumer.join().unwrap();
    assert_eq!(seen.len(), TOTAL as usize);
    assert!(seen.iter().enumerate().all(|(i, &v)| v == i as i32));
}
