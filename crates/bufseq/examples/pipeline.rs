//! Producer/consumer pipeline over a bounded channel.
//!
//! Run with: `cargo run --example pipeline`

use std::thread;

use bufseq_rs::{builder, SeqSink, SeqSource};

fn main() {
    let (mut tx, rx) = builder::for_chars().build_channel(8);

    let producer = thread::spawn(move || {
        let message: Vec<u16> = "the quick brown fox jumps over the lazy dog".encode_utf16().collect();
        let mut sent = 0;
        while sent < message.len() {
            // Uneven chunks: whatever fits contiguously goes out, the rest
            // waits for the consumer to free cells.
            let stop = (sent + 5).min(message.len());
            while sent < stop {
                sent += tx.append_slice(&message, sent, stop);
                tx.commit(tx.end());
            }
        }
        tx.close();
    });

    let consumer = thread::spawn(move || {
        let mut rx = rx;
        let mut out = String::new();
        let mut dest = [0u16; 4];
        let dest_len = dest.len();
        loop {
            let n = rx.read_into(rx.start(), &mut dest, 0, dest_len);
            if n == 0 {
                break;
            }
            out.push_str(&String::from_utf16_lossy(&dest[..n]));
            rx.commit(rx.advance(rx.start(), n as u64).unwrap());
        }
        out
    });

    producer.join().unwrap();
    let text = consumer.join().unwrap();
    println!("received: {text}");
    assert_eq!(text, "the quick brown fox jumps over the lazy dog");
}
