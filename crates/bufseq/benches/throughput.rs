use bufseq_rs::{builder, SeqSink, SeqSource};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::thread;

const TOTAL: usize = 1_000_000;
const RING_CAPACITY: usize = 4096;
const BATCH: usize = 1024;

fn bench_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel");
    group.throughput(Throughput::Elements(TOTAL as u64));

    group.bench_function("spsc_bulk", |b| {
        b.iter(|| {
            let (mut tx, rx) = builder::for_ints().build_channel(RING_CAPACITY);

            let producer = thread::spawn(move || {
                let values: Vec<i32> = (0..TOTAL as i32).collect();
                let mut sent = 0;
                while sent < values.len() {
                    let stop = (sent + BATCH).min(values.len());
                    while sent < stop {
                        sent += tx.append_slice(&values, sent, stop);
                        tx.commit(tx.end());
                    }
                }
                tx.close();
            });

            let mut rx = rx;
            let mut dest = vec![0i32; BATCH];
            let dest_len = dest.len();
            let mut received = 0usize;
            loop {
                let n = rx.read_into(rx.start(), &mut dest, 0, dest_len);
                if n == 0 {
                    break;
                }
                black_box(&dest[..n]);
                rx.commit(rx.advance(rx.start(), n as u64).unwrap());
                received += n;
            }

            producer.join().unwrap();
            assert_eq!(received, TOTAL);
        });
    });

    group.finish();
}

fn bench_io_buf(c: &mut Criterion) {
    let mut group = c.benchmark_group("io_buf");
    group.throughput(Throughput::Elements(TOTAL as u64));

    group.bench_function("append_slice", |b| {
        let values: Vec<i32> = (0..TOTAL as i32).collect();
        b.iter(|| {
            let mut buf = builder::for_ints().build_read_write();
            buf.ensure_capacity(TOTAL);
            let mut sent = 0;
            while sent < values.len() {
                let stop = (sent + BATCH).min(values.len());
                sent += buf.append_slice(&values, sent, stop);
            }
            black_box(buf.len())
        });
    });

    group.bench_function("snapshot_restore", |b| {
        let mut buf = builder::for_ints().build_read_write();
        let junk: Vec<i32> = (0..BATCH as i32).collect();
        b.iter(|| {
            let mark = buf.snapshot();
            buf.append_slice(&junk, 0, junk.len());
            buf.restore(mark);
            black_box(buf.len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_channel, bench_io_buf);
criterion_main!(benches);
