//! Speculative output with rollback.
//!
//! A failing branch must leave no partial output behind: snapshot before
//! the attempt, restore on failure.
//!
//! Run with: `cargo run --example rollback`

use bufseq_rs::{builder, IoBuf, SeqSink, SeqSource, ValueTransport};

/// Appends the decimal digits of `value` if it is even; odd values fail
/// after having emitted a sign, exercising the rollback path.
fn try_emit(out: &mut IoBuf<ValueTransport<u8>>, value: i32) -> bool {
    let mark = out.snapshot();
    out.append(b'+');
    if value % 2 != 0 {
        out.restore(mark);
        return false;
    }
    let digits = value.to_string();
    out.append_slice(digits.as_bytes(), 0, digits.len());
    out.append(b' ');
    true
}

fn main() {
    let mut out = builder::for_bytes().build_read_write();

    let mut accepted = 0;
    for value in [12, 7, 40, 3, 3, 56] {
        if try_emit(&mut out, value) {
            accepted += 1;
        }
    }

    let frozen = out.freeze();
    let mut bytes = vec![0u8; frozen.len()];
    let len = bytes.len();
    frozen.read_into(frozen.start(), &mut bytes, 0, len);
    let text = String::from_utf8(bytes).unwrap();

    println!("accepted {accepted} values: {text}");
    assert_eq!(text, "+12 +40 +56 ");
}
