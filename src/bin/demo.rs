//! Minimal demonstration of the library entry point: sorts a small word
//! list and prints the result. Not a command-line driver -- there are no
//! flags here, just a smoke test a reader can `cargo run` by hand.

use lcp_parallel_merge::{sort, StringHandle};

fn leak(s: &str) -> StringHandle {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    StringHandle::from_nul_terminated(Box::leak(bytes.into_boxed_slice()))
}

fn main() {
    env_logger::init();

    let words = ["banana", "apple", "apricot", "band", "a", "appetite"];
    let mut handles: Vec<StringHandle> = words.iter().map(|w| leak(w)).collect();

    sort(&mut handles).expect("sort should not fail on a small in-memory list");

    for h in &handles {
        let mut out = Vec::new();
        let mut i = 0usize;
        loop {
            let b = unsafe { *((h.0 as *const u8).add(i)) };
            if b == 0 {
                break;
            }
            out.push(b);
            i += 1;
        }
        println!("{}", String::from_utf8(out).unwrap());
    }
}
