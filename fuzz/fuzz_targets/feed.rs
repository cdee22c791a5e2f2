#![no_main]

use libfuzzer_sys::fuzz_target;
use trickle::{Kind, OwnedEvent, Parser};

fn run(kind: Kind, input: &[u8], split: usize) -> (Vec<OwnedEvent>, bool) {
    let mut parser = Parser::new(kind);
    let mut events = Vec::new();

    for chunk in input.chunks(split) {
        match parser.feed(chunk, &mut events) {
            Ok(n) => assert!(n <= chunk.len()),
            Err(_) => break,
        }
    }
    let _ = parser.finish(&mut events);

    // Body pieces follow the split, join them.
    let mut merged: Vec<OwnedEvent> = Vec::new();
    for e in events {
        if let OwnedEvent::BodyChunk { data, is_final } = &e {
            if let Some(OwnedEvent::BodyChunk {
                data: prev,
                is_final: prev_final,
            }) = merged.last_mut()
            {
                prev.extend_from_slice(data);
                *prev_final = *is_final;
                continue;
            }
        }
        merged.push(e);
    }

    (merged, parser.is_failed())
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the split size, the rest is the input.
    let split = (data[0] as usize % 16) + 1;
    let input = &data[1..];

    for kind in [Kind::Request, Kind::Response, Kind::Both] {
        let whole = run(kind, input, input.len().max(1));
        let pieces = run(kind, input, split);
        assert_eq!(whole, pieces);
    }
});
