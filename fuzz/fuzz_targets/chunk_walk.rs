#![no_main]
use libfuzzer_sys::fuzz_target;
use sc_asset::{ByteCursor, ChunkWalker};

fuzz_target!(|data: &[u8]| {
	let mut cursor = ByteCursor::new(data);

	// No real LZMA/Zstd/ASTC/ETC1 backend runs here; the target only walks
	// the tagged chunk stream and drops every produced task, so a crash can
	// only come from the cursor bookkeeping or the tag dispatch itself.
	for task in ChunkWalker::new(&mut cursor) {
		let _ = task;
	}
});
