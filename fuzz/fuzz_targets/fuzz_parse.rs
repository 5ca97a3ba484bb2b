#![no_main]

//! Assembler fuzzer.
//!
//! Feeds arbitrary text through the tokenizer and parser. Both must return
//! without panicking, and a successful parse must disassemble cleanly.

use libfuzzer_sys::fuzz_target;
use tankasm::isa::{parse, tokenize};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    let tokens = tokenize(source);
    match parse(&tokens) {
        Ok(program) => {
            let _ = program.listing();
            for (name, &addr) in program.labels() {
                assert!(
                    addr <= program.len(),
                    "label {name} points past the program end"
                );
            }
        }
        Err(err) => {
            assert!(err.line >= 1, "compile error without a line: {err}");
        }
    }
});
