#![cfg(test)]

mod avx512;
mod opcode;

use std::fmt::Write;

use crate::long_mode::Decoder;
use decoder::{Decodable, Decoded, Reader, ToTokens};

fn test_invalid(data: &[u8]) {
    test_invalid_under(&Decoder::default(), data);
}

fn test_invalid_under(decoder: &Decoder, data: &[u8]) {
    let mut reader = Reader::new(data);
    if let Ok(inst) = decoder.decode(&mut reader) {
        panic!("decoded {:?} from {:02x?}", inst.opcode(), data);
    }
}

fn test_display(data: &[u8], expected: &'static str) {
    test_display_under(&Decoder::default(), data, expected);
}

fn test_display_under(dekoder: &Decoder, data: &[u8], expected: &'static str) {
    let mut stream = decoder::TokenStream::new();
    let mut hex = String::new();
    for b in data {
        write!(hex, "{:02x}", b).unwrap();
    }

    let mut reader = Reader::new(data);
    match dekoder.decode(&mut reader) {
        Ok(instr) => {
            instr.tokenize(&mut stream);
            let text = stream.to_string();

            assert!(
                text == expected,
                "display error for {}:\n  decoded: {:?}\n displayed: {}\n expected: {}\n",
                hex,
                instr.opcode(),
                text,
                expected
            );
            // while we're at it, test that the instruction is as long, and no
            // longer, than its input
            assert_eq!(
                instr.width(),
                data.len(),
                "instruction length is incorrect, wanted instruction {}",
                expected
            );
        }
        Err(e) => {
            panic!("decode error ({:?}) for {}:\n  expected: {}\n", e, hex, expected);
        }
    }
}
