//! An `x86_64` (long mode) instruction decoder.
//!
//! Instructions are decoded from a byte stream: legacy prefixes first, then an
//! optional `rex`, `vex`, or `evex` prefix, the opcode (possibly behind the
//! `0f`/`0f 38`/`0f 3a` escape maps), and finally ModRM/SIB/displacement/
//! immediate fields. Decoding produces an [`long_mode::Instruction`] holding
//! the mnemonic, up to four operands, and any `avx512` masking, broadcast, or
//! rounding metadata.

pub mod long_mode;

use decoder::{Decodable, ToTokens};
use tokenizing::{ColorScheme, Colors};

const MEM_SIZE_STRINGS: [&str; 64] = [
    "byte", "word", "BUG", "dword", "ptr", "far", "BUG", "qword", "BUG", "mword", "BUG", "BUG",
    "BUG", "BUG", "BUG", "xmmword", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG",
    "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "ymmword", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG",
    "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG",
    "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "ptr", "zmmword",
];

struct Number(i32);

impl ToTokens for Number {
    fn tokenize(&self, stream: &mut decoder::TokenStream) {
        if self.0 == i32::MIN {
            stream.push(" - ", Colors::expr());
            stream.push("0x80000000", Colors::immediate());
        } else if self.0 < 0 {
            stream.push(" - ", Colors::expr());
            stream.push_owned(decoder::encode_hex(-self.0 as i64), Colors::immediate());
        } else {
            stream.push(" + ", Colors::expr());
            stream.push_owned(decoder::encode_hex(self.0 as i64), Colors::immediate());
        }
    }
}

pub struct MemoryAccessSize {
    size: u8,
}

impl MemoryAccessSize {
    /// return the number of bytes referenced by this memory access.
    ///
    /// if the number of bytes cannot be confidently known by the instruction in
    /// isolation, this function will return `None`.
    pub fn bytes_size(&self) -> Option<u8> {
        if self.size == 63 {
            None
        } else {
            Some(self.size)
        }
    }

    /// a human-friendly label for the number of bytes this memory access
    /// references: `byte`, `word`, `dword`, `far`, `qword`, `mword`,
    /// `xmmword`, `ymmword`, `zmmword`, or `ptr` for accesses whose width
    /// depends on the operating mode.
    pub fn size_name(&self) -> &'static str {
        MEM_SIZE_STRINGS[self.size as usize - 1]
    }
}

impl std::fmt::Display for MemoryAccessSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.size_name())
    }
}

impl std::fmt::Debug for MemoryAccessSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

/// Sequential disassembly over a byte slice.
pub struct Stream<'data> {
    pub bytes: &'data [u8],
    pub decoder: long_mode::Decoder,
    pub offset: usize,
    pub width: usize,
    pub section_base: usize,
}

impl decoder::Streamable for Stream<'_> {
    type Item = long_mode::Instruction;
    type Error = decoder::Error;

    fn next(&mut self) -> Option<Result<Self::Item, Self::Error>> {
        let bytes = self.bytes.get(self.offset..)?;
        if bytes.is_empty() {
            return None;
        }

        let mut reader = decoder::Reader::new(bytes);
        let result = match self.decoder.decode(&mut reader) {
            // a truncated tail consumes nothing, the stream ends where it is
            Err(err) if err.kind == decoder::ErrorKind::ExhaustedInput => return None,
            Err(err) => {
                self.width = err.size();
                Err(err)
            }
            Ok(instr) => {
                self.width = reader.offset();
                Ok(instr)
            }
        };

        self.offset += self.width;
        Some(result)
    }
}
