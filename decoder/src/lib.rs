//! Shared behaviour required between decoder crates.

use tokenizing::{Color, Token};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Error {
    /// What kind of error happened in decoding an instruction.
    pub kind: ErrorKind,

    /// How many bytes in the stream did the invalid instruction consume.
    size: u8,
}

impl Error {
    pub fn new(kind: ErrorKind, size: usize) -> Self {
        Self {
            kind,
            size: size as u8,
        }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ErrorKind {
    /// Opcode in instruction is impossible/unknown.
    InvalidOpcode,

    /// Operand in instruction is impossible/unknown.
    InvalidOperand,

    /// Prefix in instruction is impossible/unknown.
    InvalidPrefixes,

    /// Register in instruction is impossible/unknown.
    InvalidRegister,

    /// There weren't any bytes left in the stream to decode.
    ExhaustedInput,

    /// Impossibly long instruction (x86/64 specific).
    TooLong,

    /// Some unknown variation of errors happened.
    IncompleteDecoder,
}

pub trait ToTokens {
    fn tokenize(&self, stream: &mut TokenStream);
}

pub trait Decoded: ToTokens {
    fn width(&self) -> usize;

    fn tokens(&self) -> Vec<Token> {
        let mut stream = TokenStream::new();
        self.tokenize(&mut stream);
        stream.into_tokens()
    }

    fn is_call(&self) -> bool {
        false
    }

    fn is_ret(&self) -> bool {
        false
    }

    fn is_jump(&self) -> bool {
        false
    }
}

pub trait Decodable {
    type Instruction: Decoded;

    fn decode(&self, reader: &mut Reader) -> Result<Self::Instruction, Error>;
    fn max_width(&self) -> usize;
}

/// Sequential disassembly of a byte slice, yielding instructions until the
/// input runs dry.
pub trait Streamable {
    type Item: Decoded;
    type Error;

    fn next(&mut self) -> Option<Result<Self::Item, Self::Error>>;
}

#[derive(Debug)]
pub struct TokenStream {
    inner: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self {
            inner: Vec::with_capacity(25),
        }
    }

    pub fn push_token(&mut self, token: Token) {
        self.inner.push(token);
    }

    pub fn push(&mut self, text: &'static str, color: &'static Color) {
        self.push_token(Token::from_str(text, color));
    }

    pub fn push_owned(&mut self, text: String, color: &'static Color) {
        self.push_token(Token::from_string(text, color));
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.inner
    }
}

impl Default for TokenStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ToString for TokenStream {
    fn to_string(&self) -> String {
        self.inner.iter().map(|t| &t.text as &str).collect()
    }
}

pub struct Reader<'data> {
    data: &'data [u8],
    position: usize,
    mark: usize,
}

impl<'data> Reader<'data> {
    pub fn new(data: &'data [u8]) -> Self {
        Self {
            data,
            position: 0,
            mark: 0,
        }
    }

    #[inline]
    pub fn next(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.position)?;
        self.position += 1;
        Some(byte)
    }

    /// Read `buf`-many bytes from this reader in bulk. If the reader cannot
    /// fill `buf`, return `None` and consume nothing.
    #[inline]
    pub fn next_n(&mut self, buf: &mut [u8]) -> Option<()> {
        let bytes = self.data.get(self.position..self.position + buf.len())?;
        buf.copy_from_slice(bytes);
        self.position += buf.len();
        Some(())
    }

    /// Mark the current position as where to measure `offset` against.
    #[inline]
    pub fn mark(&mut self) {
        self.mark = self.position;
    }

    /// The difference between the current `Reader` position and its last `mark`.
    /// When created, a `Reader`'s initial position is `mark`ed, so creating a
    /// `Reader` and immediately calling `offset()` must return 0.
    #[inline]
    pub fn offset(&mut self) -> usize {
        self.position - self.mark
    }

    /// The difference between the current `Reader` position and the start of
    /// the underlying data.
    #[inline]
    pub fn total_offset(&mut self) -> usize {
        self.position
    }
}

const HEX_NUGGET: [u8; 16] = *b"0123456789abcdef";

/// Encode 64-bit number with a leading '0x' and in lowercase.
pub fn encode_hex(mut imm: i64) -> String {
    let mut buffer = [0u8; 19];
    let mut idx = 0;

    if imm.is_negative() {
        buffer[idx] = b'-';
        idx += 1;
        imm = imm.wrapping_neg();
    }

    buffer[idx] = b'0';
    buffer[idx + 1] = b'x';
    idx += 2;

    if imm == 0 {
        buffer[idx] = b'0';
        idx += 1;
        return String::from_utf8_lossy(&buffer[..idx]).into_owned();
    }

    let len = imm.checked_ilog(16).unwrap_or(0) as usize + 1;
    let mut jdx = idx + len;

    while jdx != idx {
        let digit = imm & 0b1111;

        imm >>= 4;
        jdx -= 1;
        buffer[jdx] = HEX_NUGGET[digit as usize];
    }

    String::from_utf8_lossy(&buffer[..idx + len]).into_owned()
}
