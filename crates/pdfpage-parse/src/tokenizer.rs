//! Content stream tokenizer.
//!
//! Splits content stream bytes into [`Operation`]s whose operands are lopdf
//! objects. An inline image (`BI … ID … EI`) becomes a single `BI`
//! operation with two operands: the image dictionary, with abbreviated keys
//! and names expanded, and the raw sample bytes as a string.

use lopdf::content::Operation;
use lopdf::{Dictionary, Object, StringFormat};

use crate::error::BackendError;

/// Nesting limit for arrays and dictionaries inside operands.
const MAX_NESTING: usize = 32;

/// Tokenize a content stream.
///
/// # Errors
///
/// [`BackendError::Parse`] for unterminated strings, arrays, dictionaries,
/// or inline images, and for stray closing delimiters.
pub(crate) fn tokenize(input: &[u8]) -> Result<Vec<Operation>, BackendError> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut ops = Vec::new();
    let mut operands = Vec::new();

    while let Some(token) = lexer.next_token(0)? {
        match token {
            Token::Object(obj) => operands.push(obj),
            Token::Keyword(keyword) => match keyword.as_str() {
                "true" => operands.push(Object::Boolean(true)),
                "false" => operands.push(Object::Boolean(false)),
                "null" => operands.push(Object::Null),
                "BI" => {
                    operands.clear();
                    let (dict, data) = lexer.inline_image()?;
                    ops.push(Operation::new(
                        "BI",
                        vec![
                            Object::Dictionary(dict),
                            Object::String(data, StringFormat::Literal),
                        ],
                    ));
                }
                _ => ops.push(Operation::new(&keyword, std::mem::take(&mut operands))),
            },
            Token::ArrayEnd => return Err(syntax("unexpected ']' outside an array")),
            Token::DictEnd => return Err(syntax("unexpected '>>' outside a dictionary")),
        }
    }
    Ok(ops)
}

fn syntax(msg: &str) -> BackendError {
    BackendError::Parse(format!("content stream: {msg}"))
}

#[derive(Debug)]
enum Token {
    Object(Object),
    Keyword(String),
    ArrayEnd,
    DictEnd,
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C' | b'\0')
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self, depth: usize) -> Result<Option<Token>, BackendError> {
        self.skip_whitespace_and_comments();
        let Some(b) = self.peek() else {
            return Ok(None);
        };
        let token = match b {
            b'(' => Token::Object(Object::String(
                self.literal_string()?,
                StringFormat::Literal,
            )),
            b'<' if self.input.get(self.pos + 1) == Some(&b'<') => {
                self.pos += 2;
                Token::Object(Object::Dictionary(self.dictionary(depth + 1)?))
            }
            b'<' => Token::Object(Object::String(self.hex_string()?, StringFormat::Hexadecimal)),
            b'>' if self.input.get(self.pos + 1) == Some(&b'>') => {
                self.pos += 2;
                Token::DictEnd
            }
            b'[' => {
                self.pos += 1;
                Token::Object(Object::Array(self.array(depth + 1)?))
            }
            b']' => {
                self.pos += 1;
                Token::ArrayEnd
            }
            b'/' => Token::Object(Object::Name(self.name())),
            b'0'..=b'9' | b'+' | b'-' | b'.' => Token::Object(self.number()),
            b')' | b'>' | b'{' | b'}' => {
                return Err(syntax(&format!("unexpected '{}'", char::from(b))));
            }
            _ => Token::Keyword(self.keyword()),
        };
        Ok(Some(token))
    }

    /// One operand value inside an array, dictionary, or inline image
    /// dictionary.
    fn value(token: Token) -> Result<Object, BackendError> {
        match token {
            Token::Object(obj) => Ok(obj),
            Token::Keyword(kw) => match kw.as_str() {
                "true" => Ok(Object::Boolean(true)),
                "false" => Ok(Object::Boolean(false)),
                "null" => Ok(Object::Null),
                _ => Err(syntax(&format!("unexpected keyword '{kw}' in operand"))),
            },
            Token::ArrayEnd | Token::DictEnd => Err(syntax("unbalanced closing delimiter")),
        }
    }

    fn array(&mut self, depth: usize) -> Result<Vec<Object>, BackendError> {
        if depth > MAX_NESTING {
            return Err(syntax("arrays nested too deeply"));
        }
        let mut items = Vec::new();
        loop {
            match self.next_token(depth)? {
                None => return Err(syntax("unterminated array")),
                Some(Token::ArrayEnd) => return Ok(items),
                Some(token) => items.push(Self::value(token)?),
            }
        }
    }

    fn dictionary(&mut self, depth: usize) -> Result<Dictionary, BackendError> {
        if depth > MAX_NESTING {
            return Err(syntax("dictionaries nested too deeply"));
        }
        let mut dict = Dictionary::new();
        loop {
            let key = match self.next_token(depth)? {
                None => return Err(syntax("unterminated dictionary")),
                Some(Token::DictEnd) => return Ok(dict),
                Some(Token::Object(Object::Name(key))) => key,
                Some(_) => return Err(syntax("dictionary key is not a name")),
            };
            let value = match self.next_token(depth)? {
                None => return Err(syntax("unterminated dictionary")),
                Some(token) => Self::value(token)?,
            };
            dict.set(key, value);
        }
    }

    fn name(&mut self) -> Vec<u8> {
        self.pos += 1;
        let mut name = Vec::new();
        while let Some(b) = self.peek() {
            if !is_regular(b) {
                break;
            }
            if b == b'#' {
                let hex = self
                    .input
                    .get(self.pos + 1..self.pos + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    name.push(byte);
                    self.pos += 3;
                    continue;
                }
            }
            name.push(b);
            self.pos += 1;
        }
        name
    }

    fn keyword(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_regular) {
            self.pos += 1;
        }
        if self.pos == start {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Integer or real; malformed numbers such as `--1` read as zero.
    fn number(&mut self) -> Object {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("0");
        if text.contains('.') {
            Object::Real(text.parse::<f32>().unwrap_or(0.0))
        } else {
            Object::Integer(text.parse::<i64>().unwrap_or(0))
        }
    }

    fn literal_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut nesting = 1usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'(' => {
                    nesting += 1;
                    out.push(b);
                }
                b')' => {
                    nesting -= 1;
                    if nesting == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => self.escape(&mut out),
                _ => out.push(b),
            }
        }
        Err(syntax("unterminated string"))
    }

    fn escape(&mut self, out: &mut Vec<u8>) {
        let Some(b) = self.peek() else {
            return;
        };
        self.pos += 1;
        match b {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'0'..=b'7' => {
                let mut value = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            // Line continuation.
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            b'\n' => {}
            other => out.push(other),
        }
    }

    fn hex_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut digits = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'>' {
                return Ok(hex_digits_to_bytes(&digits));
            }
            if let Some(d) = hex_value(b) {
                digits.push(d);
            } else if !is_whitespace(b) {
                return Err(syntax("invalid character in hex string"));
            }
        }
        Err(syntax("unterminated hex string"))
    }

    /// Parse an inline image after `BI`: key/value pairs up to `ID`, then
    /// the sample bytes up to `EI`.
    fn inline_image(&mut self) -> Result<(Dictionary, Vec<u8>), BackendError> {
        let mut dict = Dictionary::new();
        loop {
            let key = match self.next_token(0)? {
                None => return Err(syntax("unterminated inline image (missing ID)")),
                Some(Token::Keyword(kw)) if kw == "ID" => break,
                Some(Token::Object(Object::Name(key))) => key,
                Some(_) => return Err(syntax("inline image key is not a name")),
            };
            let value = match self.next_token(0)? {
                None => return Err(syntax("unterminated inline image dictionary")),
                Some(Token::Keyword(kw)) if !matches!(kw.as_str(), "true" | "false" | "null") => {
                    Object::Name(kw.into_bytes())
                }
                Some(token) => Self::value(token)?,
            };
            let key = expand_key(&key);
            let value = expand_value(key, value);
            dict.set(key, value);
        }

        // A single whitespace byte separates ID from the data.
        if self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        let data_start = self.pos;
        let expected = unfiltered_len(&dict);
        let mut pos = (data_start + expected).min(self.input.len());
        while pos + 2 <= self.input.len() {
            let preceded = pos == data_start || is_whitespace(self.input[pos - 1]);
            let followed = self
                .input
                .get(pos + 2)
                .is_none_or(|&b| is_whitespace(b) || is_delimiter(b));
            if preceded && followed && &self.input[pos..pos + 2] == b"EI" {
                let mut data = self.input[data_start..pos].to_vec();
                if expected > 0 && data.len() >= expected {
                    data.truncate(expected);
                } else if data.last().is_some_and(|&b| is_whitespace(b)) {
                    data.pop();
                }
                self.pos = pos + 2;
                return Ok((dict, data));
            }
            pos += 1;
        }
        Err(syntax("unterminated inline image (missing EI)"))
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Pair up hex digits; an odd final digit is padded with zero.
fn hex_digits_to_bytes(digits: &[u8]) -> Vec<u8> {
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Full key name for an inline image dictionary abbreviation.
fn expand_key(key: &[u8]) -> &[u8] {
    match key {
        b"W" => b"Width",
        b"H" => b"Height",
        b"CS" => b"ColorSpace",
        b"BPC" => b"BitsPerComponent",
        b"F" => b"Filter",
        b"DP" => b"DecodeParms",
        b"IM" => b"ImageMask",
        b"D" => b"Decode",
        b"I" => b"Interpolate",
        other => other,
    }
}

fn expand_name(key: &[u8], name: Vec<u8>) -> Vec<u8> {
    let full: &[u8] = match (key, name.as_slice()) {
        (b"ColorSpace", b"G") => b"DeviceGray",
        (b"ColorSpace", b"RGB") => b"DeviceRGB",
        (b"ColorSpace", b"CMYK") => b"DeviceCMYK",
        (b"ColorSpace", b"I") => b"Indexed",
        (b"Filter", b"AHx") => b"ASCIIHexDecode",
        (b"Filter", b"A85") => b"ASCII85Decode",
        (b"Filter", b"LZW") => b"LZWDecode",
        (b"Filter", b"Fl") => b"FlateDecode",
        (b"Filter", b"RL") => b"RunLengthDecode",
        (b"Filter", b"CCF") => b"CCITTFaxDecode",
        (b"Filter", b"DCT") => b"DCTDecode",
        _ => return name,
    };
    full.to_vec()
}

fn expand_value(key: &[u8], value: Object) -> Object {
    match value {
        Object::Name(name) => Object::Name(expand_name(key, name)),
        // `[/I /RGB 1 <...>]` and filter chains.
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Object::Name(name) => Object::Name(expand_name(key, name)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

/// Byte length of unfiltered sample data, or 0 when it cannot be known
/// from the dictionary alone.
fn unfiltered_len(dict: &Dictionary) -> usize {
    if dict.get(b"Filter").is_ok() {
        return 0;
    }
    let int = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|o| o.as_i64().ok())
            .and_then(|v| usize::try_from(v).ok())
    };
    let is_mask = dict
        .get(b"ImageMask")
        .ok()
        .and_then(|o| o.as_bool().ok())
        .unwrap_or(false);
    let components = if is_mask {
        Some(1)
    } else {
        match dict.get(b"ColorSpace") {
            Ok(Object::Name(n)) => match n.as_slice() {
                b"DeviceGray" | b"CalGray" => Some(1),
                b"DeviceRGB" | b"CalRGB" | b"Lab" => Some(3),
                b"DeviceCMYK" => Some(4),
                _ => None,
            },
            Ok(Object::Array(items)) => match items.first() {
                Some(Object::Name(n)) if n.as_slice() == b"Indexed" => Some(1),
                _ => None,
            },
            _ => None,
        }
    };
    let bpc = if is_mask { Some(1) } else { int(b"BitsPerComponent") };
    let (Some(w), Some(h), Some(n), Some(bpc)) = (int(b"Width"), int(b"Height"), components, bpc)
    else {
        return 0;
    };
    w.checked_mul(n)
        .and_then(|v| v.checked_mul(bpc))
        .map(|bits| bits.div_ceil(8))
        .and_then(|row| row.checked_mul(h))
        .unwrap_or(0)
}
