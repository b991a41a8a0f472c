#![no_main]
use std::cell::RefCell;
use std::num::NonZeroU64;

use arbitrary::{Arbitrary, Unstructured};
use jsonstack::{BuilderOptions, DecimalMode, Decoder, NoCache, ParserOptions};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

const HEADER: usize = 5; // 1 flag + 4-byte seed

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

static WS_TABLE: &[&[u8]] = &[b" ", b"\t", b"\n", b"\r", b"/* c */", b"// c\n"];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Rebuilds the input from generated documents one time in ten, otherwise
/// leaves mutation to libFuzzer.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size >= HEADER && !seed.is_multiple_of(10) {
        return fuzzer_mutate(data, size, max_size);
    }

    data[0] = with_rng(|rng| rng.next_u32() as u8 & 0x3F);
    data[1..5].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));

    let mut len = HEADER;
    while len < size.max(HEADER + 1) && len < max_size {
        len += pad(&mut data[len..max_size]);
        len += document(&mut data[len..max_size], size);
        len += pad(&mut data[len..max_size]);
    }
    len
}

/// Writes whitespace and comments into `buf`, as much as fits.
fn pad(buf: &mut [u8]) -> usize {
    if buf.is_empty() {
        return 0;
    }
    with_rng(|rng| {
        let mut written = 0;
        for _ in 0..rng.random_range(1..=8) {
            let w = WS_TABLE[rng.random_range(0..WS_TABLE.len())];
            if written + w.len() > buf.len() {
                break;
            }
            buf[written..written + w.len()].copy_from_slice(w);
            written += w.len();
        }
        written
    })
}

/// Writes one generated document into `buf`, truncated to fit.
fn document(buf: &mut [u8], size: usize) -> usize {
    let doc = loop {
        let n = with_rng(|rng| rng.random_range(8..(size * 2).max(16)));
        let bytes: Vec<u8> = with_rng(|rng| (0..n).map(|_| rng.random::<u8>()).collect());
        if let Ok(doc) = Doc::arbitrary(&mut Unstructured::new(&bytes)) {
            break doc;
        }
    };
    let mut text = Vec::new();
    doc.write(&mut text);
    let len = text.len().min(buf.len());
    buf[..len].copy_from_slice(&text[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// A document shape biased toward the literals the decoder treats
/// specially: integers past `i64`, long or extreme decimals, non-finite
/// names and `\u` escapes including lone surrogates.
#[derive(Debug, Arbitrary)]
enum Doc {
    Null,
    Bool(bool),
    Int(i64),
    BigInt {
        negative: bool,
        head: NonZeroU64,
        tail: u64,
    },
    Decimal {
        negative: bool,
        int: u64,
        frac: Option<u64>,
        exp: Option<i16>,
    },
    NonFinite(NonFinite),
    Str(Vec<Piece>),
    Array(Vec<Doc>),
    Object(Vec<(Vec<Piece>, Doc)>),
    /// Brackets around `inner`, enough of them to cross the depth limit.
    Nested { levels: u16, inner: Box<Doc> },
}

#[derive(Debug, Arbitrary)]
enum NonFinite {
    NaN,
    Infinity,
    NegInfinity,
}

#[derive(Debug, Arbitrary)]
enum Piece {
    Plain(String),
    /// Any raw bytes other than quote and backslash.
    Raw(Vec<u8>),
    Short(u8),
    Unit { unit: u16, upper: bool },
    Pair { high: u16, low: u16 },
}

impl Doc {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Doc::Null => out.extend_from_slice(b"null"),
            Doc::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
            Doc::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Doc::BigInt {
                negative,
                head,
                tail,
            } => {
                let sign = if *negative { "-" } else { "" };
                out.extend_from_slice(format!("{sign}{head}{tail:019}").as_bytes());
            }
            Doc::Decimal {
                negative,
                int,
                frac,
                exp,
            } => {
                if *negative {
                    out.push(b'-');
                }
                out.extend_from_slice(int.to_string().as_bytes());
                if let Some(frac) = frac {
                    out.extend_from_slice(format!(".{frac}").as_bytes());
                }
                if let Some(exp) = exp {
                    out.extend_from_slice(format!("e{exp}").as_bytes());
                }
            }
            Doc::NonFinite(NonFinite::NaN) => out.extend_from_slice(b"NaN"),
            Doc::NonFinite(NonFinite::Infinity) => out.extend_from_slice(b"Infinity"),
            Doc::NonFinite(NonFinite::NegInfinity) => out.extend_from_slice(b"-Infinity"),
            Doc::Str(pieces) => write_str(pieces, out),
            Doc::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    item.write(out);
                }
                out.push(b']');
            }
            Doc::Object(members) => {
                out.push(b'{');
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    write_str(key, out);
                    out.push(b':');
                    value.write(out);
                }
                out.push(b'}');
            }
            Doc::Nested { levels, inner } => {
                let levels = usize::from(*levels % 600);
                out.extend(std::iter::repeat_n(b'[', levels));
                inner.write(out);
                out.extend(std::iter::repeat_n(b']', levels));
            }
        }
    }
}

fn write_str(pieces: &[Piece], out: &mut Vec<u8>) {
    out.push(b'"');
    for piece in pieces {
        match piece {
            Piece::Plain(s) => {
                for c in s.chars() {
                    match c {
                        '"' => out.extend_from_slice(b"\\\""),
                        '\\' => out.extend_from_slice(b"\\\\"),
                        c if u32::from(c) < 0x20 => {
                            out.extend_from_slice(format!("\\u{:04x}", u32::from(c)).as_bytes());
                        }
                        c => out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes()),
                    }
                }
            }
            Piece::Raw(bytes) => out.extend(bytes.iter().filter(|&&b| b != b'"' && b != b'\\')),
            Piece::Short(i) => {
                out.push(b'\\');
                out.push(b"\"\\/bfnrt"[usize::from(*i % 8)]);
            }
            Piece::Unit { unit, upper } => {
                let text = if *upper {
                    format!("\\u{unit:04X}")
                } else {
                    format!("\\u{unit:04x}")
                };
                out.extend_from_slice(text.as_bytes());
            }
            Piece::Pair { high, low } => {
                let high = 0xD800 | (high & 0x3FF);
                let low = 0xDC00 | (low & 0x3FF);
                out.extend_from_slice(format!("\\u{high:04x}\\u{low:04x}").as_bytes());
            }
        }
    }
    out.push(b'"');
}

fn options(flags: u8) -> ParserOptions {
    ParserOptions {
        allow_multiple_values: flags & 1 != 0,
        allow_comments: flags & 2 != 0,
        allow_nan: flags & 4 != 0,
        allow_invalid_unicode: flags & 8 != 0,
        decimal_mode: match (flags >> 4) & 3 {
            0 => DecimalMode::Auto,
            1 => DecimalMode::Float,
            2 => DecimalMode::Fast,
            _ => DecimalMode::Big,
        },
        ..Default::default()
    }
}

/// Decodes `chunks` and renders the values, or the error kind. Error offsets
/// may differ between chunkings for invalid UTF-8, kinds may not.
fn decode(flags: u8, chunks: &[&[u8]]) -> Result<String, String> {
    let mut decoder = Decoder::new(options(flags), BuilderOptions::default(), NoCache);
    for chunk in chunks {
        decoder.feed(chunk).map_err(|err| format!("{:?}", err.kind))?;
    }
    decoder
        .finish()
        .map(|values| format!("{values:?}"))
        .map_err(|err| format!("{:?}", err.kind))
}

/// Chunked decoding must agree with one-shot decoding.
fn decoder(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u32::from_le_bytes([data[1], data[2], data[3], data[4]]) as usize;
    let data = &data[HEADER..];

    let whole = decode(flags, &[data]);
    let chunks = split(data, split_seed);
    let chunked = decode(flags, &chunks);
    assert_eq!(whole, chunked, "chunks: {chunks:?}");
}

fuzz_target!(|data: &[u8]| decoder(data));

/// Splits `data` into non-empty chunks whose sizes derive from `seed`.
fn split(data: &[u8], seed: usize) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut seed = seed.max(1);
    while start < data.len() {
        let size = seed % (data.len() - start) + 1;
        chunks.push(&data[start..start + size]);
        start += size;
        seed = seed.wrapping_mul(31).wrapping_add(7);
    }
    chunks
}
