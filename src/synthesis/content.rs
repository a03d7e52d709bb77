use bytes::{BufMut, Bytes, BytesMut};

/// Filler cycled through when no `fill` pattern is given: printable ASCII
/// from `!` to `~`
const DEFAULT_FILLER: &[u8] = b"!\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Produces a body of exactly `length` bytes
///
/// With a non-empty `fill` the body is that pattern repeated and truncated to
/// fit; otherwise a fixed printable filler is repeated.
pub fn generate(length: usize, fill: Option<&str>) -> Bytes {
    let pattern = match fill {
        Some(fill) if !fill.is_empty() => fill.as_bytes(),
        _ => DEFAULT_FILLER,
    };

    let mut body = BytesMut::with_capacity(length);
    while body.len() < length {
        let take = pattern.len().min(length - body.len());
        body.put_slice(&pattern[..take]);
    }
    body.freeze()
}
