//! XML Entity Decoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - Other named entities through an optional caller-supplied resolver
//!
//! Decoding is strict: a reference that cannot be resolved is an error, never
//! passed through. Uses Cow for zero-copy when no entities are present.

use super::error::{ErrorCode, XmlError};
use super::position::{advance_position, Position};
use memchr::memchr;
use std::borrow::Cow;
use std::sync::Arc;

/// Caller hook for named entities outside the built-in set.
///
/// Returning `None` means the entity is unresolved.
pub type EntityResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Decode all entity references in `text`
///
/// `base` is the position of `text[0]` in the caller's coordinates; errors
/// cite the `&` that introduced the bad reference.
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
pub fn decode_xml_entities<'a>(
    text: &'a str,
    base: Position,
    resolver: Option<&EntityResolver>,
) -> Result<Cow<'a, str>, XmlError> {
    let bytes = text.as_bytes();

    // Fast path: check if there are any entities using SIMD
    let first_amp = match memchr(b'&', bytes) {
        Some(i) => i,
        None => return Ok(Cow::Borrowed(text)),
    };

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    let mut amp = first_amp;

    loop {
        result.push_str(&text[last..amp]);

        let semi = match memchr(b';', &bytes[amp + 1..]) {
            Some(i) => amp + 1 + i,
            None => {
                return Err(XmlError::new(
                    ErrorCode::EntityUnterminated,
                    advance_position(base, text, amp),
                    "Unterminated entity",
                ))
            }
        };

        let body = &text[amp + 1..semi];
        match decode_entity(body, resolver) {
            Ok(decoded) => result.push_str(&decoded),
            Err((code, message)) => {
                return Err(XmlError::new(code, advance_position(base, text, amp), message));
            }
        }

        last = semi + 1;
        match memchr(b'&', &bytes[last..]) {
            Some(i) => amp = last + i,
            None => break,
        }
    }

    result.push_str(&text[last..]);
    Ok(Cow::Owned(result))
}

/// Decode a single entity body (the part between `&` and `;`)
fn decode_entity<'b>(
    body: &'b str,
    resolver: Option<&EntityResolver>,
) -> Result<Cow<'b, str>, (ErrorCode, String)> {
    match body {
        "lt" => return Ok(Cow::Borrowed("<")),
        "gt" => return Ok(Cow::Borrowed(">")),
        "amp" => return Ok(Cow::Borrowed("&")),
        "quot" => return Ok(Cow::Borrowed("\"")),
        "apos" => return Ok(Cow::Borrowed("'")),
        _ => {}
    }

    if let Some(hex) = body.strip_prefix("#x") {
        return parse_char_ref(hex, 16)
            .map(|c| Cow::Owned(c.to_string()))
            .ok_or_else(|| (ErrorCode::EntityBad, format!("Bad hex entity: &{};", body)));
    }
    if let Some(dec) = body.strip_prefix('#') {
        return parse_char_ref(dec, 10)
            .map(|c| Cow::Owned(c.to_string()))
            .ok_or_else(|| (ErrorCode::EntityBad, format!("Bad dec entity: &{};", body)));
    }

    if let Some(resolve) = resolver {
        if let Some(resolved) = resolve(body) {
            return Ok(Cow::Owned(resolved));
        }
    }

    // No DTD: unknown named entities are rejected
    Err((ErrorCode::EntityUnknown, format!("Unknown entity: &{};", body)))
}

/// Parse the digits of a character reference into a valid scalar value.
///
/// Rejects empty digit runs, signs, overflow, surrogates and values above
/// U+10FFFF.
fn parse_char_ref(digits: &str, radix: u32) -> Option<char> {
    if digits.is_empty() || !digits.bytes().all(|b| (b as char).is_digit(radix)) {
        return None;
    }
    let cp = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(cp)
}
