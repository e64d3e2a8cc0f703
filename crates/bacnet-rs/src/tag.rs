// crates/bacnet-rs/src/tag.rs
//! BACnet tag header encode/decode (ASHRAE 135 §20.2.1.3).
//!
//! The tag header is the universal prefix on every encoded value: one octet carrying
//! the tag number, the application/context class bit, and a length/value/type (LVT)
//! field, optionally followed by an extended tag-number octet and/or an extended
//! length.

use crate::hal::BacnetError;

/// Tag number threshold above which the true number is carried in an extra octet.
pub const TAG_NUMBER_EXTENDED: u8 = 15;
/// LVT value signalling that the real length follows in one or more extra octets.
const LVT_EXTENDED_LENGTH: u8 = 5;
/// LVT value (context class only) signalling an opening construct tag.
const LVT_OPENING: u8 = 6;
/// LVT value (context class only) signalling a closing construct tag.
const LVT_CLOSING: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Application,
    Context,
}

/// A decoded tag header (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub number: u32,
    pub class: TagClass,
    pub lvt_is_opening: bool,
    pub lvt_is_closing: bool,
    /// For a data tag, the length (in octets) of the value that follows.
    /// For an opening/closing tag this is meaningless (always 0).
    pub length_value: u32,
}

impl TagHeader {
    pub fn is_opening(&self) -> bool {
        self.lvt_is_opening
    }

    pub fn is_closing(&self) -> bool {
        self.lvt_is_closing
    }

    /// Does this tag (of either class) match `number` and is a plain data tag?
    pub fn is_data(&self) -> bool {
        !self.lvt_is_opening && !self.lvt_is_closing
    }
}

/// Writes the minimum-length encoding of a data tag (`number`/`class`/`length`) into
/// `buffer`. Returns the number of octets written, or `Err` if `buffer` is too short.
/// Passing an empty buffer (len 0) is a valid dry-run sizing call (§8 property 2):
/// the function still computes and returns the would-be length without writing,
/// provided `buffer` is at least that long is NOT required for sizing — callers that
/// want dry-run sizing with a zero-length slice should use [`tag_encoded_len`].
pub fn encode_tag(
    buffer: &mut [u8],
    number: u32,
    class: TagClass,
    length: u32,
) -> Result<usize, BacnetError> {
    encode_tag_inner(buffer, number, class, length, false, false)
}

pub fn encode_opening_tag(buffer: &mut [u8], number: u32) -> Result<usize, BacnetError> {
    encode_tag_inner(buffer, number, TagClass::Context, 0, true, false)
}

pub fn encode_closing_tag(buffer: &mut [u8], number: u32) -> Result<usize, BacnetError> {
    encode_tag_inner(buffer, number, TagClass::Context, 0, false, true)
}

/// Computes the encoded length of a data tag header without writing anything (§8
/// property 2, dry-run sizing).
pub fn tag_encoded_len(number: u32, length: u32) -> usize {
    let mut len = 1;
    if number >= TAG_NUMBER_EXTENDED as u32 {
        len += 1;
    }
    if length >= LVT_EXTENDED_LENGTH as u32 {
        len += if length <= 253 {
            1
        } else if length <= 0xFFFF {
            3
        } else {
            5
        };
    }
    len
}

fn encode_tag_inner(
    buffer: &mut [u8],
    number: u32,
    class: TagClass,
    length: u32,
    opening: bool,
    closing: bool,
) -> Result<usize, BacnetError> {
    let extended_number = number >= TAG_NUMBER_EXTENDED as u32;
    let lvt: u8 = if opening {
        LVT_OPENING
    } else if closing {
        LVT_CLOSING
    } else if length >= LVT_EXTENDED_LENGTH as u32 {
        LVT_EXTENDED_LENGTH
    } else {
        length as u8
    };

    let needed = tag_encoded_len(number, if opening || closing { 0 } else { length });
    if buffer.len() < needed {
        return Err(BacnetError::BufferTooShort);
    }

    let number_field = if extended_number {
        TAG_NUMBER_EXTENDED
    } else {
        number as u8
    };
    let class_bit = match class {
        TagClass::Application => 0u8,
        TagClass::Context => 0x08,
    };
    buffer[0] = (number_field << 4) | class_bit | (lvt & 0x07);

    let mut idx = 1;
    if extended_number {
        buffer[idx] = number as u8;
        idx += 1;
    }

    if !opening && !closing && length >= LVT_EXTENDED_LENGTH as u32 {
        if length <= 253 {
            buffer[idx] = length as u8;
            idx += 1;
        } else if length <= 0xFFFF {
            buffer[idx] = 254;
            buffer[idx + 1..idx + 3].copy_from_slice(&(length as u16).to_be_bytes());
            idx += 3;
        } else {
            buffer[idx] = 255;
            buffer[idx + 1..idx + 5].copy_from_slice(&length.to_be_bytes());
            idx += 5;
        }
    }

    Ok(idx)
}

/// Decodes a tag header from the front of `buffer`. Returns the header and the number
/// of octets consumed. Never reads past `buffer`'s declared length (§8 property 3).
pub fn decode_tag(buffer: &[u8]) -> Result<(TagHeader, usize), BacnetError> {
    if buffer.is_empty() {
        return Err(BacnetError::BufferTooShort);
    }
    let first = buffer[0];
    let mut number = (first >> 4) as u32;
    let class = if first & 0x08 != 0 {
        TagClass::Context
    } else {
        TagClass::Application
    };
    let lvt = first & 0x07;

    let mut idx = 1;
    if number == TAG_NUMBER_EXTENDED as u32 {
        if buffer.len() < idx + 1 {
            return Err(BacnetError::BufferTooShort);
        }
        number = buffer[idx] as u32;
        idx += 1;
    }

    let (opening, closing, length_value) = match lvt {
        LVT_OPENING => (true, false, 0),
        LVT_CLOSING => (false, true, 0),
        LVT_EXTENDED_LENGTH => {
            if buffer.len() < idx + 1 {
                return Err(BacnetError::BufferTooShort);
            }
            let marker = buffer[idx];
            idx += 1;
            let length = if marker == 254 {
                if buffer.len() < idx + 2 {
                    return Err(BacnetError::BufferTooShort);
                }
                let v = u16::from_be_bytes([buffer[idx], buffer[idx + 1]]) as u32;
                idx += 2;
                v
            } else if marker == 255 {
                if buffer.len() < idx + 4 {
                    return Err(BacnetError::BufferTooShort);
                }
                let v = u32::from_be_bytes([
                    buffer[idx],
                    buffer[idx + 1],
                    buffer[idx + 2],
                    buffer[idx + 3],
                ]);
                idx += 4;
                v
            } else {
                marker as u32
            };
            (false, false, length)
        }
        n => (false, false, n as u32),
    };

    Ok((
        TagHeader {
            number,
            class,
            lvt_is_opening: opening,
            lvt_is_closing: closing,
            length_value,
        },
        idx,
    ))
}
