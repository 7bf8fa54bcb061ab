// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of parsing and validation of on-the-wire names.

use arrayvec::ArrayVec;

use super::{Error, Name, MAX_LABEL_LEN, MAX_WIRE_LEN};

////////////////////////////////////////////////////////////////////////
// UNCOMPRESSED NAMES                                                 //
////////////////////////////////////////////////////////////////////////

/// Validates an uncompressed name at the beginning of `octets` and
/// returns its length on the wire.
pub fn validate_uncompressed_name(octets: &[u8]) -> Result<usize, Error> {
    let mut offset = 0;
    loop {
        let len = *octets.get(offset).ok_or(Error::UnexpectedEom)? as usize;
        if len > MAX_LABEL_LEN {
            return Err(if len & 0xc0 == 0xc0 {
                Error::InvalidPointer
            } else {
                Error::LabelTooLong
            });
        }
        offset += len + 1;
        if offset > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        } else if len == 0 {
            return Ok(offset);
        } else if offset > octets.len() {
            return Err(Error::UnexpectedEom);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// COMPRESSED NAMES                                                   //
////////////////////////////////////////////////////////////////////////

/// Parses a compressed name starting at index `start` of `message`.
/// Pointers are indices into `message`, so the whole DNS message must
/// be passed. Per [RFC 1035 § 4.1.4], a pointer must refer to a prior
/// occurrence of a name; we require each pointer to point before the
/// start of the chunk of labels containing it, which also rules out
/// loops.
///
/// [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
pub fn parse_compressed_name(message: &[u8], start: usize) -> Result<(Name, usize), Error> {
    let mut wire = ArrayVec::<u8, MAX_WIRE_LEN>::new();
    let mut chunk_start = start;
    let mut index = start;
    let mut len_at_start = None;

    loop {
        let len = *message.get(index).ok_or(Error::UnexpectedEom)?;
        match len & 0xc0 {
            0xc0 => {
                let low = *message.get(index + 1).ok_or(Error::UnexpectedEom)?;
                let pointer = u16::from_be_bytes([len & 0x3f, low]) as usize;
                if pointer >= chunk_start {
                    return Err(Error::InvalidPointer);
                }
                len_at_start.get_or_insert_with(|| index + 2 - start);
                chunk_start = pointer;
                index = pointer;
            }
            0x00 => {
                let end = index + 1 + len as usize;
                let label = message.get(index..end).ok_or(Error::UnexpectedEom)?;
                wire.try_extend_from_slice(label)
                    .or(Err(Error::NameTooLong))?;
                if len == 0 {
                    len_at_start.get_or_insert_with(|| end - start);
                    break;
                }
                index = end;
            }
            _ => return Err(Error::InvalidLabelType),
        }
    }

    // The length is always set before breaking out of the loop.
    let len = len_at_start.unwrap_or_default();
    Ok((Name::from_valid_wire(&wire), len))
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
