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

//! Constants related to DNS messages.

/// The size of the fixed message header.
pub const HEADER_SIZE: usize = 12;

/// The largest message a UDP client without EDNS can receive, and the
/// smallest payload size an EDNS client may advertise.
pub const MIN_UDP_PAYLOAD_SIZE: usize = 512;

/// The largest message that fits the two-octet TCP length prefix.
pub const MAX_TCP_MESSAGE_SIZE: usize = u16::MAX as usize;

// Offsets of the header fields.
pub const ID_OFFSET: usize = 0;
pub const FLAGS_OFFSET: usize = 2;
pub const QDCOUNT_OFFSET: usize = 4;
pub const ANCOUNT_OFFSET: usize = 6;
pub const NSCOUNT_OFFSET: usize = 8;
pub const ARCOUNT_OFFSET: usize = 10;

// Masks over the 16-bit flags field.
pub const QR_FLAG: u16 = 0x8000;
pub const OPCODE_MASK: u16 = 0x7800;
pub const OPCODE_SHIFT: u32 = 11;
pub const AA_FLAG: u16 = 0x0400;
pub const TC_FLAG: u16 = 0x0200;
pub const RD_FLAG: u16 = 0x0100;
pub const RA_FLAG: u16 = 0x0080;
pub const RCODE_MASK: u16 = 0x000f;

/// Compression pointers hold a 14-bit offset.
pub const MAX_POINTER: usize = 0x3fff;
