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

//! Provides the [`Class`] structure for DNS classes.

use std::fmt;
use std::str::FromStr;

use crate::util::{parse_generic_mnemonic, Caseless};

/// A DNS class. Zones served by this crate are always [`Class::IN`],
/// but other values must still be representable since they show up in
/// queries and in zone files.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Class(u16);

impl Class {
    pub const IN: Self = Self(1);
    pub const CH: Self = Self(3);
    pub const HS: Self = Self(4);

    const MNEMONICS: [(Self, &'static str); 3] = [(Self::IN, "IN"), (Self::CH, "CH"), (Self::HS, "HS")];
}

impl From<u16> for Class {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        class.0
    }
}

impl FromStr for Class {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some((class, _)) = Self::MNEMONICS
            .iter()
            .find(|(_, mnemonic)| Caseless(mnemonic) == Caseless(text))
        {
            return Ok(*class);
        }
        match parse_generic_mnemonic(text, "CLASS") {
            Some(Ok(value)) => Ok(Self(value)),
            Some(Err(())) => Err("class value is not a valid unsigned 16-bit integer"),
            None => Err("unknown class"),
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match Self::MNEMONICS.iter().find(|(class, _)| class == self) {
            Some((_, mnemonic)) => f.write_str(mnemonic),
            None => write!(f, "CLASS{}", self.0), // RFC 3597 § 5
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
