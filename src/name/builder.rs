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

//! Implementation of the [`NameBuilder`] structure.

use arrayvec::ArrayVec;

use super::{Error, Name, MAX_LABEL_LEN, MAX_WIRE_LEN};

/// Builds a [`Name`] one octet at a time, as when reading text.
///
/// The builder starts out with one empty label. Octets are appended to
/// the current label with [`NameBuilder::try_push`], and
/// [`NameBuilder::next_label`] closes the current label (the textual
/// `.`). A builder whose last action was `next_label` holds a fully
/// qualified name; otherwise the name is relative and can only be
/// completed with [`NameBuilder::finish_with_suffix`].
///
/// ```
/// use geozone::name::{Name, NameBuilder};
/// let mut builder = NameBuilder::new();
/// builder.try_push_slice(b"www").unwrap();
/// let origin: Name = "example.com.".parse().unwrap();
/// assert_eq!(
///     builder.finish_with_suffix(&origin).unwrap(),
///     "www.example.com.".parse().unwrap(),
/// );
/// ```
pub struct NameBuilder {
    wire: ArrayVec<u8, MAX_WIRE_LEN>,
    label_start: usize,
}

impl NameBuilder {
    /// Creates a builder holding a single empty label.
    pub fn new() -> Self {
        let mut wire = ArrayVec::new();
        wire.push(0);
        Self {
            wire,
            label_start: 0,
        }
    }

    fn current_label_len(&self) -> usize {
        self.wire[self.label_start] as usize
    }

    /// Appends an octet to the current label.
    pub fn try_push(&mut self, octet: u8) -> Result<(), Error> {
        if self.current_label_len() == MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else {
            self.wire.try_push(octet).or(Err(Error::NameTooLong))?;
            self.wire[self.label_start] += 1;
            Ok(())
        }
    }

    /// Appends each octet of `octets` to the current label.
    pub fn try_push_slice(&mut self, octets: &[u8]) -> Result<(), Error> {
        octets.iter().try_for_each(|&octet| self.try_push(octet))
    }

    /// Ends the current label and starts a new, empty one.
    pub fn next_label(&mut self) -> Result<(), Error> {
        if self.current_label_len() == 0 {
            Err(Error::NullNonTerminal)
        } else {
            self.wire.try_push(0).or(Err(Error::NameTooLong))?;
            self.label_start = self.wire.len() - 1;
            Ok(())
        }
    }

    /// Returns whether the name built so far is fully qualified, i.e.
    /// whether the current label is empty.
    pub fn is_fully_qualified(&self) -> bool {
        self.current_label_len() == 0
    }

    /// Finishes a fully qualified name.
    pub fn finish(self) -> Result<Name, Error> {
        if self.is_fully_qualified() {
            Ok(Name::from_valid_wire(&self.wire))
        } else {
            Err(Error::NotFullyQualified)
        }
    }

    /// Finishes the name, appending `suffix` if the name is relative.
    pub fn finish_with_suffix(self, suffix: &Name) -> Result<Name, Error> {
        if self.is_fully_qualified() {
            return self.finish();
        }
        let len = self.wire.len() + suffix.wire_repr().len();
        if len > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
        let mut wire = Vec::with_capacity(len);
        wire.extend_from_slice(&self.wire);
        wire.extend_from_slice(suffix.wire_repr());
        Ok(Name::from_valid_wire(&wire))
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
