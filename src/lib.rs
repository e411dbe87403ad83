// SIPp scenario codec
//
//  Copyright (C) 2014-2023 Ryan Specialty Group, LLC.
//
//  This file is part of sippscn.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Bidirectional codec between SIPp XML scenario documents and an
//!   in-memory [`Scenario`].
//!
//! ```text
//!   text --[TreeBuilder]--> Element --[Decoder]--> Scenario
//!                                                     |
//!   text <-------------[Encoder]----------------------'
//! ```
//!
//! The [decoder](decode) is lenient in what it accepts
//!   (tags are matched without regard to case and unknown elements are
//!   ignored),
//!   while the [encoder](encode) produces a single canonical form that
//!     references `sipp.dtd`.
//! Decoding the output of the encoder yields the same scenario,
//!   including payloads byte-for-byte.
//!
//! XML itself is handled by the [`xml`] module;
//!   the codec never tokenizes text on its own.
//! [`dtd`] and [`templates`] are optional collaborators built on top of
//!   the codec.

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

#[macro_use]
extern crate static_assertions;

pub mod decode;
pub mod dtd;
pub mod encode;
pub mod scenario;
pub mod templates;
pub mod xml;

pub use decode::{decode, Decoder};
pub use encode::{encode, Encoder};
pub use scenario::{Action, Attrs, Scenario, Step, StepKind};
