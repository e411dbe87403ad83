// Built-in scenario templates
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

//! Starting points for new scenarios.
//!
//! Each template is a complete scenario document embedded at compile
//!   time;
//!     a [`Scenario`] is obtained by decoding it like any other
//!     document.

use crate::decode::{self, decode};
use crate::scenario::Scenario;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// Empty scenario.
    Blank,
    /// Call initiator:
    ///   INVITE, await responses, ACK, BYE.
    Uac,
    /// Call responder:
    ///   await INVITE, answer, await BYE.
    Uas,
    /// A side of third party call control.
    ThreePcc,
    /// UAC playing PCAP audio and an out-of-band DTMF digit.
    Rtp,
    /// UAC negotiating SRTP crypto suites.
    Srtp,
}

impl Template {
    pub const ALL: [Template; 6] = [
        Self::Blank,
        Self::Uac,
        Self::Uas,
        Self::ThreePcc,
        Self::Rtp,
        Self::Srtp,
    ];

    /// Short identifier by which the template is selected.
    pub fn name(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Uac => "uac",
            Self::Uas => "uas",
            Self::ThreePcc => "3pcc",
            Self::Rtp => "rtp",
            Self::Srtp => "srtp",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Blank => "Empty scenario template",
            Self::Uac => {
                "Basic SIP call initiator: sends INVITE, receives responses, \
                 sends BYE"
            }
            Self::Uas => {
                "Basic SIP call responder: receives INVITE, sends responses, \
                 waits for BYE"
            }
            Self::ThreePcc => {
                "Controller initiates call without SDP, receives offer, \
                 sends to B-side"
            }
            Self::Rtp => "UAC with PCAP audio playback and DTMF support",
            Self::Srtp => {
                "UAC with SRTP crypto negotiation and encrypted media stream"
            }
        }
    }

    /// Source document of the template.
    pub fn xml(self) -> &'static str {
        match self {
            Self::Blank => include_str!("templates/blank.xml"),
            Self::Uac => include_str!("templates/uac.xml"),
            Self::Uas => include_str!("templates/uas.xml"),
            Self::ThreePcc => include_str!("templates/3pcc.xml"),
            Self::Rtp => include_str!("templates/rtp.xml"),
            Self::Srtp => include_str!("templates/srtp.xml"),
        }
    }

    /// Decode the template into a new [`Scenario`].
    pub fn scenario(self) -> Result<Scenario, decode::Error> {
        decode(self.xml())
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTemplate(pub String);

impl Display for UnknownTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown template `{}` (expected one of: ", self.0)?;

        for (i, template) in Template::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{template}")?;
        }

        f.write_str(")")
    }
}

impl std::error::Error for UnknownTemplate {}

impl FromStr for Template {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|template| template.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTemplate(s.to_owned()))
    }
}
