// Scenario data model
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

//! In-memory representation of a SIPp scenario.
//!
//! A [`Scenario`] is an ordered list of call-flow [`Step`]s together with
//!   some opaque statistics metadata.
//! It is produced by the [decoder](crate::decode),
//!   may be freely edited,
//!   and is consumed by the [encoder](crate::encode);
//!     it is the only interface between the two.
//!
//! Steps are a tagged variant:
//!   a [`StepKind`] discriminant together with an attribute bag
//!   ([`Attrs`]),
//!     rather than a type per kind.
//! The dialect defines many optional attributes per kind,
//!   none of which the codec needs to interpret,
//!   so all of them are carried as strings in document order.

use std::fmt::Display;
use std::str::FromStr;

/// Name given to a decoded scenario lacking a `name` attribute.
pub const UNNAMED_SCENARIO: &str = "Unnamed Scenario";

/// A complete scenario document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,

    /// Steps in call-flow execution order.
    pub steps: Vec<Step>,

    /// Raw `ResponseTimeRepartition` bucket list.
    pub response_time_repartition: Option<String>,

    /// Raw `CallLengthRepartition` bucket list.
    pub call_length_repartition: Option<String>,

    /// Variable identifiers of each `Reference` marker.
    pub references: Vec<String>,
}

impl Scenario {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a step to the end of the call flow.
    pub fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Insert a step at `index`,
    ///   shifting all steps after it.
    ///
    /// An `index` past the end appends.
    pub fn insert_step(&mut self, index: usize, step: Step) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, step);
    }

    /// Remove and return the step at `index`,
    ///   if it exists.
    pub fn remove_step(&mut self, index: usize) -> Option<Step> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    /// Move the step at `from` so that it ends up at index `to`,
    ///   preserving the relative order of all other steps.
    ///
    /// Returns `false` without modification if either index is out of
    ///   bounds.
    pub fn move_step(&mut self, from: usize, to: usize) -> bool {
        let len = self.steps.len();

        if from >= len || to >= len {
            return false;
        }

        let step = self.steps.remove(from);
        self.steps.insert(to, step);

        true
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }
}

/// Kind of call-flow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Send,
    Recv,
    Pause,
    Nop,
    SendCmd,
    RecvCmd,
    Label,
    Timewait,
}

impl StepKind {
    /// Every step kind in vocabulary order.
    pub const ALL: [StepKind; 8] = [
        Self::Send,
        Self::Recv,
        Self::Pause,
        Self::Nop,
        Self::SendCmd,
        Self::RecvCmd,
        Self::Label,
        Self::Timewait,
    ];

    /// Canonical tag name.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Recv => "recv",
            Self::Pause => "pause",
            Self::Nop => "nop",
            Self::SendCmd => "sendCmd",
            Self::RecvCmd => "recvCmd",
            Self::Label => "label",
            Self::Timewait => "timewait",
        }
    }

    /// Look up a kind by tag name,
    ///   ignoring ASCII case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }

    /// Whether steps of this kind may carry an `<action>` block.
    pub fn carries_actions(self) -> bool {
        match self {
            Self::Send
            | Self::SendCmd
            | Self::Recv
            | Self::RecvCmd
            | Self::Nop => true,
            Self::Pause | Self::Label | Self::Timewait => false,
        }
    }
}

impl Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A tag name is not a step kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStepKind(pub String);

impl Display for UnknownStepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown step kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownStepKind {}

impl FromStr for StepKind {
    type Err = UnknownStepKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownStepKind(s.to_owned()))
    }
}

/// One call-flow instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub attrs: Attrs,

    /// Literal content of the step,
    ///   typically a SIP message template.
    pub payload: Option<String>,

    /// Directives executed after the step;
    ///   always empty for kinds that do not
    ///   [carry actions](StepKind::carries_actions).
    pub actions: Vec<Action>,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            attrs: Attrs::default(),
            payload: None,
            actions: Vec::new(),
        }
    }

    pub fn with_attr<K: Into<String>, V: Into<String>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.attrs.set(key, value);
        self
    }

    pub fn with_payload<P: Into<String>>(mut self, payload: P) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Shorthand for looking up an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key)
    }
}

/// A post-step directive such as `ereg`,
///   `log`,
///   or `exec`.
///
/// The vocabulary is open:
///   any kind is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: String,
    pub attrs: Attrs,
}

impl Action {
    pub fn new<K: Into<String>>(kind: K) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::default(),
        }
    }

    pub fn with_attr<K: Into<String>, V: Into<String>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.attrs.set(key, value);
        self
    }
}

/// Insertion-ordered mapping of attribute names to values.
///
/// Keys are unique.
/// Order is significant to output and is never sorted;
///   replacing the value of an existing key keeps its position.
///
/// Attribute lists are short,
///   so this is a simple association list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(Vec<(String, String)>);

impl Attrs {
    /// Set `key` to `value`,
    ///   returning the previous value if `key` was already present.
    pub fn set<K: Into<String>, V: Into<String>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<String> {
        let key = key.into();
        let value = value.into();

        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`,
    ///   returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    /// Key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Attrs {
    /// Later duplicate keys replace earlier values in place.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::default();
        attrs.extend(iter);
        attrs
    }
}

// Independent scenarios may be encoded and decoded in parallel.
assert_impl_all!(Scenario: Send, Sync, Clone);
