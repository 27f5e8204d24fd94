// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-command region classification of recordings.
//!
//! Analysing a recording once lets later replays pick out only the commands
//! that are drawn natively, or only those that need a fallback image. A
//! [`RegionArray`] holds one [`RegionElement`] per recorded command; a
//! [`RegionStore`] owns the arrays for every recording analysed on a page,
//! including recordings nested inside patterns.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{Outcome, RecordingId, RecordingSurface};

/// Handle to a [`RegionArray`] inside a [`RegionStore`].
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

/// How a recorded command is drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RecordingRegion {
    /// Not classified yet; every replay includes it.
    #[default]
    All,
    /// Drawn natively by the target.
    Native,
    /// Drawn into a fallback image.
    ImageFallback,
}

impl RecordingRegion {
    /// Region for a command that analysis classified as `outcome`.
    pub fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success | Outcome::NothingToDo | Outcome::AnalyzeRecordingPattern => {
                Self::Native
            }
            Outcome::Unsupported | Outcome::ImageFallback | Outcome::FlattenTransparency => {
                Self::ImageFallback
            }
        }
    }
}

/// Classification of one recorded command.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegionElement {
    /// How the command is drawn.
    pub region: RecordingRegion,
    /// Region array of the recording used as the command's source.
    pub source_id: Option<RegionId>,
    /// Region array of the recording used as the command's mask.
    pub mask_id: Option<RegionId>,
}

/// Classifications for every command of one recording.
#[derive(Clone, Debug)]
pub struct RegionArray {
    recording: RecordingId,
    elements: Vec<RegionElement>,
}

impl RegionArray {
    /// The recording this array describes.
    pub fn recording(&self) -> RecordingId {
        self.recording
    }

    /// One element per recorded command, in recording order.
    pub fn elements(&self) -> &[RegionElement] {
        &self.elements
    }

    /// Element for command `index`, or the default if out of range.
    pub fn element(&self, index: usize) -> RegionElement {
        self.elements.get(index).copied().unwrap_or_default()
    }

    /// Stores the classification of command `index`.
    pub fn set(&mut self, index: usize, element: RegionElement) {
        if let Some(slot) = self.elements.get_mut(index) {
            *slot = element;
        }
    }

    /// Number of commands classified as `region`.
    pub fn count(&self, region: RecordingRegion) -> usize {
        self.elements.iter().filter(|e| e.region == region).count()
    }
}

/// Owner of the region arrays created while analysing a page.
#[derive(Clone, Debug, Default)]
pub struct RegionStore {
    arrays: HashMap<RegionId, RegionArray>,
    next_id: u32,
}

impl RegionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unclassified array for `recording` and returns its id.
    pub fn attach(&mut self, recording: &RecordingSurface) -> RegionId {
        self.next_id += 1;
        let id = RegionId(self.next_id);
        self.arrays.insert(
            id,
            RegionArray {
                recording: recording.id(),
                elements: alloc::vec![RegionElement::default(); recording.len()],
            },
        );
        id
    }

    /// Looks up an array.
    pub fn get(&self, id: RegionId) -> Option<&RegionArray> {
        self.arrays.get(&id)
    }

    /// Looks up an array for update.
    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut RegionArray> {
        self.arrays.get_mut(&id)
    }

    /// Drops an array.
    pub fn remove(&mut self, id: RegionId) -> Option<RegionArray> {
        self.arrays.remove(&id)
    }

    /// Number of live arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Returns `true` if no arrays are live.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Drops every array.
    pub fn clear(&mut self) {
        self.arrays.clear();
    }
}
