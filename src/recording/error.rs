// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with recordings and sortings.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Segment index {segment_index} is out of range; there are {num_segments} segments")]
    SegmentOutOfRange {
        segment_index: usize,
        num_segments: usize,
    },

    #[error("Segment {segment_index} has {got} channels, but there are {expected} channel IDs")]
    ChannelCount {
        segment_index: usize,
        expected: usize,
        got: usize,
    },

    #[error("Cannot get traces for frames {start}..{end}; segment {segment_index} has {num_samples} samples")]
    FrameRange {
        segment_index: usize,
        start: usize,
        end: usize,
        num_samples: usize,
    },

    #[error("Spike unit index {unit_index} is out of range; there are {num_units} units")]
    UnitIndex { unit_index: usize, num_units: usize },

    #[error("The spike at sample {sample_index} (segment {segment_index}) is too close to the edge of the segment ({num_samples} samples) for a {nbefore}+{nafter} sample window")]
    SpikeWindow {
        sample_index: usize,
        segment_index: usize,
        num_samples: usize,
        nbefore: usize,
        nafter: usize,
    },
}
