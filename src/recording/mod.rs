// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recordings, sortings, and the tools needed to get templates out of them
//! without a [`crate::SortingResult`].

mod average;
mod error;
mod selection;
mod sorting;

pub use average::estimate_templates_average;
pub use error::RecordingError;
pub use selection::random_spikes_selection;
pub use sorting::{Sorting, Spike};

use log::trace;
use ndarray::prelude::*;

use crate::{Id, Probe};

/// A multi-channel, possibly multi-segment extracellular recording.
///
/// Traces are read on demand, so implementors may be backed by files.
pub trait Recording: Sync {
    /// \[Hz\]
    fn sampling_frequency(&self) -> f64;

    fn channel_ids(&self) -> &[Id];

    fn num_segments(&self) -> usize;

    fn num_samples(&self, segment_index: usize) -> Result<usize, RecordingError>;

    /// The probes the channels belong to. Sparsity by radius can only be
    /// estimated when there's exactly one.
    fn probes(&self) -> &[Probe];

    /// Get traces with dimensions (end_frame - start_frame, num_channels).
    fn get_traces(
        &self,
        segment_index: usize,
        start_frame: usize,
        end_frame: usize,
    ) -> Result<Array2<f64>, RecordingError>;

    fn num_channels(&self) -> usize {
        self.channel_ids().len()
    }

    /// The number of samples in every segment.
    fn all_num_samples(&self) -> Result<Vec<usize>, RecordingError> {
        (0..self.num_segments())
            .map(|i_segment| self.num_samples(i_segment))
            .collect()
    }
}

/// A [`Recording`] whose traces are all held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryRecording {
    /// \[Hz\]
    sampling_frequency: f64,

    channel_ids: Vec<Id>,

    /// One array per segment, each with dimensions (num_samples,
    /// num_channels).
    segments: Vec<Array2<f64>>,

    probes: Vec<Probe>,
}

impl InMemoryRecording {
    pub fn new(
        sampling_frequency: f64,
        channel_ids: Vec<Id>,
        segments: Vec<Array2<f64>>,
    ) -> Result<InMemoryRecording, RecordingError> {
        for (segment_index, segment) in segments.iter().enumerate() {
            let got = segment.len_of(Axis(1));
            if got != channel_ids.len() {
                return Err(RecordingError::ChannelCount {
                    segment_index,
                    expected: channel_ids.len(),
                    got,
                });
            }
        }
        Ok(InMemoryRecording {
            sampling_frequency,
            channel_ids,
            segments,
            probes: vec![],
        })
    }

    pub fn with_probes(mut self, probes: Vec<Probe>) -> InMemoryRecording {
        self.probes = probes;
        self
    }

    fn segment(&self, segment_index: usize) -> Result<&Array2<f64>, RecordingError> {
        self.segments
            .get(segment_index)
            .ok_or(RecordingError::SegmentOutOfRange {
                segment_index,
                num_segments: self.segments.len(),
            })
    }
}

impl Recording for InMemoryRecording {
    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn channel_ids(&self) -> &[Id] {
        &self.channel_ids
    }

    fn num_segments(&self) -> usize {
        self.segments.len()
    }

    fn num_samples(&self, segment_index: usize) -> Result<usize, RecordingError> {
        Ok(self.segment(segment_index)?.len_of(Axis(0)))
    }

    fn probes(&self) -> &[Probe] {
        &self.probes
    }

    fn get_traces(
        &self,
        segment_index: usize,
        start_frame: usize,
        end_frame: usize,
    ) -> Result<Array2<f64>, RecordingError> {
        let segment = self.segment(segment_index)?;
        let num_samples = segment.len_of(Axis(0));
        if start_frame > end_frame || end_frame > num_samples {
            return Err(RecordingError::FrameRange {
                segment_index,
                start: start_frame,
                end: end_frame,
                num_samples,
            });
        }
        trace!("Reading frames {start_frame}..{end_frame} of segment {segment_index}");
        Ok(segment.slice(s![start_frame..end_frame, ..]).to_owned())
    }
}
