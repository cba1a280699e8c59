//! Session: the collaborator handles and id counter shared by all operations.

use crate::core::clip::Clip;
use crate::core::collab::Collaborators;
use crate::core::error::TileResult;
use crate::core::geometry::Margins;
use crate::spatial::{self, AutofillOptions, CropMargins, ModPadding, PadMode, TileSpec, UntileOptions};
use crate::temporal::dups::{self, DupHandle};
use crate::temporal::{self, TemporalExtent, TemporalPadMode, TrimSpec, UnwindowOptions, WindowSpec};
use std::sync::atomic::{AtomicU64, Ordering};

/// Entry point bundling the configured collaborators.
///
/// Operations that need no collaborator are also available as free
/// functions in [`crate::spatial`] and [`crate::temporal`].
#[derive(Debug)]
pub struct Session {
    collaborators: Collaborators,
    next_dup_id: AtomicU64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Collaborators::new())
    }
}

impl Session {
    /// Create a session using `collaborators`.
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            next_dup_id: AtomicU64::new(1),
        }
    }

    /// Configured collaborators.
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// See [`spatial::pad`].
    pub fn pad(&self, clip: &Clip, margins: Margins, mode: &PadMode) -> TileResult<Clip> {
        spatial::pad(clip, margins, mode, &self.collaborators)
    }

    /// See [`spatial::crop`].
    pub fn crop(&self, clip: &Clip, margins: CropMargins) -> TileResult<Clip> {
        spatial::crop(clip, margins)
    }

    /// See [`spatial::align_to_modulus`].
    pub fn align_to_modulus(&self, clip: &Clip, modulus: (u32, u32), padding: &ModPadding) -> TileResult<Clip> {
        spatial::align_to_modulus(clip, modulus, padding, &self.collaborators)
    }

    /// See [`spatial::tile`].
    pub fn tile(&self, clip: &Clip, spec: &TileSpec) -> TileResult<Clip> {
        spatial::tile(clip, spec, &self.collaborators)
    }

    /// See [`spatial::untile`].
    pub fn untile(&self, clip: &Clip, options: &UntileOptions) -> TileResult<Clip> {
        spatial::untile(clip, options)
    }

    /// See [`spatial::autofill`].
    pub fn autofill(&self, clip: &Clip, options: &AutofillOptions) -> TileResult<Clip> {
        spatial::autofill(clip, options, &self.collaborators)
    }

    /// See [`spatial::crop_random`].
    pub fn crop_random(&self, clip: &Clip, width: u32, height: u32, seed: u64) -> TileResult<Clip> {
        spatial::crop_random(clip, width, height, seed)
    }

    /// See [`temporal::tpad`].
    pub fn tpad(&self, clip: &Clip, extent: TemporalExtent, mode: &TemporalPadMode) -> TileResult<Clip> {
        temporal::tpad(clip, extent, mode)
    }

    /// See [`temporal::trim`].
    pub fn trim(&self, clip: &Clip, spec: TrimSpec) -> TileResult<Clip> {
        temporal::trim(clip, spec)
    }

    /// See [`temporal::window`].
    pub fn window(&self, clip: &Clip, spec: &WindowSpec) -> TileResult<Clip> {
        temporal::window(clip, spec)
    }

    /// See [`temporal::unwindow`].
    pub fn unwindow(&self, clip: &Clip, options: &UnwindowOptions) -> TileResult<Clip> {
        temporal::unwindow(clip, options)
    }

    /// See [`temporal::crossfade`].
    pub fn crossfade(&self, a: &Clip, b: &Clip, length: usize) -> TileResult<Clip> {
        temporal::crossfade(a, b, length)
    }

    /// Mark near-duplicate frames through the frame difference collaborator.
    ///
    /// Pass the returned handle to [`Session::skip_dups`] together with the
    /// processed clip. Every call gets a fresh handle id.
    pub fn mark_dups(&self, clip: &Clip, thresh: f64) -> TileResult<(Clip, DupHandle)> {
        let diff = self.collaborators.frame_diff()?;
        let id = self.next_dup_id.fetch_add(1, Ordering::Relaxed);
        dups::mark_dups(clip, thresh, diff, id)
    }

    /// See [`temporal::skip_dups`].
    pub fn skip_dups(&self, processed: &Clip, handle: &DupHandle) -> TileResult<Clip> {
        temporal::skip_dups(processed, handle)
    }
}
