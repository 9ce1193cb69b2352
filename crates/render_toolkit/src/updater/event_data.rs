//! Per-tick event scratch data
//!
//! One [`EventData`] lives for exactly one updater tick. Events write what
//! they observed into it; recreation reads it to adapt geometry. Because it
//! is rebuilt empty every tick, recreation can never see stale values from
//! an earlier tick.

use ash::vk;

use crate::foundation::FrameId;
use crate::render::resources::{
    ComputePipelineHandle, GraphicsPipelineHandle, ImageHandle, ImageViewHandle,
    RayTracingPipelineHandle,
};

/// One recorded extent transition
#[derive(Debug, Clone, Copy)]
pub struct OldNewExtent {
    /// Extent before this tick's resize
    pub old: vk::Extent2D,
    /// Extent after this tick's resize
    pub new: vk::Extent2D,
}

/// Data gathered by events during one tick, consumed by recreation
#[derive(Debug, Default)]
pub struct EventData {
    extents: Vec<OldNewExtent>,
    swapchain_extent: Option<vk::Extent2D>,
    swapchain_format: Option<vk::Format>,
    frames_in_flight: Option<FrameId>,
    attachment_count: Option<usize>,

    pub(crate) graphics_pipelines_to_destroy: Vec<GraphicsPipelineHandle>,
    pub(crate) compute_pipelines_to_destroy: Vec<ComputePipelineHandle>,
    pub(crate) ray_tracing_pipelines_to_destroy: Vec<RayTracingPipelineHandle>,
    pub(crate) images_to_destroy: Vec<ImageHandle>,
    pub(crate) image_views_to_destroy: Vec<ImageViewHandle>,
}

impl EventData {
    /// Record that `old` became `new` during this tick's resize.
    ///
    /// If a transition for `old` was already recorded, it is overwritten.
    pub(crate) fn record_extent_change(&mut self, old: vk::Extent2D, new: vk::Extent2D) {
        if let Some(entry) = self.find_old_extent_mut(old) {
            entry.new = new;
        } else {
            self.extents.push(OldNewExtent { old, new });
        }
    }

    /// Record the extent the whole swapchain now has (wholesale recreation)
    pub(crate) fn set_swapchain_extent(&mut self, extent: vk::Extent2D) {
        self.swapchain_extent = Some(extent);
    }

    /// Record the format the swapchain images now have
    pub(crate) fn set_swapchain_format(&mut self, format: vk::Format) {
        self.swapchain_format = Some(format);
    }

    /// Record the new frames-in-flight count
    pub(crate) fn set_frames_in_flight(&mut self, frames: FrameId) {
        self.frames_in_flight = Some(frames);
    }

    /// Record the new additional-attachment count
    pub(crate) fn set_attachment_count(&mut self, count: usize) {
        self.attachment_count = Some(count);
    }

    /// Map an extent through this tick's resize.
    ///
    /// Returns the recorded transition target for `old` if one exists,
    /// otherwise the wholesale swapchain extent if one was published this
    /// tick, otherwise `old` unchanged.
    pub fn extent_for_old(&self, old: vk::Extent2D) -> vk::Extent2D {
        if let Some(entry) = self.find_old_extent(old) {
            return entry.new;
        }
        self.swapchain_extent.unwrap_or(old)
    }

    /// Map a float width/height pair through this tick's resize.
    ///
    /// Viewport dimensions are floats; they are matched against recorded
    /// integer extents within machine epsilon.
    pub fn extent_for_old_f32(&self, old_width: f32, old_height: f32) -> (f32, f32) {
        let matches = |entry: &OldNewExtent| {
            (old_width - entry.old.width as f32).abs() <= f32::EPSILON
                && (old_height - entry.old.height as f32).abs() <= f32::EPSILON
        };
        if let Some(entry) = self.extents.iter().find(|e| matches(e)) {
            return (entry.new.width as f32, entry.new.height as f32);
        }
        if let Some(extent) = self.swapchain_extent {
            return (extent.width as f32, extent.height as f32);
        }
        (old_width, old_height)
    }

    /// Format published by a format-changed event this tick, if any
    pub fn swapchain_format(&self) -> Option<vk::Format> {
        self.swapchain_format
    }

    /// Frames-in-flight count published this tick, if any
    pub fn frames_in_flight(&self) -> Option<FrameId> {
        self.frames_in_flight
    }

    /// Additional-attachment count published this tick, if any
    pub fn attachment_count(&self) -> Option<usize> {
        self.attachment_count
    }

    /// Graphics pipelines the application asked to destroy this tick
    pub fn graphics_pipelines_to_destroy(&self) -> &[GraphicsPipelineHandle] {
        &self.graphics_pipelines_to_destroy
    }

    /// Compute pipelines the application asked to destroy this tick
    pub fn compute_pipelines_to_destroy(&self) -> &[ComputePipelineHandle] {
        &self.compute_pipelines_to_destroy
    }

    /// Ray tracing pipelines the application asked to destroy this tick
    pub fn ray_tracing_pipelines_to_destroy(&self) -> &[RayTracingPipelineHandle] {
        &self.ray_tracing_pipelines_to_destroy
    }

    /// Images the application asked to destroy this tick
    pub fn images_to_destroy(&self) -> &[ImageHandle] {
        &self.images_to_destroy
    }

    /// Image views the application asked to destroy this tick
    pub fn image_views_to_destroy(&self) -> &[ImageViewHandle] {
        &self.image_views_to_destroy
    }

    fn find_old_extent(&self, old: vk::Extent2D) -> Option<&OldNewExtent> {
        self.extents
            .iter()
            .find(|e| e.old.width == old.width && e.old.height == old.height)
    }

    fn find_old_extent_mut(&mut self, old: vk::Extent2D) -> Option<&mut OldNewExtent> {
        self.extents
            .iter_mut()
            .find(|e| e.old.width == old.width && e.old.height == old.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    #[test]
    fn test_identity_when_nothing_fired() {
        let data = EventData::default();
        let mapped = data.extent_for_old(extent(640, 480));
        assert_eq!(mapped.width, 640);
        assert_eq!(mapped.height, 480);

        let (w, h) = data.extent_for_old_f32(640.0, 480.0);
        assert_relative_eq!(w, 640.0);
        assert_relative_eq!(h, 480.0);
    }

    #[test]
    fn test_recorded_transition_is_applied() {
        let mut data = EventData::default();
        data.record_extent_change(extent(640, 480), extent(800, 600));

        let mapped = data.extent_for_old(extent(640, 480));
        assert_eq!(mapped.width, 800);
        assert_eq!(mapped.height, 600);

        // Unrelated extents fall through unchanged
        let other = data.extent_for_old(extent(256, 256));
        assert_eq!(other.width, 256);
    }

    #[test]
    fn test_float_lookup_matches_integer_transition() {
        let mut data = EventData::default();
        data.record_extent_change(extent(1280, 720), extent(1920, 1080));

        let (w, h) = data.extent_for_old_f32(1280.0, 720.0);
        assert_relative_eq!(w, 1920.0);
        assert_relative_eq!(h, 1080.0);
    }

    #[test]
    fn test_swapchain_extent_is_the_fallback() {
        let mut data = EventData::default();
        data.set_swapchain_extent(extent(1024, 768));

        let mapped = data.extent_for_old(extent(640, 480));
        assert_eq!(mapped.width, 1024);

        let (w, _) = data.extent_for_old_f32(333.0, 222.0);
        assert_relative_eq!(w, 1024.0);
    }

    #[test]
    fn test_repeated_transition_overwrites() {
        let mut data = EventData::default();
        data.record_extent_change(extent(640, 480), extent(800, 600));
        data.record_extent_change(extent(640, 480), extent(1920, 1080));

        let mapped = data.extent_for_old(extent(640, 480));
        assert_eq!(mapped.width, 1920);
        assert_eq!(data.extent_for_old(extent(800, 600)).width, 800);
    }
}
