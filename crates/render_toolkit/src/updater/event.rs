//! Updater trigger events
//!
//! An [`Event`] detects one external condition per tick: a watched shader
//! source changed on disk, a swapchain property no longer matches the value
//! cached from the previous tick, or the application explicitly requested
//! early destruction of resources. Evaluation is infallible; an event
//! returns whether it fired and may publish auxiliary data into the tick's
//! [`EventData`].
//!
//! Each event owns its previous-value cache exclusively. Two event values
//! are considered the same registration (and share one bit slot) when they
//! have the same kind and observe the same source.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use ash::vk;

use crate::foundation::FrameId;
use crate::render::resources::{
    ComputePipelineHandle, GraphicsPipelineHandle, ImageHandle, ImageViewHandle,
    RayTracingPipelineHandle, ShaderSources,
};
use crate::render::surface::SurfaceSource;
use crate::watch::FileWatcher;

use super::event_data::EventData;

/// Explicit destroy notifications queued by the application, drained by the
/// destroying-events on the next tick.
#[derive(Debug, Default)]
pub(crate) struct DestroyRequests {
    pub(crate) graphics_pipelines: Vec<GraphicsPipelineHandle>,
    pub(crate) compute_pipelines: Vec<ComputePipelineHandle>,
    pub(crate) ray_tracing_pipelines: Vec<RayTracingPipelineHandle>,
    pub(crate) images: Vec<ImageHandle>,
    pub(crate) image_views: Vec<ImageViewHandle>,
}

impl DestroyRequests {
    pub(crate) fn clear(&mut self) {
        self.graphics_pipelines.clear();
        self.compute_pipelines.clear();
        self.ray_tracing_pipelines.clear();
        self.images.clear();
        self.image_views.clear();
    }
}

/// Per-tick evaluation context handed to every event
pub(crate) struct EventContext<'a> {
    /// The updater-owned watcher, already polled this tick
    pub watcher: &'a FileWatcher,
    /// Pending explicit destroy notifications
    pub requests: &'a mut DestroyRequests,
}

/// Fires when any watched shader source file changed on disk
pub struct FilesChangedEvent {
    watched: BTreeSet<PathBuf>,
}

impl FilesChangedEvent {
    fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            watched: paths.into_iter().collect(),
        }
    }

    /// The watched path set
    pub fn watched(&self) -> &BTreeSet<PathBuf> {
        &self.watched
    }

    fn update(&mut self, cx: &EventContext<'_>) -> bool {
        cx.watcher.any_changed(self.watched.iter())
    }
}

/// Fires when the swapchain was recreated wholesale
pub struct SwapchainChangedEvent {
    surface: Arc<dyn SurfaceSource>,
    prev_generation: u64,
}

impl SwapchainChangedEvent {
    fn new(surface: Arc<dyn SurfaceSource>) -> Self {
        let prev_generation = surface.generation();
        Self {
            surface,
            prev_generation,
        }
    }

    fn update(&mut self, data: &mut EventData) -> bool {
        let current = self.surface.generation();
        let fired = current != self.prev_generation;
        if fired {
            data.set_swapchain_extent(self.surface.extent());
        }
        self.prev_generation = current;
        fired
    }
}

/// Fires when the swapchain extent no longer matches the cached one
pub struct SwapchainResizedEvent {
    surface: Arc<dyn SurfaceSource>,
    prev_extent: vk::Extent2D,
}

impl SwapchainResizedEvent {
    fn new(surface: Arc<dyn SurfaceSource>) -> Self {
        let prev_extent = surface.extent();
        Self {
            surface,
            prev_extent,
        }
    }

    fn update(&mut self, data: &mut EventData) -> bool {
        let current = self.surface.extent();
        let fired =
            current.width != self.prev_extent.width || current.height != self.prev_extent.height;
        if fired {
            data.record_extent_change(self.prev_extent, current);
        }
        self.prev_extent = current;
        fired
    }
}

/// Fires when the swapchain image format changes
pub struct SwapchainFormatChangedEvent {
    surface: Arc<dyn SurfaceSource>,
    prev_format: vk::Format,
}

impl SwapchainFormatChangedEvent {
    fn new(surface: Arc<dyn SurfaceSource>) -> Self {
        let prev_format = surface.format();
        Self {
            surface,
            prev_format,
        }
    }

    fn update(&mut self, data: &mut EventData) -> bool {
        let current = self.surface.format();
        let fired = current != self.prev_format;
        if fired {
            data.set_swapchain_format(current);
        }
        self.prev_format = current;
        fired
    }
}

/// Fires when the number of concurrent frames in flight changes
pub struct ConcurrentFramesCountChangedEvent {
    surface: Arc<dyn SurfaceSource>,
    prev_frames: FrameId,
}

impl ConcurrentFramesCountChangedEvent {
    fn new(surface: Arc<dyn SurfaceSource>) -> Self {
        let prev_frames = surface.frames_in_flight();
        Self {
            surface,
            prev_frames,
        }
    }

    fn update(&mut self, data: &mut EventData) -> bool {
        let current = self.surface.frames_in_flight();
        let fired = current != self.prev_frames;
        if fired {
            data.set_frames_in_flight(current);
        }
        self.prev_frames = current;
        fired
    }
}

/// Fires when the number of additional back-buffer attachments changes.
///
/// Only the count is compared, not the attachment contents.
pub struct SwapchainAdditionalAttachmentsChangedEvent {
    surface: Arc<dyn SurfaceSource>,
    prev_count: usize,
}

impl SwapchainAdditionalAttachmentsChangedEvent {
    fn new(surface: Arc<dyn SurfaceSource>) -> Self {
        let prev_count = surface.attachment_count();
        Self {
            surface,
            prev_count,
        }
    }

    fn update(&mut self, data: &mut EventData) -> bool {
        let current = self.surface.attachment_count();
        let fired = current != self.prev_count;
        if fired {
            data.set_attachment_count(current);
        }
        self.prev_count = current;
        fired
    }
}

/// A registered updater trigger
pub enum Event {
    /// Watched shader sources changed on disk
    FilesChanged(FilesChangedEvent),
    /// Swapchain recreated wholesale
    SwapchainChanged(SwapchainChangedEvent),
    /// Swapchain extent changed
    SwapchainResized(SwapchainResizedEvent),
    /// Swapchain image format changed
    SwapchainFormatChanged(SwapchainFormatChangedEvent),
    /// Frames-in-flight count changed
    ConcurrentFramesCountChanged(ConcurrentFramesCountChangedEvent),
    /// Additional back-buffer attachment count changed
    SwapchainAdditionalAttachmentsChanged(SwapchainAdditionalAttachmentsChangedEvent),
    /// Application requested destruction of graphics pipelines
    DestroyingGraphicsPipeline,
    /// Application requested destruction of compute pipelines
    DestroyingComputePipeline,
    /// Application requested destruction of ray tracing pipelines
    DestroyingRayTracingPipeline,
    /// Application requested destruction of images
    DestroyingImage,
    /// Application requested destruction of image views
    DestroyingImageView,
}

impl Event {
    /// Evaluate the event for this tick. Never fails.
    pub(crate) fn update(&mut self, cx: &mut EventContext<'_>, data: &mut EventData) -> bool {
        match self {
            Self::FilesChanged(e) => e.update(cx),
            Self::SwapchainChanged(e) => e.update(data),
            Self::SwapchainResized(e) => e.update(data),
            Self::SwapchainFormatChanged(e) => e.update(data),
            Self::ConcurrentFramesCountChanged(e) => e.update(data),
            Self::SwapchainAdditionalAttachmentsChanged(e) => e.update(data),
            Self::DestroyingGraphicsPipeline => {
                let pending = std::mem::take(&mut cx.requests.graphics_pipelines);
                let fired = !pending.is_empty();
                data.graphics_pipelines_to_destroy.extend(pending);
                fired
            }
            Self::DestroyingComputePipeline => {
                let pending = std::mem::take(&mut cx.requests.compute_pipelines);
                let fired = !pending.is_empty();
                data.compute_pipelines_to_destroy.extend(pending);
                fired
            }
            Self::DestroyingRayTracingPipeline => {
                let pending = std::mem::take(&mut cx.requests.ray_tracing_pipelines);
                let fired = !pending.is_empty();
                data.ray_tracing_pipelines_to_destroy.extend(pending);
                fired
            }
            Self::DestroyingImage => {
                let pending = std::mem::take(&mut cx.requests.images);
                let fired = !pending.is_empty();
                data.images_to_destroy.extend(pending);
                fired
            }
            Self::DestroyingImageView => {
                let pending = std::mem::take(&mut cx.requests.image_views);
                let fired = !pending.is_empty();
                data.image_views_to_destroy.extend(pending);
                fired
            }
        }
    }

    /// Whether `self` and `other` are the same registration.
    ///
    /// Same kind and same observed source; used by the builder to map a
    /// re-supplied event onto its existing bit slot.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::FilesChanged(a), Self::FilesChanged(b)) => a.watched == b.watched,
            (Self::SwapchainChanged(a), Self::SwapchainChanged(b)) => {
                Arc::ptr_eq(&a.surface, &b.surface)
            }
            (Self::SwapchainResized(a), Self::SwapchainResized(b)) => {
                Arc::ptr_eq(&a.surface, &b.surface)
            }
            (Self::SwapchainFormatChanged(a), Self::SwapchainFormatChanged(b)) => {
                Arc::ptr_eq(&a.surface, &b.surface)
            }
            (Self::ConcurrentFramesCountChanged(a), Self::ConcurrentFramesCountChanged(b)) => {
                Arc::ptr_eq(&a.surface, &b.surface)
            }
            (
                Self::SwapchainAdditionalAttachmentsChanged(a),
                Self::SwapchainAdditionalAttachmentsChanged(b),
            ) => Arc::ptr_eq(&a.surface, &b.surface),
            (Self::DestroyingGraphicsPipeline, Self::DestroyingGraphicsPipeline)
            | (Self::DestroyingComputePipeline, Self::DestroyingComputePipeline)
            | (Self::DestroyingRayTracingPipeline, Self::DestroyingRayTracingPipeline)
            | (Self::DestroyingImage, Self::DestroyingImage)
            | (Self::DestroyingImageView, Self::DestroyingImageView) => true,
            _ => false,
        }
    }

    /// Time-to-live this event suggests for updatees it triggers.
    ///
    /// Events tied to swapchain state that in-flight frames still reference
    /// suggest the surface's frames-in-flight count; everything else defers
    /// to the updater's configured default.
    pub(crate) fn suggested_ttl(&self) -> FrameId {
        match self {
            Self::SwapchainChanged(e) => e.surface.frames_in_flight(),
            Self::SwapchainResized(e) => e.surface.frames_in_flight(),
            Self::SwapchainFormatChanged(e) => e.surface.frames_in_flight(),
            _ => 0,
        }
    }

    /// Paths this event wants watched, if it is file-driven
    pub(crate) fn watched_paths(&self) -> Option<&BTreeSet<PathBuf>> {
        match self {
            Self::FilesChanged(e) => Some(&e.watched),
            _ => None,
        }
    }
}

/// Event firing when any of the given files changes on disk
pub fn files_changed_event(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Event {
    Event::FilesChanged(FilesChangedEvent::new(paths.into_iter().map(Into::into)))
}

/// Event firing when any of a pipeline's shader sources changes on disk
pub fn shader_files_changed_event(pipeline: &impl ShaderSources) -> Event {
    files_changed_event(pipeline.shader_sources())
}

/// Event firing when the given surface's swapchain is recreated wholesale
pub fn swapchain_changed_event<S: SurfaceSource + 'static>(surface: Arc<S>) -> Event {
    Event::SwapchainChanged(SwapchainChangedEvent::new(surface))
}

/// Event firing when the given surface's swapchain extent changes
pub fn swapchain_resized_event<S: SurfaceSource + 'static>(surface: Arc<S>) -> Event {
    Event::SwapchainResized(SwapchainResizedEvent::new(surface))
}

/// Event firing when the given surface's swapchain image format changes
pub fn swapchain_format_changed_event<S: SurfaceSource + 'static>(surface: Arc<S>) -> Event {
    Event::SwapchainFormatChanged(SwapchainFormatChangedEvent::new(surface))
}

/// Event firing when the given surface's frames-in-flight count changes
pub fn concurrent_frames_count_changed_event<S: SurfaceSource + 'static>(
    surface: Arc<S>,
) -> Event {
    Event::ConcurrentFramesCountChanged(ConcurrentFramesCountChangedEvent::new(surface))
}

/// Event firing when the given surface's additional-attachment count changes
pub fn swapchain_additional_attachments_changed_event<S: SurfaceSource + 'static>(
    surface: Arc<S>,
) -> Event {
    Event::SwapchainAdditionalAttachmentsChanged(SwapchainAdditionalAttachmentsChangedEvent::new(
        surface,
    ))
}

/// Event firing when the application requests graphics pipeline destruction
pub fn destroying_graphics_pipeline_event() -> Event {
    Event::DestroyingGraphicsPipeline
}

/// Event firing when the application requests compute pipeline destruction
pub fn destroying_compute_pipeline_event() -> Event {
    Event::DestroyingComputePipeline
}

/// Event firing when the application requests ray tracing pipeline destruction
pub fn destroying_ray_tracing_pipeline_event() -> Event {
    Event::DestroyingRayTracingPipeline
}

/// Event firing when the application requests image destruction
pub fn destroying_image_event() -> Event {
    Event::DestroyingImage
}

/// Event firing when the application requests image view destruction
pub fn destroying_image_view_event() -> Event {
    Event::DestroyingImageView
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::{SharedSurface, SurfaceProperties};

    #[test]
    fn test_same_surface_means_same_registration() {
        let surface = Arc::new(SharedSurface::new(SurfaceProperties::default()));
        let a = swapchain_resized_event(surface.clone());
        let b = swapchain_resized_event(surface.clone());
        assert!(a.same_as(&b));

        let other = Arc::new(SharedSurface::new(SurfaceProperties::default()));
        let c = swapchain_resized_event(other);
        assert!(!a.same_as(&c));

        // Different kind over the same surface is a different registration
        let d = swapchain_format_changed_event(surface);
        assert!(!a.same_as(&d));
    }

    #[test]
    fn test_files_events_compare_by_path_set() {
        let a = files_changed_event(["x.vert", "x.frag"]);
        let b = files_changed_event(["x.frag", "x.vert"]);
        let c = files_changed_event(["y.comp"]);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }

    #[test]
    fn test_destroying_events_are_singletons_per_kind() {
        assert!(destroying_image_event().same_as(&destroying_image_event()));
        assert!(!destroying_image_event().same_as(&destroying_image_view_event()));
    }

    #[test]
    fn test_swapchain_events_suggest_frames_in_flight_ttl() {
        let surface = Arc::new(SharedSurface::new(SurfaceProperties {
            frames_in_flight: 3,
            ..SurfaceProperties::default()
        }));
        assert_eq!(swapchain_resized_event(surface.clone()).suggested_ttl(), 3);
        assert_eq!(swapchain_changed_event(surface.clone()).suggested_ttl(), 3);
        assert_eq!(
            concurrent_frames_count_changed_event(surface).suggested_ttl(),
            0
        );
        assert_eq!(files_changed_event(["a.vert"]).suggested_ttl(), 0);
    }
}
