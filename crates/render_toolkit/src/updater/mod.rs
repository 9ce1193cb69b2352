//! Event-driven hot-swapping of GPU resources
//!
//! The [`Updater`] runs one tick per application frame on the control
//! thread. Each tick it captures the prefix of retired state whose deferral
//! has elapsed, evaluates every registered event into a fired bitmask,
//! recreates every updatee whose interest intersects that mask, parks the
//! superseded state for deferred destruction, erases the captured prefix
//! and advances the frame counter.
//!
//! Updatees are registered through the [`Updater::on`] builder:
//!
//! ```text
//! updater.on([swapchain_resized_event(surface.clone())])?.update(pipeline_handle);
//! ```
//!
//! Every distinct event gets the next free bit in first-seen order, so
//! callers never deal with bit positions. Re-supplying an event that is
//! already registered maps onto its existing slot.

mod cleanup;
mod event;
mod event_data;
mod recreate;

use thiserror::Error;

use crate::config::UpdaterConfig;
use crate::foundation::FrameId;
use crate::render::resources::{
    ComputePipeline, ComputePipelineHandle, GraphicsPipeline, GraphicsPipelineHandle, Image,
    ImageHandle, ImageView, ImageViewHandle, RayTracingPipeline, RayTracingPipelineHandle,
    ResourceArena, ResourceError, ResourceFactory, ResourceKind,
};
use crate::watch::FileWatcher;

use cleanup::CleanupQueue;
use event::{DestroyRequests, EventContext};

pub use event::{
    concurrent_frames_count_changed_event, destroying_compute_pipeline_event,
    destroying_graphics_pipeline_event, destroying_image_event, destroying_image_view_event,
    destroying_ray_tracing_pipeline_event, files_changed_event, shader_files_changed_event,
    swapchain_additional_attachments_changed_event, swapchain_changed_event,
    swapchain_format_changed_event, swapchain_resized_event,
    ConcurrentFramesCountChangedEvent, Event, FilesChangedEvent,
    SwapchainAdditionalAttachmentsChangedEvent, SwapchainChangedEvent,
    SwapchainFormatChangedEvent, SwapchainResizedEvent,
};
pub use event_data::{EventData, OldNewExtent};

/// Maximum number of events one updater can have registered concurrently.
///
/// Interest and fired sets are 64-bit masks; the limit is enforced at
/// registration time.
pub const MAX_EVENTS: usize = 64;

/// Updater errors
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// More events were registered than the interest mask can address
    #[error("cannot register more than {MAX_EVENTS} events on one updater")]
    TooManyEvents,

    /// An updatee's handle no longer resolves to a stored resource
    #[error("updatee references a {kind} that is no longer in the resource arena")]
    StaleHandle {
        /// Kind of the dangling updatee
        kind: ResourceKind,
    },

    /// Constructing a replacement resource failed
    #[error("resource recreation failed: {0}")]
    Resource(#[from] ResourceError),
}

/// Result alias for updater operations
pub type UpdaterResult<T> = Result<T, UpdaterError>;

/// Callback updatee invoked when its events fire.
///
/// The general form runs once per firing tick. The kind-specific forms are
/// meant for destroying-events: they run once per destroy candidate of
/// their kind recorded in the tick's event data.
pub enum EventHandler {
    /// Invoked once per firing tick
    General(Box<dyn FnMut()>),
    /// Invoked for each graphics pipeline destroy candidate
    GraphicsPipeline(Box<dyn FnMut(&GraphicsPipeline)>),
    /// Invoked for each compute pipeline destroy candidate
    ComputePipeline(Box<dyn FnMut(&ComputePipeline)>),
    /// Invoked for each ray tracing pipeline destroy candidate
    RayTracingPipeline(Box<dyn FnMut(&RayTracingPipeline)>),
    /// Invoked for each image destroy candidate
    Image(Box<dyn FnMut(&Image)>),
    /// Invoked for each image view destroy candidate
    ImageView(Box<dyn FnMut(&ImageView)>),
}

impl EventHandler {
    /// Handler invoked once per firing tick
    pub fn general(f: impl FnMut() + 'static) -> Self {
        Self::General(Box::new(f))
    }

    /// Handler invoked for each graphics pipeline destroy candidate
    pub fn graphics_pipeline(f: impl FnMut(&GraphicsPipeline) + 'static) -> Self {
        Self::GraphicsPipeline(Box::new(f))
    }

    /// Handler invoked for each compute pipeline destroy candidate
    pub fn compute_pipeline(f: impl FnMut(&ComputePipeline) + 'static) -> Self {
        Self::ComputePipeline(Box::new(f))
    }

    /// Handler invoked for each ray tracing pipeline destroy candidate
    pub fn ray_tracing_pipeline(f: impl FnMut(&RayTracingPipeline) + 'static) -> Self {
        Self::RayTracingPipeline(Box::new(f))
    }

    /// Handler invoked for each image destroy candidate
    pub fn image(f: impl FnMut(&Image) + 'static) -> Self {
        Self::Image(Box::new(f))
    }

    /// Handler invoked for each image view destroy candidate
    pub fn image_view(f: impl FnMut(&ImageView) + 'static) -> Self {
        Self::ImageView(Box::new(f))
    }
}

/// What an updatee updates: a resource at a stable handle, or a callback
pub enum UpdateTarget {
    /// Graphics pipeline at a handle
    GraphicsPipeline(GraphicsPipelineHandle),
    /// Compute pipeline at a handle
    ComputePipeline(ComputePipelineHandle),
    /// Ray tracing pipeline at a handle
    RayTracingPipeline(RayTracingPipelineHandle),
    /// Image at a handle
    Image(ImageHandle),
    /// Image view at a handle
    ImageView(ImageViewHandle),
    /// Callback updatee
    Handler(EventHandler),
}

impl From<GraphicsPipelineHandle> for UpdateTarget {
    fn from(handle: GraphicsPipelineHandle) -> Self {
        Self::GraphicsPipeline(handle)
    }
}

impl From<ComputePipelineHandle> for UpdateTarget {
    fn from(handle: ComputePipelineHandle) -> Self {
        Self::ComputePipeline(handle)
    }
}

impl From<RayTracingPipelineHandle> for UpdateTarget {
    fn from(handle: RayTracingPipelineHandle) -> Self {
        Self::RayTracingPipeline(handle)
    }
}

impl From<ImageHandle> for UpdateTarget {
    fn from(handle: ImageHandle) -> Self {
        Self::Image(handle)
    }
}

impl From<ImageViewHandle> for UpdateTarget {
    fn from(handle: ImageViewHandle) -> Self {
        Self::ImageView(handle)
    }
}

impl From<EventHandler> for UpdateTarget {
    fn from(handler: EventHandler) -> Self {
        Self::Handler(handler)
    }
}

/// One registered updatee: interest mask, target, time-to-live
struct Updatee {
    interest: u64,
    target: UpdateTarget,
    ttl: FrameId,
}

/// The resource updater driver
pub struct Updater {
    current_frame: FrameId,
    default_ttl: FrameId,
    events: Vec<Event>,
    updatees: Vec<Updatee>,
    cleanup: CleanupQueue,
    watcher: FileWatcher,
    destroy_requests: DestroyRequests,
}

impl Updater {
    /// Create an updater with its own file watcher
    pub fn new(config: UpdaterConfig) -> Self {
        Self::with_watcher(config, FileWatcher::new())
    }

    /// Create an updater around an existing watcher.
    ///
    /// Useful when the application pre-registers paths or shares watch
    /// state with its own tooling; the updater takes ownership and polls
    /// once per tick.
    pub fn with_watcher(config: UpdaterConfig, watcher: FileWatcher) -> Self {
        Self {
            current_frame: 0,
            default_ttl: config.frames_in_flight,
            events: Vec::new(),
            updatees: Vec::new(),
            cleanup: CleanupQueue::new(),
            watcher,
            destroy_requests: DestroyRequests::default(),
        }
    }

    /// Begin registering updatees triggered by the given events.
    ///
    /// Each distinct event is assigned the next free bit in first-seen
    /// order; an event equal to an already-registered one maps onto the
    /// existing slot. The proxy's time-to-live defaults to the largest
    /// frame dependency among the events (or the configured
    /// frames-in-flight when none carries one) and can be overridden with
    /// [`OnProxy::ttl`].
    ///
    /// # Errors
    ///
    /// [`UpdaterError::TooManyEvents`] when a new event would not fit the
    /// 64-bit interest mask.
    pub fn on<I>(&mut self, events: I) -> UpdaterResult<OnProxy<'_>>
    where
        I: IntoIterator<Item = Event>,
    {
        let (mask, suggested) = self.register_group(events, 0)?;
        let ttl = if suggested == 0 {
            self.default_ttl
        } else {
            suggested
        };
        Ok(OnProxy {
            updater: self,
            mask,
            ttl,
        })
    }

    /// Register an updatee directly with an explicit interest mask.
    ///
    /// Appends only; no side effects on earlier registrations.
    pub fn add_updatee(&mut self, interest: u64, target: impl Into<UpdateTarget>, ttl: FrameId) {
        self.updatees.push(Updatee {
            interest,
            target: target.into(),
            ttl,
        });
    }

    /// Queue an explicit destroy notification for a graphics pipeline
    pub fn request_destroy_graphics_pipeline(&mut self, handle: GraphicsPipelineHandle) {
        self.destroy_requests.graphics_pipelines.push(handle);
    }

    /// Queue an explicit destroy notification for a compute pipeline
    pub fn request_destroy_compute_pipeline(&mut self, handle: ComputePipelineHandle) {
        self.destroy_requests.compute_pipelines.push(handle);
    }

    /// Queue an explicit destroy notification for a ray tracing pipeline
    pub fn request_destroy_ray_tracing_pipeline(&mut self, handle: RayTracingPipelineHandle) {
        self.destroy_requests.ray_tracing_pipelines.push(handle);
    }

    /// Queue an explicit destroy notification for an image
    pub fn request_destroy_image(&mut self, handle: ImageHandle) {
        self.destroy_requests.images.push(handle);
    }

    /// Queue an explicit destroy notification for an image view
    pub fn request_destroy_image_view(&mut self, handle: ImageViewHandle) {
        self.destroy_requests.image_views.push(handle);
    }

    /// Run one update tick.
    ///
    /// Call once per application frame. Evaluates every event, recreates
    /// every updatee whose interest intersects the fired set (at most once
    /// each, however many bits matched), defers destruction of superseded
    /// state and releases state whose deferral elapsed.
    ///
    /// # Errors
    ///
    /// A failed recreation aborts the tick and surfaces here; the affected
    /// updatee keeps its last-known-good state, nothing is released and the
    /// frame counter does not advance.
    pub fn tick<F: ResourceFactory>(
        &mut self,
        factory: &F,
        resources: &mut ResourceArena,
    ) -> UpdaterResult<()> {
        // Tick-granularity watcher semantics: poll once, unconditionally,
        // whether or not anything currently listens.
        self.watcher.poll();

        let mut data = EventData::default();

        // Phase 1: capture the due-cleanup prefix. Count only; recreation
        // below may append entries that must survive this tick.
        let due = self.cleanup.due_count(self.current_frame);

        // Phase 2: evaluate events in registration order into the fired set.
        let mut fired = 0u64;
        let mut cx = EventContext {
            watcher: &self.watcher,
            requests: &mut self.destroy_requests,
        };
        for (index, event) in self.events.iter_mut().enumerate() {
            if event.update(&mut cx, &mut data) {
                fired |= 1u64 << index;
            }
        }

        // Phase 3: recreate every updatee with at least one fired interest.
        if fired != 0 {
            for updatee in &mut self.updatees {
                if updatee.interest & fired == 0 {
                    continue;
                }
                if let Some(retiree) =
                    recreate::recreate_updatee(&mut updatee.target, factory, resources, &data)?
                {
                    self.cleanup.push(self.current_frame + updatee.ttl, retiree);
                }
            }
        }

        // Phase 4: release the captured prefix and advance the clock.
        self.cleanup.release(due);
        self.destroy_requests.clear();
        self.current_frame += 1;
        Ok(())
    }

    /// The frame the next tick will run as
    pub fn current_frame(&self) -> FrameId {
        self.current_frame
    }

    /// Number of registered events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of registered updatees
    pub fn updatee_count(&self) -> usize {
        self.updatees.len()
    }

    /// Number of retired resources still awaiting destruction
    pub fn pending_cleanup_count(&self) -> usize {
        self.cleanup.len()
    }

    /// The updater-owned file watcher
    pub fn watcher(&self) -> &FileWatcher {
        &self.watcher
    }

    /// Register a group of events, deduplicating against slots from
    /// `begin` onwards. Returns the group's mask and suggested ttl.
    fn register_group<I>(&mut self, events: I, begin: usize) -> UpdaterResult<(u64, FrameId)>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut mask = 0u64;
        let mut ttl = 0;
        for event in events {
            ttl = ttl.max(event.suggested_ttl());
            let index = self.index_of_or_register(event, begin)?;
            mask |= 1u64 << index;
        }
        Ok((mask, ttl))
    }

    fn index_of_or_register(&mut self, event: Event, begin: usize) -> UpdaterResult<usize> {
        if let Some(offset) = self.events[begin.min(self.events.len())..]
            .iter()
            .position(|existing| existing.same_as(&event))
        {
            return Ok(begin + offset);
        }
        if self.events.len() == MAX_EVENTS {
            return Err(UpdaterError::TooManyEvents);
        }
        if let Some(paths) = event.watched_paths() {
            let paths: Vec<_> = paths.iter().cloned().collect();
            self.watcher.watch_all(paths);
        }
        self.events.push(event);
        Ok(self.events.len() - 1)
    }
}

/// Builder tying a group of registered events to the updatees they trigger.
///
/// Produced by [`Updater::on`]; consumed method-chaining style.
pub struct OnProxy<'a> {
    updater: &'a mut Updater,
    mask: u64,
    ttl: FrameId,
}

impl std::fmt::Debug for OnProxy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnProxy")
            .field("mask", &self.mask)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<'a> OnProxy<'a> {
    /// Override the time-to-live for subsequently registered updatees
    #[must_use]
    pub fn ttl(mut self, ttl: FrameId) -> Self {
        self.ttl = ttl;
        self
    }

    /// Register a resource (or handler) to be updated when any of the
    /// group's events fires
    pub fn update(self, target: impl Into<UpdateTarget>) -> Self {
        self.updater.add_updatee(self.mask, target, self.ttl);
        self
    }

    /// Register a handler to be invoked when any of the group's events
    /// fires
    pub fn invoke(self, handler: EventHandler) -> Self {
        self.updater.add_updatee(self.mask, handler, self.ttl);
        self
    }

    /// Chain a follow-up event group evaluated after this one.
    ///
    /// Deduplication for the new group only considers slots from this
    /// group's highest bit onwards, so re-supplying an event that sits at
    /// an earlier slot registers a fresh instance evaluated after this
    /// group, which preserves evaluation order along the chain.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::TooManyEvents`] when a new event would not fit the
    /// 64-bit interest mask.
    pub fn then_on<I>(self, events: I) -> UpdaterResult<OnProxy<'a>>
    where
        I: IntoIterator<Item = Event>,
    {
        let OnProxy { updater, mask, .. } = self;
        let begin = if mask == 0 {
            0
        } else {
            63 - mask.leading_zeros() as usize
        };
        let (mask, suggested) = updater.register_group(events, begin)?;
        let ttl = if suggested == 0 {
            updater.default_ttl
        } else {
            suggested
        };
        Ok(OnProxy { updater, mask, ttl })
    }
}
