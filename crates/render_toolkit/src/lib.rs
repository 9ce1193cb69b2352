//! # Render Toolkit
//!
//! A convenience layer over Vulkan for building real-time rendering
//! applications.
//!
//! The centerpiece of this crate is the **resource updater**: an
//! event-driven engine that detects external changes (window resize,
//! shader-source edits, swapchain reconfiguration, explicit destroy
//! requests) and hot-swaps the dependent GPU resources without
//! invalidating handles already held by in-flight work or application
//! code. Resources live in a [`render::resources::ResourceArena`] and are
//! addressed by stable handles; recreation replaces a resource's state in
//! place, so every handle keeps observing the current state. Superseded
//! state is destroyed only after a configurable number of frames, covering
//! GPU work still in flight.
//!
//! ## Quick Start
//!
//! ```rust
//! use render_toolkit::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), UpdaterError> {
//!     let surface = Arc::new(SharedSurface::new(SurfaceProperties::default()));
//!     let mut resources = ResourceArena::new();
//!     let mut updater = Updater::new(UpdaterConfig::default());
//!
//!     let pipeline = GraphicsPipeline::new("shaders/scene.vert.spv", "shaders/scene.frag.spv");
//!     let handle = resources.insert_graphics_pipeline(pipeline);
//!
//!     updater
//!         .on([swapchain_resized_event(surface.clone())])?
//!         .update(handle);
//!
//!     let factory = HostFactory::default();
//!     loop {
//!         // ... per-frame application work ...
//!         updater.tick(&factory, &mut resources)?;
//!         # break;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod updater;
pub mod watch;

pub use updater::{Updater, UpdaterError, UpdaterResult};

/// Common imports for toolkit users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ShaderConfig, ToolkitConfig, UpdaterConfig},
        foundation::FrameId,
        render::resources::{
            ComputePipeline, ComputePipelineHandle, GraphicsPipeline, GraphicsPipelineHandle,
            HostFactory, Image, ImageHandle, ImageView, ImageViewHandle, RayTracingPipeline,
            RayTracingPipelineHandle, ResourceArena, ResourceError, ResourceFactory,
        },
        render::surface::{SharedSurface, SurfaceProperties, SurfaceSource},
        updater::{
            concurrent_frames_count_changed_event, destroying_compute_pipeline_event,
            destroying_graphics_pipeline_event, destroying_image_event,
            destroying_image_view_event, destroying_ray_tracing_pipeline_event,
            files_changed_event, shader_files_changed_event,
            swapchain_additional_attachments_changed_event, swapchain_changed_event,
            swapchain_format_changed_event, swapchain_resized_event, Event, EventHandler,
            UpdateTarget, Updater, UpdaterError, UpdaterResult,
        },
        watch::FileWatcher,
    };
}
