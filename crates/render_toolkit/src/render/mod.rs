//! Rendering-side building blocks consumed by the resource updater
//!
//! This module holds the toolkit's resource model (CPU-side descriptions of
//! pipelines, images and image views plus their raw Vulkan handles), the
//! arena that gives resources stable handle identity, the factory seam
//! through which replacements are constructed, and the surface seam through
//! which swapchain reconfiguration state is observed.

pub mod resources;
pub mod surface;

pub use resources::{
    ComputePipeline, ComputePipelineHandle, GraphicsPipeline, GraphicsPipelineHandle, HostFactory,
    Image, ImageHandle, ImageView, ImageViewHandle, RayTracingPipeline, RayTracingPipelineHandle,
    ResourceArena, ResourceError, ResourceFactory, ResourceKind, ResourceResult, RetiredResource,
    ShaderSources,
};
pub use surface::{SharedSurface, SurfaceProperties, SurfaceSource};
