//! Handle-based resource storage
//!
//! Resources are stored in slot maps and addressed by typed handles. A
//! handle is the resource's *external identity*: it stays valid across
//! recreation because the updater replaces the stored state in place
//! rather than allocating a new slot. Everything the application or
//! recorded GPU work holds on to is a handle, never a direct reference.

use slotmap::SlotMap;

use super::{ComputePipeline, GraphicsPipeline, Image, ImageView, RayTracingPipeline};

slotmap::new_key_type! {
    /// Stable handle to a [`GraphicsPipeline`]
    pub struct GraphicsPipelineHandle;
    /// Stable handle to a [`ComputePipeline`]
    pub struct ComputePipelineHandle;
    /// Stable handle to a [`RayTracingPipeline`]
    pub struct RayTracingPipelineHandle;
    /// Stable handle to an [`Image`]
    pub struct ImageHandle;
    /// Stable handle to an [`ImageView`]
    pub struct ImageViewHandle;
}

/// Arena owning every updater-managed resource
#[derive(Default)]
pub struct ResourceArena {
    graphics_pipelines: SlotMap<GraphicsPipelineHandle, GraphicsPipeline>,
    compute_pipelines: SlotMap<ComputePipelineHandle, ComputePipeline>,
    ray_tracing_pipelines: SlotMap<RayTracingPipelineHandle, RayTracingPipeline>,
    images: SlotMap<ImageHandle, Image>,
    image_views: SlotMap<ImageViewHandle, ImageView>,
}

impl ResourceArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a graphics pipeline, returning its stable handle
    pub fn insert_graphics_pipeline(&mut self, pipeline: GraphicsPipeline) -> GraphicsPipelineHandle {
        self.graphics_pipelines.insert(pipeline)
    }

    /// Store a compute pipeline, returning its stable handle
    pub fn insert_compute_pipeline(&mut self, pipeline: ComputePipeline) -> ComputePipelineHandle {
        self.compute_pipelines.insert(pipeline)
    }

    /// Store a ray tracing pipeline, returning its stable handle
    pub fn insert_ray_tracing_pipeline(
        &mut self,
        pipeline: RayTracingPipeline,
    ) -> RayTracingPipelineHandle {
        self.ray_tracing_pipelines.insert(pipeline)
    }

    /// Store an image, returning its stable handle
    pub fn insert_image(&mut self, image: Image) -> ImageHandle {
        self.images.insert(image)
    }

    /// Store an image view, returning its stable handle
    pub fn insert_image_view(&mut self, view: ImageView) -> ImageViewHandle {
        self.image_views.insert(view)
    }

    /// Look up a graphics pipeline
    pub fn graphics_pipeline(&self, handle: GraphicsPipelineHandle) -> Option<&GraphicsPipeline> {
        self.graphics_pipelines.get(handle)
    }

    /// Look up a compute pipeline
    pub fn compute_pipeline(&self, handle: ComputePipelineHandle) -> Option<&ComputePipeline> {
        self.compute_pipelines.get(handle)
    }

    /// Look up a ray tracing pipeline
    pub fn ray_tracing_pipeline(
        &self,
        handle: RayTracingPipelineHandle,
    ) -> Option<&RayTracingPipeline> {
        self.ray_tracing_pipelines.get(handle)
    }

    /// Look up an image
    pub fn image(&self, handle: ImageHandle) -> Option<&Image> {
        self.images.get(handle)
    }

    /// Look up an image view
    pub fn image_view(&self, handle: ImageViewHandle) -> Option<&ImageView> {
        self.image_views.get(handle)
    }

    /// Swap in new graphics pipeline state at a handle, returning the old state
    pub fn replace_graphics_pipeline(
        &mut self,
        handle: GraphicsPipelineHandle,
        pipeline: GraphicsPipeline,
    ) -> Option<GraphicsPipeline> {
        self.graphics_pipelines
            .get_mut(handle)
            .map(|slot| std::mem::replace(slot, pipeline))
    }

    /// Swap in new compute pipeline state at a handle, returning the old state
    pub fn replace_compute_pipeline(
        &mut self,
        handle: ComputePipelineHandle,
        pipeline: ComputePipeline,
    ) -> Option<ComputePipeline> {
        self.compute_pipelines
            .get_mut(handle)
            .map(|slot| std::mem::replace(slot, pipeline))
    }

    /// Swap in new ray tracing pipeline state at a handle, returning the old state
    pub fn replace_ray_tracing_pipeline(
        &mut self,
        handle: RayTracingPipelineHandle,
        pipeline: RayTracingPipeline,
    ) -> Option<RayTracingPipeline> {
        self.ray_tracing_pipelines
            .get_mut(handle)
            .map(|slot| std::mem::replace(slot, pipeline))
    }

    /// Swap in new image state at a handle, returning the old state
    pub fn replace_image(&mut self, handle: ImageHandle, image: Image) -> Option<Image> {
        self.images
            .get_mut(handle)
            .map(|slot| std::mem::replace(slot, image))
    }

    /// Swap in new image view state at a handle, returning the old state
    pub fn replace_image_view(
        &mut self,
        handle: ImageViewHandle,
        view: ImageView,
    ) -> Option<ImageView> {
        self.image_views
            .get_mut(handle)
            .map(|slot| std::mem::replace(slot, view))
    }

    /// Drop a graphics pipeline, returning its final state
    pub fn remove_graphics_pipeline(
        &mut self,
        handle: GraphicsPipelineHandle,
    ) -> Option<GraphicsPipeline> {
        self.graphics_pipelines.remove(handle)
    }

    /// Drop an image, returning its final state
    pub fn remove_image(&mut self, handle: ImageHandle) -> Option<Image> {
        self.images.remove(handle)
    }

    /// Total number of stored resources across all kinds
    pub fn len(&self) -> usize {
        self.graphics_pipelines.len()
            + self.compute_pipelines.len()
            + self.ray_tracing_pipelines.len()
            + self.images.len()
            + self.image_views.len()
    }

    /// Whether the arena holds no resources
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk;

    #[test]
    fn test_handle_survives_replace() {
        let mut arena = ResourceArena::new();
        let handle = arena.insert_image(Image::new_2d(
            640,
            480,
            vk::Format::B8G8R8A8_SRGB,
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
        ));

        let old = arena
            .replace_image(
                handle,
                Image::new_2d(
                    800,
                    600,
                    vk::Format::B8G8R8A8_SRGB,
                    vk::ImageUsageFlags::COLOR_ATTACHMENT,
                ),
            )
            .unwrap();

        assert_eq!(old.width(), 640);
        let current = arena.image(handle).unwrap();
        assert_eq!(current.width(), 800);
    }

    #[test]
    fn test_replace_on_removed_handle_is_none() {
        let mut arena = ResourceArena::new();
        let handle = arena.insert_image(Image::new_2d(
            4,
            4,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::SAMPLED,
        ));
        arena.remove_image(handle).unwrap();

        let replaced = arena.replace_image(
            handle,
            Image::new_2d(8, 8, vk::Format::R8G8B8A8_UNORM, vk::ImageUsageFlags::SAMPLED),
        );
        assert!(replaced.is_none());
        assert!(arena.is_empty());
    }
}
