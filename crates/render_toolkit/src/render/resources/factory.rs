//! Construction of replacement resources from templates
//!
//! The updater never builds resources itself; it asks a [`ResourceFactory`]
//! to construct a replacement "from template" of the old one, handing it a
//! preparation closure that adapts kind-specific state (extents, viewports)
//! before the resource is baked. A device-backed factory compiles shaders
//! and creates the Vulkan objects; [`HostFactory`] performs the same
//! template semantics purely on the CPU-side descriptions.

use thiserror::Error;

use ash::vk;

use super::{ComputePipeline, GraphicsPipeline, Image, ImageView, RayTracingPipeline};

/// Errors produced while constructing a resource
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The backing graphics API rejected the construction
    #[error("Vulkan error: {0}")]
    Vulkan(vk::Result),

    /// A shader stage could not be loaded or compiled
    #[error("shader stage unavailable: {path}")]
    ShaderUnavailable {
        /// Path of the missing stage
        path: String,
    },

    /// Construction failed for a backend-specific reason
    #[error("resource construction failed: {0}")]
    ConstructionFailed(String),
}

/// Result alias for resource construction
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Builds replacement resources from existing ones.
///
/// Each method clones the template's description, lets `prepare` adjust it
/// (the updater uses this to map old geometry through the current tick's
/// reconfiguration data), and then bakes the result. Implementations must
/// not mutate the template; a failed construction must leave no trace.
pub trait ResourceFactory {
    /// Build a graphics pipeline from a template
    fn create_graphics_pipeline_from_template(
        &self,
        template: &GraphicsPipeline,
        prepare: &mut dyn FnMut(&mut GraphicsPipeline),
    ) -> ResourceResult<GraphicsPipeline>;

    /// Build a compute pipeline from a template
    fn create_compute_pipeline_from_template(
        &self,
        template: &ComputePipeline,
        prepare: &mut dyn FnMut(&mut ComputePipeline),
    ) -> ResourceResult<ComputePipeline>;

    /// Build a ray tracing pipeline from a template
    fn create_ray_tracing_pipeline_from_template(
        &self,
        template: &RayTracingPipeline,
        prepare: &mut dyn FnMut(&mut RayTracingPipeline),
    ) -> ResourceResult<RayTracingPipeline>;

    /// Build an image from a template
    fn create_image_from_template(
        &self,
        template: &Image,
        prepare: &mut dyn FnMut(&mut Image),
    ) -> ResourceResult<Image>;

    /// Build an image view from a template.
    ///
    /// The viewed image is prepared first, then the view itself.
    fn create_image_view_from_template(
        &self,
        template: &ImageView,
        prepare_image: &mut dyn FnMut(&mut Image),
        prepare_view: &mut dyn FnMut(&mut ImageView),
    ) -> ResourceResult<ImageView>;
}

/// Factory that rebuilds descriptions without touching a device.
///
/// The produced resources carry null raw handles; a device-backed factory
/// is needed to bake actual Vulkan objects. Useful for tests, tooling and
/// dry runs of the updater.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFactory;

impl ResourceFactory for HostFactory {
    fn create_graphics_pipeline_from_template(
        &self,
        template: &GraphicsPipeline,
        prepare: &mut dyn FnMut(&mut GraphicsPipeline),
    ) -> ResourceResult<GraphicsPipeline> {
        let mut pipeline = template.clone();
        pipeline.set_raw(vk::Pipeline::null());
        prepare(&mut pipeline);
        Ok(pipeline)
    }

    fn create_compute_pipeline_from_template(
        &self,
        template: &ComputePipeline,
        prepare: &mut dyn FnMut(&mut ComputePipeline),
    ) -> ResourceResult<ComputePipeline> {
        let mut pipeline = template.clone();
        pipeline.set_raw(vk::Pipeline::null());
        prepare(&mut pipeline);
        Ok(pipeline)
    }

    fn create_ray_tracing_pipeline_from_template(
        &self,
        template: &RayTracingPipeline,
        prepare: &mut dyn FnMut(&mut RayTracingPipeline),
    ) -> ResourceResult<RayTracingPipeline> {
        let mut pipeline = template.clone();
        pipeline.set_raw(vk::Pipeline::null());
        prepare(&mut pipeline);
        Ok(pipeline)
    }

    fn create_image_from_template(
        &self,
        template: &Image,
        prepare: &mut dyn FnMut(&mut Image),
    ) -> ResourceResult<Image> {
        let mut image = template.clone();
        image.set_raw(vk::Image::null());
        prepare(&mut image);
        Ok(image)
    }

    fn create_image_view_from_template(
        &self,
        template: &ImageView,
        prepare_image: &mut dyn FnMut(&mut Image),
        prepare_view: &mut dyn FnMut(&mut ImageView),
    ) -> ResourceResult<ImageView> {
        let mut view = template.clone();
        view.set_raw(vk::ImageView::null());
        view.image_mut().set_raw(vk::Image::null());
        prepare_image(view.image_mut());
        prepare_view(&mut view);
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_factory_applies_prepare() {
        let factory = HostFactory;
        let template = Image::new_2d(
            640,
            480,
            vk::Format::B8G8R8A8_SRGB,
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
        );

        let built = factory
            .create_image_from_template(&template, &mut |image| {
                image.set_extent_2d(vk::Extent2D {
                    width: 1920,
                    height: 1080,
                });
            })
            .unwrap();

        assert_eq!(built.width(), 1920);
        assert_eq!(built.height(), 1080);
        // Template untouched
        assert_eq!(template.width(), 640);
    }

    #[test]
    fn test_host_factory_view_prepares_image_then_view() {
        let factory = HostFactory;
        let template = ImageView::new(Image::new_2d(
            64,
            64,
            vk::Format::B8G8R8A8_SRGB,
            vk::ImageUsageFlags::SAMPLED,
        ));

        let built = factory
            .create_image_view_from_template(
                &template,
                &mut |image| {
                    image.set_extent_2d(vk::Extent2D {
                        width: 128,
                        height: 128,
                    });
                },
                &mut |view| {
                    *view = view.clone().with_view_format(vk::Format::B8G8R8A8_UNORM);
                },
            )
            .unwrap();

        assert_eq!(built.image().width(), 128);
        assert_eq!(built.format(), vk::Format::B8G8R8A8_UNORM);
    }
}
