//! Per-kind recreation of due updatees
//!
//! Recreation builds a replacement from the old resource as a template,
//! adapting geometry through the tick's [`EventData`], then swaps it into
//! the arena slot the updatee's handle points at. The old state comes back
//! out as the retiree. The swap happens only after construction succeeded,
//! so a failed construction leaves the updatee in its last-known-good
//! state.

use ash::vk;

use crate::render::resources::{
    GraphicsPipeline, Image, ResourceArena, ResourceFactory, ResourceKind, RetiredResource,
};

use super::event_data::EventData;
use super::{EventHandler, UpdateTarget, UpdaterError, UpdaterResult};

/// Recreate one due updatee, returning the retiree if one was produced.
///
/// Resource targets produce a retiree; handler targets are invoked and
/// produce none.
pub(crate) fn recreate_updatee<F: ResourceFactory>(
    target: &mut UpdateTarget,
    factory: &F,
    resources: &mut ResourceArena,
    data: &EventData,
) -> UpdaterResult<Option<RetiredResource>> {
    match target {
        UpdateTarget::GraphicsPipeline(handle) => {
            let old = resources
                .graphics_pipeline(*handle)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::GraphicsPipeline,
                })?;
            log::debug!(
                "recreating graphics pipeline ({})",
                old.vertex_shader().display()
            );
            let new = factory
                .create_graphics_pipeline_from_template(old, &mut |p| adapt_pipeline_geometry(p, data))?;
            let retired = resources
                .replace_graphics_pipeline(*handle, new)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::GraphicsPipeline,
                })?;
            Ok(Some(RetiredResource::GraphicsPipeline(retired)))
        }
        UpdateTarget::ComputePipeline(handle) => {
            let old = resources
                .compute_pipeline(*handle)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::ComputePipeline,
                })?;
            log::debug!("recreating compute pipeline ({})", old.shader().display());
            let new = factory.create_compute_pipeline_from_template(old, &mut |_| {})?;
            let retired = resources
                .replace_compute_pipeline(*handle, new)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::ComputePipeline,
                })?;
            Ok(Some(RetiredResource::ComputePipeline(retired)))
        }
        UpdateTarget::RayTracingPipeline(handle) => {
            let old =
                resources
                    .ray_tracing_pipeline(*handle)
                    .ok_or(UpdaterError::StaleHandle {
                        kind: ResourceKind::RayTracingPipeline,
                    })?;
            log::debug!(
                "recreating ray tracing pipeline ({} stages)",
                old.shaders().len()
            );
            let new = factory.create_ray_tracing_pipeline_from_template(old, &mut |_| {})?;
            let retired = resources
                .replace_ray_tracing_pipeline(*handle, new)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::RayTracingPipeline,
                })?;
            Ok(Some(RetiredResource::RayTracingPipeline(retired)))
        }
        UpdateTarget::Image(handle) => {
            let old = resources.image(*handle).ok_or(UpdaterError::StaleHandle {
                kind: ResourceKind::Image,
            })?;
            log::debug!("recreating image {}x{}", old.width(), old.height());
            let new = factory.create_image_from_template(old, &mut |i| adapt_image_extent(i, data))?;
            let retired = resources
                .replace_image(*handle, new)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::Image,
                })?;
            Ok(Some(RetiredResource::Image(retired)))
        }
        UpdateTarget::ImageView(handle) => {
            let old = resources
                .image_view(*handle)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::ImageView,
                })?;
            log::debug!(
                "recreating image view over {}x{} image",
                old.image().width(),
                old.image().height()
            );
            let new = factory.create_image_view_from_template(
                old,
                &mut |i| adapt_image_extent(i, data),
                &mut |_| {},
            )?;
            let retired = resources
                .replace_image_view(*handle, new)
                .ok_or(UpdaterError::StaleHandle {
                    kind: ResourceKind::ImageView,
                })?;
            Ok(Some(RetiredResource::ImageView(retired)))
        }
        UpdateTarget::Handler(handler) => {
            invoke_handler(handler, resources, data);
            Ok(None)
        }
    }
}

/// Map a pipeline's viewports and scissors through this tick's resize.
fn adapt_pipeline_geometry(pipeline: &mut GraphicsPipeline, data: &EventData) {
    for viewport in pipeline.viewports_mut() {
        let (width, height) = data.extent_for_old_f32(viewport.width, viewport.height);
        viewport.width = width;
        viewport.height = height;
    }
    for scissor in pipeline.scissors_mut() {
        scissor.extent = data.extent_for_old(scissor.extent);
    }
}

/// Map a 2-D image's extent through this tick's resize. There is no
/// sensible mapping for 3-D images; those keep their dimensions.
fn adapt_image_extent(image: &mut Image, data: &EventData) {
    if image.depth() == 1 {
        let new_extent = data.extent_for_old(vk::Extent2D {
            width: image.width(),
            height: image.height(),
        });
        image.set_extent_2d(new_extent);
    } else {
        log::warn!(
            "no resize rule for 3D image with dimensions {}x{}x{}; keeping them",
            image.width(),
            image.height(),
            image.depth()
        );
    }
}

/// Call a handler updatee for this tick's firing.
///
/// Kind-specific handlers see each of the tick's destroy candidates of
/// their kind; candidates whose handle no longer resolves are skipped.
fn invoke_handler(handler: &mut EventHandler, resources: &ResourceArena, data: &EventData) {
    match handler {
        EventHandler::General(f) => f(),
        EventHandler::GraphicsPipeline(f) => {
            for handle in data.graphics_pipelines_to_destroy() {
                match resources.graphics_pipeline(*handle) {
                    Some(pipeline) => f(pipeline),
                    None => log::debug!("destroy candidate graphics pipeline already gone"),
                }
            }
        }
        EventHandler::ComputePipeline(f) => {
            for handle in data.compute_pipelines_to_destroy() {
                match resources.compute_pipeline(*handle) {
                    Some(pipeline) => f(pipeline),
                    None => log::debug!("destroy candidate compute pipeline already gone"),
                }
            }
        }
        EventHandler::RayTracingPipeline(f) => {
            for handle in data.ray_tracing_pipelines_to_destroy() {
                match resources.ray_tracing_pipeline(*handle) {
                    Some(pipeline) => f(pipeline),
                    None => log::debug!("destroy candidate ray tracing pipeline already gone"),
                }
            }
        }
        EventHandler::Image(f) => {
            for handle in data.images_to_destroy() {
                match resources.image(*handle) {
                    Some(image) => f(image),
                    None => log::debug!("destroy candidate image already gone"),
                }
            }
        }
        EventHandler::ImageView(f) => {
            for handle in data.image_views_to_destroy() {
                match resources.image_view(*handle) {
                    Some(view) => f(view),
                    None => log::debug!("destroy candidate image view already gone"),
                }
            }
        }
    }
}
