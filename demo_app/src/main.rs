//! Resource updater demo
//!
//! Drives the updater through a scripted sequence of surface changes and
//! explicit destroy requests, standing in for a real window event loop.
//! Run with `RUST_LOG=debug` to watch recreation and deferred cleanup.

use std::sync::Arc;

use ash::vk;
use render_toolkit::prelude::*;

fn main() -> Result<(), UpdaterError> {
    render_toolkit::foundation::logging::init();

    let surface = Arc::new(SharedSurface::new(SurfaceProperties {
        extent: vk::Extent2D {
            width: 1280,
            height: 720,
        },
        ..SurfaceProperties::default()
    }));
    let mut resources = ResourceArena::new();
    let mut updater = Updater::new(UpdaterConfig::default());
    let factory = HostFactory::default();

    // A pipeline and its render target, both sized to the surface.
    let pipeline = GraphicsPipeline::from_shader_config(&ShaderConfig::default())
        .with_viewport(vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: 1280.0,
            height: 720.0,
            min_depth: 0.0,
            max_depth: 1.0,
        })
        .with_scissor(vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D {
                width: 1280,
                height: 720,
            },
        });
    let pipeline = resources.insert_graphics_pipeline(pipeline);
    let color_target = resources.insert_image(Image::new_2d(
        1280,
        720,
        vk::Format::B8G8R8A8_SRGB,
        vk::ImageUsageFlags::COLOR_ATTACHMENT,
    ));

    updater
        .on([swapchain_resized_event(surface.clone())])?
        .update(pipeline)
        .update(color_target);

    updater
        .on([destroying_image_event()])?
        .invoke(EventHandler::image(|image| {
            log::info!(
                "application teardown for image {}x{}",
                image.width(),
                image.height()
            );
        }));

    for frame in 0..10u64 {
        match frame {
            3 => {
                log::info!("frame {frame}: window resized to 1920x1080");
                surface.set_extent(vk::Extent2D {
                    width: 1920,
                    height: 1080,
                });
            }
            6 => {
                log::info!("frame {frame}: requesting early image destruction");
                updater.request_destroy_image(color_target);
            }
            _ => {}
        }

        updater.tick(&factory, &mut resources)?;

        log::debug!(
            "frame {frame}: {} retirees pending cleanup",
            updater.pending_cleanup_count()
        );
    }

    let final_pipeline = resources
        .graphics_pipeline(pipeline)
        .expect("pipeline handle stays valid across recreation");
    println!(
        "final viewport: {}x{}",
        final_pipeline.viewports()[0].width,
        final_pipeline.viewports()[0].height
    );
    println!(
        "final color target: {}x{}",
        resources.image(color_target).map_or(0, Image::width),
        resources.image(color_target).map_or(0, Image::height)
    );
    Ok(())
}
