//! Resource model for updater-managed GPU objects
//!
//! Each resource is a CPU-side description (the state a replacement is
//! rebuilt from) plus the raw Vulkan object handle a device-backed factory
//! bakes into it. The descriptions deliberately mirror the create-info the
//! resource was constructed with: recreation works by cloning them,
//! adapting geometry, and rebuilding.

mod arena;
mod factory;

use std::fmt;
use std::path::{Path, PathBuf};

use ash::vk;

pub use arena::{
    ComputePipelineHandle, GraphicsPipelineHandle, ImageHandle, ImageViewHandle,
    RayTracingPipelineHandle, ResourceArena,
};
pub use factory::{HostFactory, ResourceError, ResourceFactory, ResourceResult};

/// Access to the shader source files a pipeline was built from.
///
/// Used to derive a files-changed trigger from a pipeline without spelling
/// the paths out twice.
pub trait ShaderSources {
    /// Paths of every shader stage this resource depends on
    fn shader_sources(&self) -> Vec<&Path>;
}

/// A graphics pipeline: shader stages plus fixed-function viewport state
#[derive(Debug, Clone)]
pub struct GraphicsPipeline {
    vertex_shader: PathBuf,
    fragment_shader: PathBuf,
    viewports: Vec<vk::Viewport>,
    scissors: Vec<vk::Rect2D>,
    raw: vk::Pipeline,
}

impl GraphicsPipeline {
    /// Create a pipeline description from its shader stage paths
    pub fn new(vertex_shader: impl Into<PathBuf>, fragment_shader: impl Into<PathBuf>) -> Self {
        Self {
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            viewports: Vec::new(),
            scissors: Vec::new(),
            raw: vk::Pipeline::null(),
        }
    }

    /// Create a pipeline description from a shader configuration
    pub fn from_shader_config(config: &crate::config::ShaderConfig) -> Self {
        Self::new(&config.vertex_shader_path, &config.fragment_shader_path)
    }

    /// Add a full-extent viewport
    #[must_use]
    pub fn with_viewport(mut self, viewport: vk::Viewport) -> Self {
        self.viewports.push(viewport);
        self
    }

    /// Add a scissor rectangle
    #[must_use]
    pub fn with_scissor(mut self, scissor: vk::Rect2D) -> Self {
        self.scissors.push(scissor);
        self
    }

    /// Vertex shader path
    pub fn vertex_shader(&self) -> &Path {
        &self.vertex_shader
    }

    /// Fragment shader path
    pub fn fragment_shader(&self) -> &Path {
        &self.fragment_shader
    }

    /// Configured viewports
    pub fn viewports(&self) -> &[vk::Viewport] {
        &self.viewports
    }

    /// Mutable access to the configured viewports
    pub fn viewports_mut(&mut self) -> &mut [vk::Viewport] {
        &mut self.viewports
    }

    /// Configured scissor rectangles
    pub fn scissors(&self) -> &[vk::Rect2D] {
        &self.scissors
    }

    /// Mutable access to the configured scissor rectangles
    pub fn scissors_mut(&mut self) -> &mut [vk::Rect2D] {
        &mut self.scissors
    }

    /// Raw Vulkan pipeline handle (null until baked by a device factory)
    pub fn raw(&self) -> vk::Pipeline {
        self.raw
    }

    /// Attach the baked Vulkan pipeline handle
    pub fn set_raw(&mut self, raw: vk::Pipeline) {
        self.raw = raw;
    }
}

impl ShaderSources for GraphicsPipeline {
    fn shader_sources(&self) -> Vec<&Path> {
        vec![&self.vertex_shader, &self.fragment_shader]
    }
}

/// A compute pipeline: a single shader stage
#[derive(Debug, Clone)]
pub struct ComputePipeline {
    shader: PathBuf,
    raw: vk::Pipeline,
}

impl ComputePipeline {
    /// Create a pipeline description from its shader path
    pub fn new(shader: impl Into<PathBuf>) -> Self {
        Self {
            shader: shader.into(),
            raw: vk::Pipeline::null(),
        }
    }

    /// Compute shader path
    pub fn shader(&self) -> &Path {
        &self.shader
    }

    /// Raw Vulkan pipeline handle (null until baked by a device factory)
    pub fn raw(&self) -> vk::Pipeline {
        self.raw
    }

    /// Attach the baked Vulkan pipeline handle
    pub fn set_raw(&mut self, raw: vk::Pipeline) {
        self.raw = raw;
    }
}

impl ShaderSources for ComputePipeline {
    fn shader_sources(&self) -> Vec<&Path> {
        vec![&self.shader]
    }
}

/// A ray tracing pipeline: a set of shader stages and a recursion bound
#[derive(Debug, Clone)]
pub struct RayTracingPipeline {
    shaders: Vec<PathBuf>,
    max_recursion_depth: u32,
    raw: vk::Pipeline,
}

impl RayTracingPipeline {
    /// Create a pipeline description from its shader stage paths
    pub fn new(shaders: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            shaders: shaders.into_iter().map(Into::into).collect(),
            max_recursion_depth: 1,
            raw: vk::Pipeline::null(),
        }
    }

    /// Set the maximum ray recursion depth
    #[must_use]
    pub fn with_max_recursion_depth(mut self, depth: u32) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Shader stage paths
    pub fn shaders(&self) -> &[PathBuf] {
        &self.shaders
    }

    /// Maximum ray recursion depth
    pub fn max_recursion_depth(&self) -> u32 {
        self.max_recursion_depth
    }

    /// Raw Vulkan pipeline handle (null until baked by a device factory)
    pub fn raw(&self) -> vk::Pipeline {
        self.raw
    }

    /// Attach the baked Vulkan pipeline handle
    pub fn set_raw(&mut self, raw: vk::Pipeline) {
        self.raw = raw;
    }
}

impl ShaderSources for RayTracingPipeline {
    fn shader_sources(&self) -> Vec<&Path> {
        self.shaders.iter().map(PathBuf::as_path).collect()
    }
}

/// An image: extent, format and usage
#[derive(Debug, Clone)]
pub struct Image {
    extent: vk::Extent3D,
    format: vk::Format,
    mip_levels: u32,
    usage: vk::ImageUsageFlags,
    raw: vk::Image,
}

impl Image {
    /// Create a 2-D image description
    pub fn new_2d(width: u32, height: u32, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            extent: vk::Extent3D {
                width,
                height,
                depth: 1,
            },
            format,
            mip_levels: 1,
            usage,
            raw: vk::Image::null(),
        }
    }

    /// Create a 3-D image description
    pub fn new_3d(extent: vk::Extent3D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            extent,
            format,
            mip_levels: 1,
            usage,
            raw: vk::Image::null(),
        }
    }

    /// Set the mip level count
    #[must_use]
    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    /// Image extent
    pub fn extent(&self) -> vk::Extent3D {
        self.extent
    }

    /// Image width in texels
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    /// Image height in texels
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Image depth in texels (1 for 2-D images)
    pub fn depth(&self) -> u32 {
        self.extent.depth
    }

    /// Replace width and height, keeping the depth
    pub fn set_extent_2d(&mut self, extent: vk::Extent2D) {
        self.extent.width = extent.width;
        self.extent.height = extent.height;
    }

    /// Image format
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Mip level count
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Usage flags
    pub fn usage(&self) -> vk::ImageUsageFlags {
        self.usage
    }

    /// Raw Vulkan image handle (null until baked by a device factory)
    pub fn raw(&self) -> vk::Image {
        self.raw
    }

    /// Attach the baked Vulkan image handle
    pub fn set_raw(&mut self, raw: vk::Image) {
        self.raw = raw;
    }
}

/// An image view over an owned image description
#[derive(Debug, Clone)]
pub struct ImageView {
    image: Image,
    view_format: Option<vk::Format>,
    raw: vk::ImageView,
}

impl ImageView {
    /// Create a view over an image, using the image's own format
    pub fn new(image: Image) -> Self {
        Self {
            image,
            view_format: None,
            raw: vk::ImageView::null(),
        }
    }

    /// Override the view format
    #[must_use]
    pub fn with_view_format(mut self, format: vk::Format) -> Self {
        self.view_format = Some(format);
        self
    }

    /// The viewed image description
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Mutable access to the viewed image description
    pub fn image_mut(&mut self) -> &mut Image {
        &mut self.image
    }

    /// Effective view format
    pub fn format(&self) -> vk::Format {
        self.view_format.unwrap_or_else(|| self.image.format())
    }

    /// Raw Vulkan image view handle (null until baked by a device factory)
    pub fn raw(&self) -> vk::ImageView {
        self.raw
    }

    /// Attach the baked Vulkan image view handle
    pub fn set_raw(&mut self, raw: vk::ImageView) {
        self.raw = raw;
    }
}

/// Which kind of resource a handle or retiree refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Graphics pipeline
    GraphicsPipeline,
    /// Compute pipeline
    ComputePipeline,
    /// Ray tracing pipeline
    RayTracingPipeline,
    /// Image
    Image,
    /// Image view
    ImageView,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GraphicsPipeline => "graphics pipeline",
            Self::ComputePipeline => "compute pipeline",
            Self::RayTracingPipeline => "ray tracing pipeline",
            Self::Image => "image",
            Self::ImageView => "image view",
        };
        f.write_str(name)
    }
}

/// Superseded resource state awaiting deferred destruction
#[derive(Debug)]
pub enum RetiredResource {
    /// Retired graphics pipeline state
    GraphicsPipeline(GraphicsPipeline),
    /// Retired compute pipeline state
    ComputePipeline(ComputePipeline),
    /// Retired ray tracing pipeline state
    RayTracingPipeline(RayTracingPipeline),
    /// Retired image state
    Image(Image),
    /// Retired image view state
    ImageView(ImageView),
}

impl RetiredResource {
    /// The kind of resource retired
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::GraphicsPipeline(_) => ResourceKind::GraphicsPipeline,
            Self::ComputePipeline(_) => ResourceKind::ComputePipeline,
            Self::RayTracingPipeline(_) => ResourceKind::RayTracingPipeline,
            Self::Image(_) => ResourceKind::Image,
            Self::ImageView(_) => ResourceKind::ImageView,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphics_pipeline_shader_sources() {
        let pipeline = GraphicsPipeline::new("a.vert.spv", "a.frag.spv");
        let sources = pipeline.shader_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0], Path::new("a.vert.spv"));
        assert_eq!(sources[1], Path::new("a.frag.spv"));
    }

    #[test]
    fn test_image_extent_2d_update_keeps_depth() {
        let mut image = Image::new_3d(
            vk::Extent3D {
                width: 64,
                height: 64,
                depth: 16,
            },
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::STORAGE,
        );
        image.set_extent_2d(vk::Extent2D {
            width: 128,
            height: 32,
        });
        assert_eq!(image.width(), 128);
        assert_eq!(image.height(), 32);
        assert_eq!(image.depth(), 16);
    }

    #[test]
    fn test_image_view_format_falls_back_to_image() {
        let image = Image::new_2d(
            32,
            32,
            vk::Format::B8G8R8A8_SRGB,
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
        );
        let view = ImageView::new(image.clone());
        assert_eq!(view.format(), vk::Format::B8G8R8A8_SRGB);

        let view = ImageView::new(image).with_view_format(vk::Format::B8G8R8A8_UNORM);
        assert_eq!(view.format(), vk::Format::B8G8R8A8_UNORM);
    }
}
