//! Surface and swapchain state observation
//!
//! The updater never manages the swapchain itself; it only needs to see the
//! current reconfiguration state (extent, format, frame count, attachment
//! count) each tick. [`SurfaceSource`] is that seam. Window integrations
//! implement it directly; [`SharedSurface`] is a ready-made implementation
//! backed by interior mutability for integrations that push property
//! updates from their own event loop (and for tests).

use std::sync::RwLock;

use ash::vk;

use crate::foundation::FrameId;

/// Read access to the current state of a presentation surface.
///
/// Implementations report whatever the windowing/swapchain layer currently
/// holds; the updater's events compare these against cached previous values
/// once per tick.
pub trait SurfaceSource {
    /// Current swapchain image extent
    fn extent(&self) -> vk::Extent2D;

    /// Current swapchain image format
    fn format(&self) -> vk::Format;

    /// Number of frames whose GPU work may be in flight concurrently
    fn frames_in_flight(&self) -> FrameId;

    /// Number of additional back-buffer attachments beyond the swapchain
    /// images themselves
    fn attachment_count(&self) -> usize;

    /// Counter bumped every time the swapchain is recreated wholesale
    fn generation(&self) -> u64;
}

/// Snapshot of the observable surface state
#[derive(Debug, Clone, Copy)]
pub struct SurfaceProperties {
    /// Swapchain image extent
    pub extent: vk::Extent2D,
    /// Swapchain image format
    pub format: vk::Format,
    /// Concurrent frames in flight
    pub frames_in_flight: FrameId,
    /// Additional back-buffer attachment count
    pub attachment_count: usize,
    /// Swapchain recreation counter
    pub generation: u64,
}

impl Default for SurfaceProperties {
    fn default() -> Self {
        Self {
            extent: vk::Extent2D {
                width: 1280,
                height: 720,
            },
            format: vk::Format::B8G8R8A8_SRGB,
            frames_in_flight: 2,
            attachment_count: 0,
            generation: 0,
        }
    }
}

/// Shared, updatable surface state
///
/// A window integration owns one of these behind an `Arc`, pushes property
/// changes into it as its event loop observes them, and hands clones of the
/// `Arc` to the updater's swapchain events.
pub struct SharedSurface {
    properties: RwLock<SurfaceProperties>,
}

impl SharedSurface {
    /// Create shared surface state from an initial snapshot
    pub fn new(properties: SurfaceProperties) -> Self {
        Self {
            properties: RwLock::new(properties),
        }
    }

    /// Record a new swapchain extent
    pub fn set_extent(&self, extent: vk::Extent2D) {
        self.properties.write().unwrap().extent = extent;
    }

    /// Record a new swapchain image format
    pub fn set_format(&self, format: vk::Format) {
        self.properties.write().unwrap().format = format;
    }

    /// Record a new frames-in-flight count
    pub fn set_frames_in_flight(&self, frames: FrameId) {
        self.properties.write().unwrap().frames_in_flight = frames;
    }

    /// Record a new additional-attachment count
    pub fn set_attachment_count(&self, count: usize) {
        self.properties.write().unwrap().attachment_count = count;
    }

    /// Record a wholesale swapchain recreation, optionally with a new extent
    pub fn record_recreation(&self, extent: Option<vk::Extent2D>) {
        let mut props = self.properties.write().unwrap();
        props.generation += 1;
        if let Some(extent) = extent {
            props.extent = extent;
        }
    }

    /// Current snapshot of all properties
    pub fn snapshot(&self) -> SurfaceProperties {
        *self.properties.read().unwrap()
    }
}

impl SurfaceSource for SharedSurface {
    fn extent(&self) -> vk::Extent2D {
        self.properties.read().unwrap().extent
    }

    fn format(&self) -> vk::Format {
        self.properties.read().unwrap().format
    }

    fn frames_in_flight(&self) -> FrameId {
        self.properties.read().unwrap().frames_in_flight
    }

    fn attachment_count(&self) -> usize {
        self.properties.read().unwrap().attachment_count
    }

    fn generation(&self) -> u64 {
        self.properties.read().unwrap().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_surface_reflects_updates() {
        let surface = SharedSurface::new(SurfaceProperties::default());
        assert_eq!(surface.extent().width, 1280);

        surface.set_extent(vk::Extent2D {
            width: 800,
            height: 600,
        });
        assert_eq!(surface.extent().width, 800);
        assert_eq!(surface.extent().height, 600);
    }

    #[test]
    fn test_recreation_bumps_generation() {
        let surface = SharedSurface::new(SurfaceProperties::default());
        assert_eq!(surface.generation(), 0);

        surface.record_recreation(None);
        assert_eq!(surface.generation(), 1);

        surface.record_recreation(Some(vk::Extent2D {
            width: 640,
            height: 480,
        }));
        assert_eq!(surface.generation(), 2);
        assert_eq!(surface.extent().width, 640);
    }
}
