//! Deferred destruction of retired resource state
//!
//! When an updatee is recreated, the superseded state is not destroyed
//! immediately: GPU work recorded in earlier frames may still reference it.
//! It is parked here until its due frame (retirement frame plus the
//! updatee's time-to-live) has been reached.
//!
//! The tick counter is monotonic and each updatee's time-to-live is fixed,
//! so entries are appended in non-decreasing due-frame order and the
//! due/undue boundary is always a prefix of the queue. Release is
//! two-phase: the driver captures the due count before recreation (which
//! may append new entries) and erases exactly that many afterwards.

use std::collections::VecDeque;

use crate::foundation::FrameId;
use crate::render::resources::RetiredResource;

struct CleanupEntry {
    due_frame: FrameId,
    retiree: RetiredResource,
}

/// Due-frame-ordered queue of retired resource state
#[derive(Default)]
pub(crate) struct CleanupQueue {
    entries: VecDeque<CleanupEntry>,
}

impl CleanupQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Park retired state until `due_frame` is reached.
    pub(crate) fn push(&mut self, due_frame: FrameId, retiree: RetiredResource) {
        debug_assert!(
            self.entries.back().map_or(true, |e| e.due_frame <= due_frame),
            "cleanup entries must be appended in due-frame order"
        );
        self.entries.push_back(CleanupEntry { due_frame, retiree });
    }

    /// Number of entries due at `frame`, i.e. the length of the prefix with
    /// `due_frame <= frame`.
    pub(crate) fn due_count(&self, frame: FrameId) -> usize {
        self.entries.partition_point(|e| e.due_frame <= frame)
    }

    /// Destroy exactly the first `count` entries.
    pub(crate) fn release(&mut self, count: usize) {
        for entry in self.entries.drain(..count) {
            destroy(entry.retiree);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Final destruction of retired state.
///
/// The raw Vulkan objects inside are owned by whatever device layer baked
/// them; dropping the description here is the updater's half of the
/// contract. Exhaustive over every resource kind.
fn destroy(retiree: RetiredResource) {
    match &retiree {
        RetiredResource::GraphicsPipeline(p) => {
            log::trace!(
                "destroying retired graphics pipeline ({})",
                p.vertex_shader().display()
            );
        }
        RetiredResource::ComputePipeline(p) => {
            log::trace!("destroying retired compute pipeline ({})", p.shader().display());
        }
        RetiredResource::RayTracingPipeline(p) => {
            log::trace!(
                "destroying retired ray tracing pipeline ({} stages)",
                p.shaders().len()
            );
        }
        RetiredResource::Image(i) => {
            log::trace!(
                "destroying retired image {}x{}x{}",
                i.width(),
                i.height(),
                i.depth()
            );
        }
        RetiredResource::ImageView(v) => {
            log::trace!(
                "destroying retired image view over {}x{} image",
                v.image().width(),
                v.image().height()
            );
        }
    }
    drop(retiree);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::Image;
    use ash::vk;

    fn retired_image(width: u32) -> RetiredResource {
        RetiredResource::Image(Image::new_2d(
            width,
            width,
            vk::Format::B8G8R8A8_SRGB,
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
        ))
    }

    #[test]
    fn test_due_boundary_is_a_prefix() {
        let mut queue = CleanupQueue::new();
        queue.push(3, retired_image(1));
        queue.push(3, retired_image(2));
        queue.push(5, retired_image(3));

        assert_eq!(queue.due_count(2), 0);
        assert_eq!(queue.due_count(3), 2);
        assert_eq!(queue.due_count(4), 2);
        assert_eq!(queue.due_count(5), 3);
    }

    #[test]
    fn test_release_erases_only_the_captured_prefix() {
        let mut queue = CleanupQueue::new();
        queue.push(1, retired_image(1));

        let captured = queue.due_count(1);
        assert_eq!(captured, 1);

        // A retiree appended after capture must survive this release even
        // though its due frame is also 1.
        queue.push(1, retired_image(2));

        queue.release(captured);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.due_count(1), 1);
    }

    #[test]
    fn test_release_zero_is_a_no_op() {
        let mut queue = CleanupQueue::new();
        queue.push(7, retired_image(1));
        queue.release(0);
        assert_eq!(queue.len(), 1);
    }
}
