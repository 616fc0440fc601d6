//! Framebuffer management
//!
//! A framebuffer owns its attachment textures. Dimension changes never touch
//! existing attachments: the whole object is destroyed and rebuilt by
//! [`Framebuffer::invalidate`].

use std::rc::Rc;

use crate::render::api::{AttachmentPoint, FramebufferId, FramebufferStatus, SharedBackend, TextureDescriptor, TextureFormat, TextureId, TextureKind, TextureFilter};
use crate::render::{RenderError, RenderResult};

/// Requested framebuffer shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferSpecification {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Attachment formats; color formats become color attachments in order,
    /// at most one depth format becomes the depth attachment
    pub attachments: Vec<TextureFormat>,
    /// Sample count
    pub samples: u32,
}

impl FramebufferSpecification {
    /// Specification with single sampling
    pub fn new(width: u32, height: u32, attachments: Vec<TextureFormat>) -> Self {
        Self {
            width,
            height,
            attachments,
            samples: 1,
        }
    }
}

/// Render target with owned attachments
#[derive(Debug)]
pub struct Framebuffer {
    backend: SharedBackend,
    specification: FramebufferSpecification,
    max_size: u32,
    id: Option<FramebufferId>,
    color_formats: Vec<TextureFormat>,
    depth_format: Option<TextureFormat>,
    color_attachments: Vec<TextureId>,
    depth_attachment: Option<TextureId>,
}

impl Framebuffer {
    /// Create and build a framebuffer; `max_size` caps later resizes
    pub fn new(backend: &SharedBackend, specification: FramebufferSpecification, max_size: u32) -> RenderResult<Self> {
        let mut color_formats = Vec::new();
        let mut depth_format = None;
        for format in &specification.attachments {
            if format.is_depth() {
                if depth_format.replace(*format).is_some() {
                    log::warn!("Framebuffer specification lists more than one depth attachment; using the last");
                }
            } else {
                color_formats.push(*format);
            }
        }

        let mut framebuffer = Self {
            backend: Rc::clone(backend),
            specification,
            max_size,
            id: None,
            color_formats,
            depth_format,
            color_attachments: Vec::new(),
            depth_attachment: None,
        };
        framebuffer.invalidate()?;
        Ok(framebuffer)
    }

    /// Destroy the current GPU objects and rebuild them from the specification
    pub fn invalidate(&mut self) -> RenderResult<()> {
        self.release();

        let id = self.backend.create_framebuffer()?;
        self.id = Some(id);

        let FramebufferSpecification {
            width, height, samples, ..
        } = self.specification;

        for (index, format) in self.color_formats.iter().enumerate() {
            let texture = self.backend.create_texture(&TextureDescriptor {
                kind: TextureKind::Texture2D,
                format: *format,
                width,
                height,
                samples,
                filter: if *format == TextureFormat::RedInteger {
                    TextureFilter::Nearest
                } else {
                    TextureFilter::Linear
                },
            })?;
            self.color_attachments.push(texture);
            self.backend.attach_texture(id, AttachmentPoint::Color(index as u32), texture)?;
        }

        if let Some(format) = self.depth_format {
            let texture = self.backend.create_texture(&TextureDescriptor {
                kind: TextureKind::Texture2D,
                format,
                width,
                height,
                samples,
                filter: TextureFilter::Nearest,
            })?;
            self.depth_attachment = Some(texture);
            let point = if format == TextureFormat::Depth24Stencil8 {
                AttachmentPoint::DepthStencil
            } else {
                AttachmentPoint::Depth
            };
            self.backend.attach_texture(id, point, texture)?;
        }

        self.backend.set_draw_buffers(id, self.color_attachments.len() as u32)?;

        let status = self.backend.framebuffer_status(id)?;
        if status != FramebufferStatus::Complete {
            log::error!("Framebuffer {id:?} is incomplete: {status:?}");
            return Err(RenderError::IncompleteFramebuffer(status));
        }

        log::debug!(
            "Framebuffer {id:?} built at {width}x{height} with {} color attachment(s)",
            self.color_attachments.len()
        );
        Ok(())
    }

    /// Bind as render target and match the viewport to it
    pub fn bind(&self) -> RenderResult<()> {
        self.backend.bind_framebuffer(self.id)?;
        self.backend
            .set_viewport(0, 0, self.specification.width, self.specification.height);
        Ok(())
    }

    /// Restore the default render target
    pub fn unbind(&self) -> RenderResult<()> {
        self.backend.bind_framebuffer(None)?;
        Ok(())
    }

    /// Resize, rebuilding all attachments
    ///
    /// Zero dimensions or dimensions above the cap are rejected with a
    /// warning, leaving the framebuffer as it was.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 || width > self.max_size || height > self.max_size {
            log::warn!("Attempted to resize framebuffer to {width}, {height}");
            return Ok(());
        }
        self.specification.width = width;
        self.specification.height = height;
        self.invalidate()
    }

    /// Read one integer texel from a color attachment
    pub fn read_pixel(&self, attachment_index: usize, x: u32, y: u32) -> RenderResult<i32> {
        self.check_attachment(attachment_index)?;
        let id = self.id.ok_or(RenderError::FramebufferReleased)?;
        Ok(self.backend.read_pixel(id, attachment_index as u32, x, y)?)
    }

    /// Fill an integer color attachment with `value`
    pub fn clear_attachment(&self, attachment_index: usize, value: i32) -> RenderResult<()> {
        self.check_attachment(attachment_index)?;
        self.backend
            .clear_texture(self.color_attachments[attachment_index], value)?;
        Ok(())
    }

    /// Color attachment texture handle
    pub fn color_attachment(&self, index: usize) -> Option<TextureId> {
        self.color_attachments.get(index).copied()
    }

    /// Depth attachment texture handle
    pub fn depth_attachment(&self) -> Option<TextureId> {
        self.depth_attachment
    }

    /// Number of color attachments
    pub fn color_attachment_count(&self) -> usize {
        self.color_attachments.len()
    }

    /// Current specification
    pub fn specification(&self) -> &FramebufferSpecification {
        &self.specification
    }

    /// Backend handle of the framebuffer object
    pub fn id(&self) -> Option<FramebufferId> {
        self.id
    }

    fn check_attachment(&self, index: usize) -> RenderResult<()> {
        if index >= self.color_attachments.len() {
            log::error!(
                "Color attachment {index} requested from framebuffer with {}",
                self.color_attachments.len()
            );
            return Err(RenderError::AttachmentOutOfRange {
                index,
                count: self.color_attachments.len(),
            });
        }
        Ok(())
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.backend.delete_framebuffer(id);
            for texture in self.color_attachments.drain(..) {
                self.backend.delete_texture(texture);
            }
            if let Some(texture) = self.depth_attachment.take() {
                self.backend.delete_texture(texture);
            }
        }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::HeadlessBackend;

    fn editor_spec() -> FramebufferSpecification {
        FramebufferSpecification::new(
            1280,
            720,
            vec![TextureFormat::Rgba8, TextureFormat::RedInteger, TextureFormat::Depth24Stencil8],
        )
    }

    fn setup() -> (Rc<HeadlessBackend>, SharedBackend) {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: SharedBackend = headless.clone();
        (headless, backend)
    }

    #[test]
    fn test_attachments_created() {
        let (headless, backend) = setup();
        let framebuffer = Framebuffer::new(&backend, editor_spec(), 8192).unwrap();

        assert_eq!(framebuffer.color_attachment_count(), 2);
        assert!(framebuffer.depth_attachment().is_some());
        assert_eq!(headless.live_texture_count(), 3);
        assert_eq!(headless.live_framebuffer_count(), 1);
    }

    #[test]
    fn test_resize_twice_does_not_leak() {
        let (headless, backend) = setup();
        let mut framebuffer = Framebuffer::new(&backend, editor_spec(), 8192).unwrap();

        framebuffer.resize(640, 480).unwrap();
        let textures_after_first = headless.live_texture_count();
        let framebuffers_after_first = headless.live_framebuffer_count();
        framebuffer.resize(640, 480).unwrap();

        assert_eq!(headless.live_texture_count(), textures_after_first);
        assert_eq!(headless.live_framebuffer_count(), framebuffers_after_first);
        assert_eq!(framebuffer.specification().width, 640);
    }

    #[test]
    fn test_invalid_resize_keeps_last_state() {
        let (headless, backend) = setup();
        let mut framebuffer = Framebuffer::new(&backend, editor_spec(), 8192).unwrap();
        let id = framebuffer.id();
        headless.clear_commands();

        framebuffer.resize(0, 720).unwrap();
        framebuffer.resize(8193, 720).unwrap();
        framebuffer.resize(1280, 9000).unwrap();

        assert_eq!(framebuffer.id(), id);
        assert_eq!(framebuffer.specification().width, 1280);
        assert!(headless.commands().is_empty());
    }

    #[test]
    fn test_resize_replaces_objects() {
        let (_headless, backend) = setup();
        let mut framebuffer = Framebuffer::new(&backend, editor_spec(), 8192).unwrap();
        let before = framebuffer.id();
        framebuffer.resize(800, 600).unwrap();
        assert_ne!(framebuffer.id(), before);
    }

    #[test]
    fn test_entity_attachment_read_back() {
        let (_headless, backend) = setup();
        let framebuffer = Framebuffer::new(&backend, editor_spec(), 8192).unwrap();

        framebuffer.clear_attachment(1, 42).unwrap();
        assert_eq!(framebuffer.read_pixel(1, 10, 10).unwrap(), 42);
    }

    #[test]
    fn test_attachment_index_is_bounds_checked() {
        let (_headless, backend) = setup();
        let framebuffer = Framebuffer::new(&backend, editor_spec(), 8192).unwrap();

        assert!(matches!(
            framebuffer.read_pixel(2, 0, 0),
            Err(RenderError::AttachmentOutOfRange { index: 2, count: 2 })
        ));
        assert!(framebuffer.clear_attachment(5, 0).is_err());
    }

    #[test]
    fn test_incomplete_framebuffer_is_an_error() {
        let (headless, backend) = setup();
        headless.set_force_incomplete_framebuffers(true);
        let result = Framebuffer::new(&backend, editor_spec(), 8192);
        assert!(matches!(result, Err(RenderError::IncompleteFramebuffer(_))));
        // Dropping the half-built framebuffer released everything it created.
        assert_eq!(headless.live_texture_count(), 0);
        assert_eq!(headless.live_framebuffer_count(), 0);
    }

    #[test]
    fn test_drop_releases_everything() {
        let (headless, backend) = setup();
        let framebuffer = Framebuffer::new(&backend, editor_spec(), 8192).unwrap();
        drop(framebuffer);
        assert_eq!(headless.live_texture_count(), 0);
        assert_eq!(headless.live_framebuffer_count(), 0);
    }
}
