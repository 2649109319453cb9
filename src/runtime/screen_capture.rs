use std::sync::Arc;

use image::RgbaImage;

use crate::formats::{OverlayLayer, render_viewport};
use crate::model::Viewport;

use super::{DisplaySetService, Result, SegmentationService, ServiceError};

pub trait ScreenCapture: Send + Sync {
    fn capture(&self, viewport: &Viewport) -> Result<RgbaImage>;
}

/// Software renderer: the viewport's current slice with every attached
/// segmentation blended on top, at the element's size.
#[derive(Clone)]
pub struct RenderedCapture {
    display_sets: Arc<dyn DisplaySetService>,
    segmentations: Arc<dyn SegmentationService>,
}

impl RenderedCapture {
    pub fn new(
        display_sets: Arc<dyn DisplaySetService>,
        segmentations: Arc<dyn SegmentationService>,
    ) -> Self {
        Self {
            display_sets,
            segmentations,
        }
    }
}

impl ScreenCapture for RenderedCapture {
    fn capture(&self, viewport: &Viewport) -> Result<RgbaImage> {
        let element = viewport
            .element
            .ok_or_else(|| ServiceError::ElementNotFound(viewport.viewport_id.clone()))?;
        let display_set_uid = viewport
            .primary_display_set()
            .ok_or_else(|| {
                ServiceError::DisplaySetNotFound(format!("<none in {}>", viewport.viewport_id))
            })?;
        let display_set = self
            .display_sets
            .display_set(display_set_uid)
            .ok_or_else(|| ServiceError::DisplaySetNotFound(display_set_uid.to_string()))?;

        let attached = self
            .segmentations
            .representations_for_viewport(&viewport.viewport_id)
            .into_iter()
            .filter_map(|representation| {
                self.segmentations
                    .segmentation(&representation.segmentation_id)
            })
            .collect::<Vec<_>>();
        let overlays = attached
            .iter()
            .filter_map(|segmentation| {
                let slice = segmentation.labelmap.slice(viewport.slice_index)?;
                let colors = segmentation
                    .segments
                    .keys()
                    .filter_map(|index| {
                        self.segmentations
                            .segment_color(
                                &viewport.viewport_id,
                                &segmentation.segmentation_id,
                                *index,
                            )
                            .map(|color| (*index, color))
                    })
                    .collect();
                Some(OverlayLayer { slice, colors })
            })
            .collect::<Vec<_>>();

        Ok(render_viewport(
            display_set.slice_pixels(viewport.slice_index),
            &overlays,
            element.width,
            element.height,
        ))
    }
}
