use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::formats::generate_uid;
use crate::model::{
    DisplaySet, LabelmapVolume, Rgba, Segmentation, SegmentationDescriptor,
    SegmentationRepresentation, default_segment_color,
};

use super::sync::{read, write};
use super::{Result, ServiceError};

/// Registry of segmentations and of the viewports they are drawn on.
pub trait SegmentationService: Send + Sync {
    /// Builds an all-zero label map with one slice per image of
    /// `display_set`. The segmentation is not registered yet.
    fn create_labelmap_for_display_set(
        &self,
        display_set: &DisplaySet,
        descriptor: &SegmentationDescriptor,
    ) -> Result<Segmentation>;

    fn add_or_update_segmentation(&self, segmentation: Segmentation);

    fn segmentation(&self, segmentation_id: &str) -> Option<Arc<Segmentation>>;

    fn segmentations(&self) -> Vec<Arc<Segmentation>>;

    fn set_labelmap(&self, segmentation_id: &str, labelmap: LabelmapVolume) -> Result<()>;

    fn add_segmentation_representation(&self, viewport_id: &str, segmentation_id: &str)
    -> Result<()>;

    fn representations_for_segmentation(
        &self,
        segmentation_id: &str,
    ) -> Vec<SegmentationRepresentation>;

    fn representations_for_viewport(&self, viewport_id: &str) -> Vec<SegmentationRepresentation>;

    fn set_segment_color(
        &self,
        viewport_id: &str,
        segmentation_id: &str,
        segment_index: u16,
        color: Rgba,
    ) -> Result<()>;

    /// Viewport override, else the segment's own colour, else the default
    /// table. `None` only when the segmentation is unknown.
    fn segment_color(
        &self,
        viewport_id: &str,
        segmentation_id: &str,
        segment_index: u16,
    ) -> Option<Rgba>;
}

#[derive(Debug, Default)]
pub struct InMemorySegmentationService {
    segmentations: RwLock<HashMap<String, Arc<Segmentation>>>,
    representations: RwLock<Vec<SegmentationRepresentation>>,
}

impl InMemorySegmentationService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SegmentationService for InMemorySegmentationService {
    fn create_labelmap_for_display_set(
        &self,
        display_set: &DisplaySet,
        descriptor: &SegmentationDescriptor,
    ) -> Result<Segmentation> {
        let segmentation_id = descriptor
            .segmentation_id
            .clone()
            .unwrap_or_else(generate_uid);
        let segmentation = Segmentation::new(
            segmentation_id,
            descriptor.label.clone(),
            display_set.display_set_instance_uid.clone(),
            descriptor.segments.iter().cloned(),
            LabelmapVolume::empty_for(display_set),
        )?;
        Ok(segmentation)
    }

    fn add_or_update_segmentation(&self, segmentation: Segmentation) {
        log::debug!(
            "registering segmentation `{}` with {} segments",
            segmentation.segmentation_id,
            segmentation.segments.len()
        );
        write(&self.segmentations).insert(
            segmentation.segmentation_id.clone(),
            Arc::new(segmentation),
        );
    }

    fn segmentation(&self, segmentation_id: &str) -> Option<Arc<Segmentation>> {
        read(&self.segmentations).get(segmentation_id).cloned()
    }

    fn segmentations(&self) -> Vec<Arc<Segmentation>> {
        let mut all = read(&self.segmentations)
            .values()
            .cloned()
            .collect::<Vec<_>>();
        all.sort_by(|left, right| left.segmentation_id.cmp(&right.segmentation_id));
        all
    }

    fn set_labelmap(&self, segmentation_id: &str, labelmap: LabelmapVolume) -> Result<()> {
        let mut segmentations = write(&self.segmentations);
        let entry = segmentations
            .get_mut(segmentation_id)
            .ok_or_else(|| ServiceError::SegmentationNotFound(segmentation_id.to_string()))?;
        Arc::make_mut(entry).labelmap = labelmap;
        Ok(())
    }

    fn add_segmentation_representation(
        &self,
        viewport_id: &str,
        segmentation_id: &str,
    ) -> Result<()> {
        if self.segmentation(segmentation_id).is_none() {
            return Err(ServiceError::SegmentationNotFound(
                segmentation_id.to_string(),
            ));
        }
        let mut representations = write(&self.representations);
        let exists = representations.iter().any(|representation| {
            representation.viewport_id == viewport_id
                && representation.segmentation_id == segmentation_id
        });
        if !exists {
            representations.push(SegmentationRepresentation {
                viewport_id: viewport_id.to_string(),
                segmentation_id: segmentation_id.to_string(),
                colors: Default::default(),
            });
        }
        Ok(())
    }

    fn representations_for_segmentation(
        &self,
        segmentation_id: &str,
    ) -> Vec<SegmentationRepresentation> {
        read(&self.representations)
            .iter()
            .filter(|representation| representation.segmentation_id == segmentation_id)
            .cloned()
            .collect()
    }

    fn representations_for_viewport(&self, viewport_id: &str) -> Vec<SegmentationRepresentation> {
        read(&self.representations)
            .iter()
            .filter(|representation| representation.viewport_id == viewport_id)
            .cloned()
            .collect()
    }

    fn set_segment_color(
        &self,
        viewport_id: &str,
        segmentation_id: &str,
        segment_index: u16,
        color: Rgba,
    ) -> Result<()> {
        let mut representations = write(&self.representations);
        let representation = representations
            .iter_mut()
            .find(|representation| {
                representation.viewport_id == viewport_id
                    && representation.segmentation_id == segmentation_id
            })
            .ok_or_else(|| ServiceError::SegmentationNotFound(segmentation_id.to_string()))?;
        representation.colors.insert(segment_index, color);
        Ok(())
    }

    fn segment_color(
        &self,
        viewport_id: &str,
        segmentation_id: &str,
        segment_index: u16,
    ) -> Option<Rgba> {
        let segmentation = self.segmentation(segmentation_id)?;
        let overridden = read(&self.representations)
            .iter()
            .find(|representation| {
                representation.viewport_id == viewport_id
                    && representation.segmentation_id == segmentation_id
            })
            .and_then(|representation| representation.colors.get(&segment_index).copied());
        Some(
            overridden
                .or_else(|| {
                    segmentation
                        .segment(segment_index)
                        .and_then(|segment| segment.color)
                })
                .unwrap_or_else(|| default_segment_color(segment_index)),
        )
    }
}
