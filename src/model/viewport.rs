use serde::{Deserialize, Serialize};

/// On-screen element hosting a viewport, sized in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportElement {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub viewport_id: String,
    #[serde(default)]
    pub display_set_instance_uids: Vec<String>,
    #[serde(default)]
    pub slice_index: usize,
    #[serde(default)]
    pub element: Option<ViewportElement>,
}

impl Viewport {
    pub fn new(viewport_id: impl Into<String>, display_set_instance_uid: impl Into<String>) -> Self {
        Self {
            viewport_id: viewport_id.into(),
            display_set_instance_uids: vec![display_set_instance_uid.into()],
            slice_index: 0,
            element: None,
        }
    }

    pub fn primary_display_set(&self) -> Option<&str> {
        self.display_set_instance_uids.first().map(String::as_str)
    }
}
