use archstudio_geometry::{Size, DEFAULT_ZOOM};
use serde::{Deserialize, Serialize};

/// Tunables for an editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub min_zoom: u16,
    pub max_zoom: u16,
    pub zoom_step: u16,
    pub initial_zoom: u16,
    /// Virtual canvas extent that element drags are clamped to
    pub canvas_extent: Size,
    pub grid_size: f64,
    pub snap_to_grid: bool,
    /// Max canvas distance from a line that still counts as hovering it
    pub hover_tolerance: f64,
    /// Max canvas distance from a group corner that grabs the resize handle
    pub handle_radius: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: 50,
            max_zoom: 200,
            zoom_step: 10,
            initial_zoom: DEFAULT_ZOOM,
            canvas_extent: Size::new(3200.0, 1800.0),
            grid_size: 20.0,
            snap_to_grid: false,
            hover_tolerance: 6.0,
            handle_radius: 8.0,
        }
    }
}

impl EditorConfig {
    /// Repair settings that cannot be applied as written. Inverted zoom
    /// bounds are swapped.
    pub fn normalized(mut self) -> Self {
        if self.min_zoom > self.max_zoom {
            tracing::warn!(
                min_zoom = self.min_zoom,
                max_zoom = self.max_zoom,
                "zoom bounds inverted, swapping"
            );
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self
    }

    pub fn clamp_zoom(&self, zoom: u16) -> u16 {
        let lo = self.min_zoom.min(self.max_zoom);
        let hi = self.min_zoom.max(self.max_zoom);
        zoom.clamp(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"snapToGrid": true, "gridSize": 10}"#).unwrap();
        assert!(config.snap_to_grid);
        assert_eq!(config.grid_size, 10.0);
        assert_eq!(config.max_zoom, 200);
        assert_eq!(config.clamp_zoom(20), 50);
    }

    #[test]
    fn inverted_zoom_bounds_are_swapped() {
        let config: EditorConfig = serde_json::from_str(r#"{"minZoom": 300, "maxZoom": 100}"#).unwrap();
        assert_eq!(config.clamp_zoom(500), 300);
        assert_eq!(config.clamp_zoom(20), 100);

        let config = config.normalized();
        assert_eq!((config.min_zoom, config.max_zoom), (100, 300));
    }
}
