//! Render registry.
//!
//! Previews register under a name when their view opens and unregister when
//! it closes. The registry holds no rendering state of its own; it asks each
//! entry for its geometry at render time.

use super::toolpath_cache::ToolpathCache;
use crate::preview::{PreviewAdapter, PreviewLine};
use dowelkit_camtools::dowel::DowelController;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Something the render loop can draw.
pub trait Renderable: Send + Sync {
    /// Line geometry to draw this frame.
    fn primitives(&self) -> Vec<PreviewLine>;

    /// Standalone SVG rendering.
    fn svg(&self) -> String {
        let mut cache = ToolpathCache::new();
        cache.update(0, self.primitives());
        cache.svg_document(1.0)
    }
}

/// Named set of registered previews.
#[derive(Default)]
pub struct RenderRegistry {
    entries: RwLock<BTreeMap<String, Arc<dyn Renderable>>>,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `renderable` under `name`, returning any entry it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        renderable: Arc<dyn Renderable>,
    ) -> Option<Arc<dyn Renderable>> {
        let name = name.into();
        debug!("Registering renderable '{}'", name);
        self.entries.write().insert(name, renderable)
    }

    /// Remove the entry registered under `name`.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.entries.write().remove(name).is_some();
        if removed {
            debug!("Unregistered renderable '{}'", name);
        }
        removed
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Geometry of every registered entry, ordered by name.
    ///
    /// Entries are collected before rendering so a renderable may touch the
    /// registry without deadlocking.
    pub fn render_all(&self) -> Vec<(String, Vec<PreviewLine>)> {
        let entries: Vec<(String, Arc<dyn Renderable>)> = self
            .entries
            .read()
            .iter()
            .map(|(name, r)| (name.clone(), Arc::clone(r)))
            .collect();
        entries
            .into_iter()
            .map(|(name, r)| (name, r.primitives()))
            .collect()
    }
}

impl std::fmt::Debug for RenderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Live preview of a controller's current plan.
pub struct DowelPreview {
    controller: Arc<DowelController>,
    cache: Mutex<ToolpathCache>,
}

impl DowelPreview {
    pub const DEFAULT_NAME: &'static str = "dowel-preview";

    pub fn new(controller: Arc<DowelController>) -> Self {
        Self {
            controller,
            cache: Mutex::new(ToolpathCache::new()),
        }
    }

    pub fn controller(&self) -> &Arc<DowelController> {
        &self.controller
    }
}

impl Renderable for DowelPreview {
    fn primitives(&self) -> Vec<PreviewLine> {
        PreviewAdapter::to_primitives(&self.controller.current_plan())
    }

    fn svg(&self) -> String {
        let snapshot = self.controller.snapshot();
        let hole_diameter = snapshot
            .settings
            .units()
            .to_mm(snapshot.settings.dowel_diameter());
        let mut cache = self.cache.lock();
        cache.refresh(&snapshot.plan);
        cache.svg_document(hole_diameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::LineStyle;
    use dowelkit_camtools::dowel::{DowelSettings, DowelSettingsFields};
    use dowelkit_core::units::UnitSystem;

    struct Fixed(Vec<PreviewLine>);

    impl Renderable for Fixed {
        fn primitives(&self) -> Vec<PreviewLine> {
            self.0.clone()
        }
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = RenderRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.register("b", Arc::new(Fixed(Vec::new()))).is_none());
        assert!(registry.register("a", Arc::new(Fixed(Vec::new()))).is_none());
        assert!(registry.register("a", Arc::new(Fixed(Vec::new()))).is_some());
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert!(!registry.is_registered("a"));
        assert!(registry.is_registered("b"));
    }

    #[test]
    fn test_preview_follows_controller() {
        let controller = Arc::new(DowelController::new(DowelSettings::default()).unwrap());
        let registry = RenderRegistry::new();
        registry.register(
            DowelPreview::DEFAULT_NAME,
            Arc::new(DowelPreview::new(controller.clone())),
        );

        let frames = registry.render_all();
        assert_eq!(frames[0].1.len(), 63);

        let settings = DowelSettings::create(DowelSettingsFields {
            grid_count_x: 2,
            grid_count_y: 1,
            units: UnitSystem::Metric,
            ..Default::default()
        })
        .unwrap();
        controller.apply_settings(settings).unwrap();

        let frames = registry.render_all();
        assert_eq!(frames[0].0, DowelPreview::DEFAULT_NAME);
        assert_eq!(frames[0].1.len(), 14);
        assert_eq!(frames[0].1[13].style, LineStyle::Rapid);
    }

    #[test]
    fn test_preview_svg_uses_hole_diameter() {
        let controller = Arc::new(DowelController::new(DowelSettings::default()).unwrap());
        let preview = DowelPreview::new(controller);
        assert!(preview.svg().contains(r#"stroke-width="5.00""#));
    }
}
