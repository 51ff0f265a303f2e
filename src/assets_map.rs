use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

/// Asset source name under which the object store root is registered.
pub const OBJECTS_SOURCE: &str = "objects";

/// Handles for one model file: the glTF root (for load status) and its first scene.
#[derive(Debug, Clone)]
pub struct CachedModel {
    pub root: Handle<Gltf>,
    pub scene: Handle<Scene>,
}

/// Loaded models keyed by object-store reference. A reference that failed to
/// load stays failed until it is forgotten, so the viewer keeps the placeholder.
#[derive(Resource, Default)]
pub struct ModelCache {
    models: HashMap<String, CachedModel>,
    failed: HashSet<String>,
}

impl ModelCache {
    pub fn asset_path(reference: &str) -> String {
        format!("{OBJECTS_SOURCE}://{reference}")
    }

    /// Handles for `reference`, starting the load on first use.
    pub fn model(&mut self, asset_server: &AssetServer, reference: &str) -> Option<CachedModel> {
        if self.is_failed(reference) {
            return None;
        }
        let model = self.models.entry(reference.to_string()).or_insert_with(|| {
            info!("Loading model {reference}");
            let path = Self::asset_path(reference);
            CachedModel {
                root: asset_server.load(path.clone()),
                scene: asset_server.load(GltfAssetLabel::Scene(0).from_asset(path)),
            }
        });
        Some(model.clone())
    }

    pub fn insert(&mut self, reference: &str, model: CachedModel) {
        self.failed.remove(reference);
        self.models.insert(reference.to_string(), model);
    }

    pub fn get(&self, reference: &str) -> Option<&CachedModel> {
        self.models.get(reference)
    }

    /// `true` the first time a reference is marked.
    pub fn mark_failed(&mut self, reference: &str) -> bool {
        self.models.remove(reference);
        self.failed.insert(reference.to_string())
    }

    pub fn is_failed(&self, reference: &str) -> bool {
        self.failed.contains(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles() -> CachedModel {
        CachedModel {
            root: Handle::default(),
            scene: Handle::default(),
        }
    }

    #[test]
    fn asset_path_uses_objects_source() {
        assert_eq!(
            ModelCache::asset_path("models/weapons/1_abc_hk.glb"),
            "objects://models/weapons/1_abc_hk.glb"
        );
    }

    #[test]
    fn failure_is_remembered() {
        let mut cache = ModelCache::default();
        cache.insert("m.glb", handles());
        assert!(cache.get("m.glb").is_some());

        assert!(cache.mark_failed("m.glb"));
        assert!(!cache.mark_failed("m.glb"));
        assert!(cache.is_failed("m.glb"));
        assert!(cache.get("m.glb").is_none());
    }

    #[test]
    fn insert_clears_failure() {
        let mut cache = ModelCache::default();
        cache.mark_failed("m.glb");
        cache.insert("m.glb", handles());
        assert!(!cache.is_failed("m.glb"));
        assert!(cache.get("m.glb").is_some());
    }
}
