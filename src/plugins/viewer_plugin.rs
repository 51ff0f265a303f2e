use std::f32::consts::FRAC_PI_2;

use bevy::asset::LoadState;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::picking::hover::HoverMap;
use bevy::prelude::*;

use crate::armory::components::{AttachmentPlaceholder, BenchCamera, WeaponBody, WeaponRoot};
use crate::armory::events::CameraCommand;
use crate::armory::loadout::Loadout;
use crate::armory::parts::attachment::Category;
use crate::armory::parts::registry::Catalog;
use crate::armory::parts::weapon::Weapon;
use crate::assets_map::ModelCache;
use crate::config::settings::Settings;
use crate::notices::Notices;

use super::widgets::pointer_over_ui;

const ZOOM_IN: f32 = 0.8;
const ZOOM_OUT: f32 = 1.2;
const MAX_PITCH: f32 = 1.2;
const DRAG_SENSITIVITY: f32 = 0.005;
/// Model space has the barrel along +z; the root turns it to point right.
const BASE_YAW: f32 = FRAC_PI_2;

// ── Orbit camera ────────────────────────────────────────────────────

/// Orbit around the origin, plus the auto-rotate spin of the weapon.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub auto_rotate: bool,
    pub model_yaw: f32,
}

impl OrbitCamera {
    pub fn from_settings(settings: &Settings) -> Self {
        let home = Vec3::from_array(settings.camera_position);
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: settings.clamp_zoom(home.length()),
            auto_rotate: false,
            model_yaw: 0.0,
        }
    }

    pub fn apply(&mut self, command: CameraCommand, settings: &Settings) {
        match command {
            CameraCommand::RotateLeft => self.yaw -= FRAC_PI_2,
            CameraCommand::RotateRight => self.yaw += FRAC_PI_2,
            CameraCommand::ZoomIn => self.zoom(ZOOM_IN, settings),
            CameraCommand::ZoomOut => self.zoom(ZOOM_OUT, settings),
            CameraCommand::Reset => {
                *self = Self {
                    auto_rotate: self.auto_rotate,
                    ..Self::from_settings(settings)
                };
            }
            CameraCommand::ToggleAutoRotate => self.auto_rotate = !self.auto_rotate,
        }
    }

    pub fn zoom(&mut self, factor: f32, settings: &Settings) {
        self.distance = settings.clamp_zoom(self.distance * factor);
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * DRAG_SENSITIVITY;
        self.pitch = (self.pitch + delta.y * DRAG_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Camera position: the configured home direction turned by yaw and pitch.
    pub fn position(&self, settings: &Settings) -> Vec3 {
        let home = Vec3::from_array(settings.camera_position).normalize_or(Vec3::Z);
        let turn = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(-self.pitch);
        turn * home * self.distance
    }

    pub fn model_rotation(&self) -> Quat {
        Quat::from_rotation_y(BASE_YAW + self.model_yaw)
    }
}

/// What the weapon root currently shows, so the body is rebuilt only on change.
#[derive(Resource, Debug, Default)]
struct ShownModel {
    weapon_id: Option<String>,
    model_path: Option<String>,
    dirty: bool,
}

/// Body entity waiting for its glTF to finish loading.
#[derive(Component)]
struct LoadingModel(String);

// ── Plugin ──────────────────────────────────────────────────────────

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelCache>()
            .init_resource::<ShownModel>()
            .add_systems(Startup, setup_viewer)
            .add_systems(
                Update,
                (
                    camera_command_system,
                    mouse_orbit_system,
                    auto_rotate_system,
                    apply_orbit_system,
                    sync_weapon_body,
                    sync_attachment_placeholders,
                    model_load_system,
                )
                    .chain(),
            );
    }
}

fn setup_viewer(mut commands: Commands, settings: Res<Settings>) {
    let orbit = OrbitCamera::from_settings(&settings);

    commands.spawn((
        BenchCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: settings.camera_fov.to_radians(),
            near: settings.camera_near,
            far: settings.camera_far,
            ..default()
        }),
        Transform::from_translation(orbit.position(&settings)).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    for (pos, intensity) in [(Vec3::new(3.0, 3.0, 3.0), 400_000.0), (Vec3::new(-3.0, 2.0, -3.0), 250_000.0)] {
        commands.spawn((
            PointLight {
                intensity,
                range: 30.0,
                ..default()
            },
            Transform::from_translation(pos),
        ));
    }

    commands.spawn((
        WeaponRoot,
        Transform::from_rotation(orbit.model_rotation()),
        Visibility::default(),
    ));
    commands.insert_resource(orbit);
}

fn camera_command_system(
    mut commands_in: MessageReader<CameraCommand>,
    settings: Res<Settings>,
    mut orbit: ResMut<OrbitCamera>,
) {
    for command in commands_in.read() {
        orbit.apply(*command, &settings);
    }
}

fn mouse_orbit_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut scroll_events: MessageReader<MouseWheel>,
    hover_map: Res<HoverMap>,
    nodes: Query<(), With<Node>>,
    settings: Res<Settings>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let total_motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = scroll_events.read().map(|s| s.y).sum();
    if pointer_over_ui(&hover_map, &nodes) {
        return;
    }

    if scroll != 0.0 {
        let factor = if scroll > 0.0 { ZOOM_IN } else { ZOOM_OUT };
        orbit.zoom(factor, &settings);
    }
    if mouse_button.pressed(MouseButton::Left) && total_motion != Vec2::ZERO {
        orbit.orbit(total_motion);
    }
}

fn auto_rotate_system(time: Res<Time>, settings: Res<Settings>, mut orbit: ResMut<OrbitCamera>) {
    if orbit.auto_rotate {
        orbit.model_yaw += settings.auto_rotate_speed * time.delta_secs();
    }
}

fn apply_orbit_system(
    orbit: Res<OrbitCamera>,
    settings: Res<Settings>,
    mut camera_q: Query<(&mut Transform, &mut Projection), (With<BenchCamera>, Without<WeaponRoot>)>,
    mut root_q: Query<&mut Transform, With<WeaponRoot>>,
) {
    if !(orbit.is_changed() || settings.is_changed()) {
        return;
    }
    if let Ok((mut transform, mut projection)) = camera_q.single_mut() {
        *transform =
            Transform::from_translation(orbit.position(&settings)).looking_at(Vec3::ZERO, Vec3::Y);
        if settings.is_changed()
            && let Projection::Perspective(p) = projection.as_mut()
        {
            p.fov = settings.camera_fov.to_radians();
            p.near = settings.camera_near;
            p.far = settings.camera_far;
        }
    }
    if let Ok(mut root) = root_q.single_mut() {
        root.rotation = orbit.model_rotation();
    }
}

// ── Weapon model ────────────────────────────────────────────────────

fn material(materials: &mut Assets<StandardMaterial>, color: Color) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: color,
        perceptual_roughness: 0.6,
        metallic: 0.4,
        ..default()
    })
}

/// Box stand-in (body, barrel, stock) used when a weapon has no usable model.
fn spawn_placeholder_body(
    commands: &mut Commands,
    root: Entity,
    weapon: &Weapon,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let [r, g, b] = weapon.placeholder_color();
    let body_color = Color::srgb(r, g, b);
    let dark = Color::srgb(r * 0.6, g * 0.6, b * 0.6);

    let parts = [
        (Vec3::new(0.5, 0.1, 2.0), Vec3::ZERO, body_color),
        (Vec3::new(0.08, 0.08, 1.2), Vec3::new(0.0, 0.0, 1.2), dark),
        (Vec3::new(0.3, 0.1, 0.8), Vec3::new(0.0, 0.0, -1.0), dark),
    ];
    commands.entity(root).with_children(|p| {
        p.spawn((WeaponBody, Transform::default(), Visibility::default()))
            .with_children(|body| {
                for (size, at, color) in parts {
                    body.spawn((
                        Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
                        MeshMaterial3d(material(materials, color)),
                        Transform::from_translation(at),
                    ));
                }
            });
    });
}

fn sync_weapon_body(
    mut commands: Commands,
    loadout: Res<Loadout>,
    mut shown: ResMut<ShownModel>,
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
    root_q: Query<Entity, With<WeaponRoot>>,
    body_q: Query<Entity, With<WeaponBody>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let weapon = loadout.weapon();
    let weapon_id = weapon.map(|w| w.id.clone());
    let model_path = weapon.and_then(|w| w.model_path.clone());
    if !shown.dirty && shown.weapon_id == weapon_id && shown.model_path == model_path {
        return;
    }
    let Ok(root) = root_q.single() else {
        return;
    };
    for body in &body_q {
        commands.entity(body).despawn();
    }
    *shown = ShownModel {
        weapon_id,
        model_path: model_path.clone(),
        dirty: false,
    };

    let Some(weapon) = weapon else {
        return;
    };
    let model = model_path
        .as_deref()
        .and_then(|reference| Some((reference, cache.model(&asset_server, reference)?)));
    match model {
        Some((reference, model)) => {
            commands.entity(root).with_children(|p| {
                p.spawn((
                    WeaponBody,
                    LoadingModel(reference.to_string()),
                    SceneRoot(model.scene),
                    Transform::default(),
                ));
            });
        }
        None => spawn_placeholder_body(&mut commands, root, weapon, &mut meshes, &mut materials),
    }
}

/// Watch pending model loads; a failure swaps in the placeholder once.
fn model_load_system(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut cache: ResMut<ModelCache>,
    mut shown: ResMut<ShownModel>,
    mut notices: ResMut<Notices>,
    loading_q: Query<(Entity, &LoadingModel)>,
) {
    for (entity, loading) in &loading_q {
        let Some(model) = cache.get(&loading.0).cloned() else {
            continue;
        };
        match asset_server.load_state(model.root.id()) {
            LoadState::Loaded => {
                commands.entity(entity).remove::<LoadingModel>();
            }
            LoadState::Failed(e) => {
                warn!("Failed to load model {}: {e}", loading.0);
                if cache.mark_failed(&loading.0) {
                    notices.error("Error loading 3D model. Using fallback.");
                }
                shown.dirty = true;
            }
            _ => {}
        }
    }
}

fn sync_attachment_placeholders(
    mut commands: Commands,
    loadout: Res<Loadout>,
    catalog: Res<Catalog>,
    root_q: Query<Entity, With<WeaponRoot>>,
    placeholder_q: Query<Entity, With<AttachmentPlaceholder>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !(loadout.is_changed() || catalog.is_changed()) {
        return;
    }
    for entity in &placeholder_q {
        commands.entity(entity).despawn();
    }
    let (Ok(root), Some(weapon_id)) = (root_q.single(), loadout.weapon_id()) else {
        return;
    };
    let slots = catalog.slots_for(weapon_id);

    commands.entity(root).with_children(|p| {
        for (slot_id, attachment) in loadout.equipped().occupied() {
            let Some(slot) = slots.iter().find(|s| s.id == slot_id) else {
                continue;
            };
            let [x, y, z] = attachment.kind.placeholder_size();
            let color = match attachment.category {
                Category::Vital => Color::srgb(0.55, 0.55, 0.6),
                Category::Functional => Color::srgb(0.2, 0.2, 0.22),
                Category::Equipment => Color::srgb(0.35, 0.42, 0.3),
            };
            p.spawn((
                AttachmentPlaceholder {
                    slot_id: slot_id.to_string(),
                },
                Mesh3d(meshes.add(Cuboid::new(x, y, z))),
                MeshMaterial3d(material(&mut materials, color)),
                Transform::from_translation(slot.position_for(weapon_id)),
            ));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_are_clamped() {
        let settings = Settings::default();
        let mut orbit = OrbitCamera::from_settings(&settings);
        assert_eq!(orbit.distance, 5.0);

        orbit.apply(CameraCommand::ZoomIn, &settings);
        assert!((orbit.distance - 4.0).abs() < 1e-5);
        for _ in 0..10 {
            orbit.apply(CameraCommand::ZoomIn, &settings);
        }
        assert_eq!(orbit.distance, 2.0);
        for _ in 0..10 {
            orbit.apply(CameraCommand::ZoomOut, &settings);
        }
        assert_eq!(orbit.distance, 10.0);
    }

    #[test]
    fn quarter_turns_orbit_the_origin() {
        let settings = Settings::default();
        let mut orbit = OrbitCamera::from_settings(&settings);
        orbit.apply(CameraCommand::RotateRight, &settings);
        let p = orbit.position(&settings);
        assert!((p - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-4, "{p}");

        orbit.apply(CameraCommand::RotateLeft, &settings);
        orbit.apply(CameraCommand::RotateLeft, &settings);
        let p = orbit.position(&settings);
        assert!((p - Vec3::new(-5.0, 0.0, 0.0)).length() < 1e-4, "{p}");
    }

    #[test]
    fn reset_keeps_auto_rotate() {
        let settings = Settings::default();
        let mut orbit = OrbitCamera::from_settings(&settings);
        orbit.apply(CameraCommand::ToggleAutoRotate, &settings);
        orbit.apply(CameraCommand::RotateLeft, &settings);
        orbit.apply(CameraCommand::ZoomIn, &settings);
        orbit.model_yaw = 1.0;
        orbit.apply(CameraCommand::Reset, &settings);
        assert!(orbit.auto_rotate);
        assert_eq!(orbit.yaw, 0.0);
        assert_eq!(orbit.distance, 5.0);
        assert_eq!(orbit.model_yaw, 0.0);
    }

    #[test]
    fn pitch_is_limited() {
        let settings = Settings::default();
        let mut orbit = OrbitCamera::from_settings(&settings);
        orbit.orbit(Vec2::new(0.0, 10_000.0));
        assert_eq!(orbit.pitch, MAX_PITCH);
        assert!(orbit.position(&settings).y > 0.0);
    }

    #[test]
    fn barrel_points_right_at_rest() {
        let orbit = OrbitCamera::from_settings(&Settings::default());
        let muzzle = orbit.model_rotation() * Vec3::Z;
        assert!((muzzle - Vec3::X).length() < 1e-5);
    }
}
