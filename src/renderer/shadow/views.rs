//! Cube-face shadow view construction (§4.E step 3).
//!
//! Mirrors `shadow_utils::build_spot_vp`'s `look_at_rh` + `perspective_rh`
//! idiom rather than deriving per-face rotations from quaternions: each of
//! the 6 faces is just a 90°-FOV perspective view looking down a cardinal
//! axis, exactly as the distilled source's `CubemapFaceDirections` table
//! (`ShadowMapsManagerSystem.cpp`) enumerates them.

use glam::{Mat4, Vec3};

use crate::renderer::core::view::RenderView;
use crate::scene::camera::Frustum;

/// One direction/up pair per cube face, in the source's fixed order:
/// +X, -X, +Y, -Y, +Z, -Z.
const FACE_DIRECTIONS: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// 90-degree vertical FOV: a cube face must see exactly a quarter-sphere.
const CUBE_FACE_FOV: f32 = std::f32::consts::FRAC_PI_2;

/// Builds the 6 per-face [`RenderView`]s for one point light's cube shadow
/// map. `first_face_index` is the flattened face index
/// ([`super::allocator::ShadowMapAllocator::first_face_index`]) of face 0;
/// faces are laid out contiguously so `layer_index` in each view's
/// [`crate::renderer::core::view::ViewTarget::ShadowLight`] is
/// `first_face_index + face`.
#[must_use]
pub fn build_point_light_cube_views(
    light_id: u64,
    light_buffer_index: usize,
    position: Vec3,
    radius: f32,
    near_plane: f32,
    resolution: u32,
    first_face_index: u32,
) -> [RenderView; 6] {
    let far = radius.max(near_plane + 0.01);
    let proj = Mat4::perspective_rh(CUBE_FACE_FOV, 1.0, near_plane, far);

    std::array::from_fn(|face| {
        let (dir, up) = FACE_DIRECTIONS[face];
        let view = Mat4::look_at_rh(position, position + dir, up);
        let vp = proj * view;
        let frustum = Frustum::from_matrix(vp);
        RenderView::new_shadow(
            light_id,
            first_face_index + face as u32,
            light_buffer_index,
            format!("PointLight_{light_id}_Face_{face}"),
            vp,
            frustum,
            (resolution, resolution),
            None,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_six_distinct_faces_with_requested_layer_offset() {
        let views = build_point_light_cube_views(7, 3, Vec3::new(1.0, 2.0, 3.0), 10.0, 0.04, 512, 24);
        for (face, view) in views.iter().enumerate() {
            match view.target {
                crate::renderer::core::view::ViewTarget::ShadowLight { light_id, layer_index } => {
                    assert_eq!(light_id, 7);
                    assert_eq!(layer_index, 24 + face as u32);
                }
                _ => panic!("expected a shadow view"),
            }
            assert_eq!(view.viewport_size, (512, 512));
            assert_eq!(view.light_buffer_index, 3);
        }
        // No two faces should look in the same direction.
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(views[i].view_projection, views[j].view_projection);
            }
        }
    }

    #[test]
    fn far_plane_never_collapses_onto_near_plane() {
        let views = build_point_light_cube_views(1, 0, Vec3::ZERO, 0.0, 0.04, 256, 0);
        // radius 0.0 must still produce a usable (non-degenerate) projection.
        assert!(views[0].view_projection.is_finite());
    }
}
