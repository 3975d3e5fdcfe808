mod common;

use batch_ngin::{
    backend::{headless::Call, Uniform},
    data_structures::texture::TextureData,
    resources::load_obj_model,
    Camera, Display, FrameStats, Light, MaterialBinding, RenderError, RendererConfig, SceneInstance,
    Terrain, Vector3,
};
use common::test_utils::{asset_dir, headless, write_asset, QUAD_OBJ, TRIANGLE_OBJ};

fn light() -> Light {
    Light::white(Vector3::new(200.0, 200.0, 100.0))
}

#[tokio::test]
async fn many_instances_few_bindings() {
    let dir = asset_dir("many_instances");
    write_asset(&dir, "quad.obj", QUAD_OBJ);
    write_asset(&dir, "triangle.obj", TRIANGLE_OBJ);
    let config = RendererConfig::new().with_asset_dir(&dir);
    let mut h = headless(config.clone());

    let quad = load_obj_model(&mut h.store, &config, "quad.obj").await.unwrap();
    let triangle = load_obj_model(&mut h.store, &config, "triangle.obj").await.unwrap();
    let red = h.store.upload_texture(&TextureData::solid(2, 2, [255, 0, 0, 255])).unwrap();
    let blue = h.store.upload_texture(&TextureData::solid(2, 2, [0, 0, 255, 255])).unwrap();
    let bindings = [
        MaterialBinding::new(quad, red),
        MaterialBinding::new(quad, blue),
        MaterialBinding::new(triangle, red),
        MaterialBinding::new(triangle, blue),
    ];

    h.renderer.begin_frame();
    for i in 0..100 {
        // Round-robin so that no two consecutive submissions share a binding.
        let instance = SceneInstance::at(bindings[i % 4], Vector3::new(i as f32, 0.0, -20.0))
            .with_rotation(0.0, i as f32 * 3.6, 0.0);
        h.renderer.submit(&h.store, &instance).unwrap();
    }
    h.log.clear();
    let stats = h.renderer.flush(&mut h.store, &light(), &Camera::default()).unwrap();

    assert_eq!(stats, FrameStats { bind_cycles: 4, draw_calls: 100 });
    assert_eq!(h.log.mesh_binds(), 4);
    assert_eq!(h.log.texture_binds(), 4);

    // Every group's draws sit between its bind and its unbind.
    let mut draws_per_group = Vec::new();
    for call in h.log.calls() {
        match call {
            Call::BindMesh(_) => draws_per_group.push(0),
            Call::Draw { .. } => *draws_per_group.last_mut().unwrap() += 1,
            _ => {}
        }
    }
    assert_eq!(draws_per_group, vec![25; 4]);
}

#[test]
fn instances_are_not_retained_between_frames() {
    let mut h = headless(RendererConfig::default());
    let mesh = h.store.upload(&batch_ngin::data_structures::terrain::generate_mesh(2, 1.0).unwrap()).unwrap();
    let texture = h.store.upload_texture(&TextureData::solid(1, 1, [9, 9, 9, 255])).unwrap();
    let binding = MaterialBinding::new(mesh, texture);

    h.renderer.begin_frame();
    h.renderer.submit(&h.store, &SceneInstance::new(binding)).unwrap();
    let first = h.renderer.flush(&mut h.store, &light(), &Camera::default()).unwrap();
    assert_eq!(first.draw_calls, 1);

    h.renderer.begin_frame();
    let second = h.renderer.flush(&mut h.store, &light(), &Camera::default()).unwrap();
    assert_eq!(second, FrameStats::default());
}

#[test]
fn stale_handles_never_reach_the_backend() {
    let mut h = headless(RendererConfig::default());
    let mesh = h.store.upload(&batch_ngin::data_structures::terrain::generate_mesh(2, 1.0).unwrap()).unwrap();
    let texture = h.store.upload_texture(&TextureData::solid(1, 1, [9, 9, 9, 255])).unwrap();
    let stale = MaterialBinding::new(mesh, texture);

    assert!(h.store.release(mesh));
    assert!(!h.store.release(mesh));
    // The freed slot is reused; the old handle must still be rejected.
    let fresh = h.store.upload(&batch_ngin::data_structures::terrain::generate_mesh(2, 1.0).unwrap()).unwrap();
    assert_ne!(fresh, mesh);

    let err = h.renderer.submit(&h.store, &SceneInstance::new(stale)).unwrap_err();
    assert!(matches!(err, RenderError::UseAfterFree(_)));
    h.renderer
        .submit(&h.store, &SceneInstance::new(MaterialBinding::new(fresh, texture)))
        .unwrap();
}

#[test]
fn dropping_the_store_releases_everything() {
    let h = headless(RendererConfig::default());
    let log = h.log.clone();
    let mut store = h.store;
    store.upload(&batch_ngin::data_structures::terrain::generate_mesh(3, 1.0).unwrap()).unwrap();
    store.upload_texture(&TextureData::solid(1, 1, [1, 2, 3, 4])).unwrap();
    assert_eq!(log.live_buffers(), 4);
    assert_eq!(log.live_textures(), 1);

    drop(store);

    assert_eq!(log.live_buffers(), 0);
    assert_eq!(log.live_textures(), 0);
}

#[test]
fn terrain_and_entities_share_a_frame() {
    let mut h = headless(RendererConfig::default().with_clear_colour([0.5, 0.8, 1.0, 1.0]));
    let grass = h.store.upload_texture(&TextureData::solid(4, 4, [0, 160, 0, 255])).unwrap();
    let tiles = [
        Terrain::new(0, 0, &mut h.store, grass).unwrap(),
        Terrain::new(1, 0, &mut h.store, grass).unwrap(),
    ];
    let mesh = h.store.upload(&batch_ngin::data_structures::terrain::generate_mesh(2, 1.0).unwrap()).unwrap();
    let binding = MaterialBinding::new(mesh, grass).with_shine(10.0, 1.0).unwrap();
    let camera = Camera::new(Vector3::new(0.0, 5.0, 0.0), 20.0, 0.0);

    h.renderer.begin_frame();
    for tile in &tiles {
        h.renderer.submit_terrain(&h.store, tile).unwrap();
    }
    for x in 0..3 {
        h.renderer
            .submit(&h.store, &SceneInstance::at(binding, Vector3::new(x as f32, 0.0, -10.0)))
            .unwrap();
    }
    h.log.clear();
    let stats = h.renderer.flush(&mut h.store, &light(), &camera).unwrap();

    assert_eq!(stats, FrameStats { bind_cycles: 3, draw_calls: 5 });
    let calls = h.log.calls();
    assert_eq!(calls[0], Call::Clear([0.5, 0.8, 1.0, 1.0]));
    // Entities are drawn before terrain.
    let entity_start = calls.iter().position(|c| *c == Call::ShaderStart("entity")).unwrap();
    let terrain_start = calls.iter().position(|c| *c == Call::ShaderStart("terrain")).unwrap();
    assert!(entity_start < terrain_start);
    assert!(calls.contains(&Call::LoadFloat("entity", Uniform::ShineDamper, 10.0)));
    assert!(calls.contains(&Call::LoadFloat("terrain", Uniform::Reflectivity, 0.0)));
    assert_eq!(
        h.log.matrices("terrain", Uniform::View),
        vec![camera.view_matrix()]
    );

    h.store.backend_mut().present().unwrap();
    assert_eq!(h.log.calls().last(), Some(&Call::Present));
}

#[test]
fn invalid_coefficients_are_rejected() {
    let mut h = headless(RendererConfig::default());
    let mesh = h.store.upload(&batch_ngin::data_structures::terrain::generate_mesh(2, 1.0).unwrap()).unwrap();
    let texture = h.store.upload_texture(&TextureData::solid(1, 1, [0, 0, 0, 255])).unwrap();
    let binding = MaterialBinding::new(mesh, texture);

    assert!(matches!(binding.with_shine(0.0, 0.5), Err(RenderError::InvalidMaterial(_))));
    assert!(matches!(binding.with_shine(1.0, -0.1), Err(RenderError::InvalidMaterial(_))));
}
