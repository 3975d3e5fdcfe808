#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use batch_ngin::{
        backend::gpu::PipelineKind, BatchRenderer, Camera, Display, GeometryStore, Light,
        RendererConfig, Vector3,
    };

    let config = RendererConfig::default().with_clear_colour([1.0, 1.0, 1.0, 1.0]);
    let Some(backend) = common::test_utils::gpu(64, 64, &config) else {
        return;
    };
    let mut renderer = BatchRenderer::new(
        config,
        &backend,
        Box::new(backend.shader(PipelineKind::Entity)),
        Box::new(backend.shader(PipelineKind::Terrain)),
    );
    let mut store = GeometryStore::new(backend);

    renderer.begin_frame();
    renderer
        .flush(&mut store, &Light::white(Vector3::new(0.0, 10.0, 0.0)), &Camera::default())
        .unwrap();
    store.backend_mut().present().unwrap();

    let image = futures::executor::block_on(store.backend().capture()).unwrap();
    assert_eq!((image.width, image.height), (64, 64));
    assert!(image.pixels.chunks(4).all(|p| p == [255, 255, 255, 255]));
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_a_batched_quad() {
    use batch_ngin::{
        backend::gpu::PipelineKind, data_structures::texture::TextureData, resources::mesh,
        BatchRenderer, Camera, Display, GeometryStore, Light, MaterialBinding, RendererConfig,
        SceneInstance, Vector3,
    };

    let config = RendererConfig::default().with_clear_colour([0.0, 0.0, 0.0, 1.0]);
    let Some(backend) = common::test_utils::gpu(64, 64, &config) else {
        return;
    };
    let mut renderer = BatchRenderer::new(
        config,
        &backend,
        Box::new(backend.shader(PipelineKind::Entity)),
        Box::new(backend.shader(PipelineKind::Terrain)),
    );
    let mut store = GeometryStore::new(backend);
    let quad = store
        .upload(&mesh::parse_obj(common::test_utils::QUAD_OBJ).unwrap())
        .unwrap();
    let white = store
        .upload_texture(&TextureData::solid(2, 2, [255, 255, 255, 255]))
        .unwrap();
    let binding = MaterialBinding::new(quad, white);

    renderer.begin_frame();
    // Two overlapping quads straight ahead, lit from the camera.
    for z in [-2.0, -3.0] {
        renderer
            .submit(&store, &SceneInstance::at(binding, Vector3::new(0.0, 0.0, z)))
            .unwrap();
    }
    let stats = renderer
        .flush(&mut store, &Light::white(Vector3::new(0.0, 0.0, 10.0)), &Camera::default())
        .unwrap();
    assert_eq!((stats.bind_cycles, stats.draw_calls), (1, 2));
    store.backend_mut().present().unwrap();

    let image = futures::executor::block_on(store.backend().capture()).unwrap();
    let centre = ((32 * 64 + 32) * 4) as usize;
    let corner = 0;
    assert!(image.pixels[centre] > 200, "centre should be lit");
    assert_eq!(&image.pixels[corner..corner + 3], &[0, 0, 0]);
}

#[test]
#[cfg(feature = "integration-tests")]
fn discarded_frame_is_never_replayed() {
    use batch_ngin::{
        backend::gpu::PipelineKind, data_structures::texture::TextureData, resources::mesh,
        BatchRenderer, Camera, Display, GeometryStore, GraphicsBackend, Light, MaterialBinding,
        RendererConfig, SceneInstance, Vector3,
    };

    let config = RendererConfig::default().with_clear_colour([0.0, 0.0, 0.0, 1.0]);
    let Some(backend) = common::test_utils::gpu(64, 64, &config) else {
        return;
    };
    let mut renderer = BatchRenderer::new(
        config,
        &backend,
        Box::new(backend.shader(PipelineKind::Entity)),
        Box::new(backend.shader(PipelineKind::Terrain)),
    );
    let mut store = GeometryStore::new(backend);
    let quad = store
        .upload(&mesh::parse_obj(common::test_utils::QUAD_OBJ).unwrap())
        .unwrap();
    let white = store
        .upload_texture(&TextureData::solid(2, 2, [255, 255, 255, 255]))
        .unwrap();
    let light = Light::white(Vector3::new(0.0, 0.0, 10.0));

    renderer.begin_frame();
    renderer
        .submit(
            &store,
            &SceneInstance::at(MaterialBinding::new(quad, white), Vector3::new(0.0, 0.0, -2.0)),
        )
        .unwrap();
    renderer.flush(&mut store, &light, &Camera::default()).unwrap();
    store.backend_mut().discard_frame();

    renderer.begin_frame();
    renderer.flush(&mut store, &light, &Camera::default()).unwrap();
    store.backend_mut().present().unwrap();

    let image = futures::executor::block_on(store.backend().capture()).unwrap();
    assert!(image.pixels.chunks(4).all(|p| p == [0, 0, 0, 255]));
}
