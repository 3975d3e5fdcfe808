mod common;

use batch_ngin::{
    resources::{load_obj, load_obj_model, load_texture},
    RenderError, RendererConfig,
};
use common::test_utils::{asset_dir, headless, write_asset, write_png, QUAD_OBJ};

#[tokio::test]
async fn loads_and_uploads_an_obj_model() {
    let dir = asset_dir("loads_obj");
    write_asset(&dir, "quad.obj", QUAD_OBJ);
    let config = RendererConfig::new().with_asset_dir(&dir);
    let mut h = headless(config.clone());

    let mesh = load_obj_model(&mut h.store, &config, "quad.obj").await.unwrap();

    assert_eq!(mesh.element_count(), 6);
    assert!(mesh.is_indexed());
    assert!(h.store.is_live_mesh(mesh));
    // positions, texture coordinates, normals and indices
    assert_eq!(h.log.live_buffers(), 4);
}

#[tokio::test]
async fn texture_v_is_flipped_on_load() {
    let dir = asset_dir("flips_v");
    write_asset(&dir, "quad.obj", QUAD_OBJ);
    let config = RendererConfig::new().with_asset_dir(&dir);

    let mesh = load_obj(&config, "quad.obj").await.unwrap();
    // vertex 3 references vt (1, 1)
    assert_eq!(&mesh.tex_coords[4..6], &[1.0, 0.0]);
    assert_eq!(&mesh.normals[0..3], &[0.0, 0.0, 1.0]);
}

#[tokio::test]
async fn missing_mesh_reports_the_path() {
    let dir = asset_dir("missing_mesh");
    let config = RendererConfig::new().with_asset_dir(&dir);
    let mut h = headless(config.clone());

    let err = load_obj_model(&mut h.store, &config, "nope.obj")
        .await
        .unwrap_err();

    match err {
        RenderError::AssetNotFound { path } => assert_eq!(path, dir.join("nope.obj")),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(h.log.live_buffers(), 0);
}

#[tokio::test]
async fn malformed_face_reports_its_line() {
    let dir = asset_dir("malformed");
    write_asset(
        &dir,
        "broken.obj",
        "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 9/1/1\n",
    );
    let config = RendererConfig::new().with_asset_dir(&dir);
    let mut h = headless(config.clone());

    let err = load_obj_model(&mut h.store, &config, "broken.obj")
        .await
        .unwrap_err();

    assert!(matches!(err, RenderError::Parse { line: 6, .. }), "{err}");
    assert_eq!(h.store.live_meshes(), 0);
}

#[tokio::test]
async fn loads_a_png_texture() {
    let dir = asset_dir("loads_png");
    write_png(&dir, "grass.png", 4, 2, [0, 200, 0, 255]);
    let config = RendererConfig::new().with_asset_dir(&dir);
    let mut h = headless(config.clone());

    let texture = load_texture(&mut h.store, &config, "grass.png").await.unwrap();

    assert!(h.store.is_live_texture(texture));
    assert_eq!(h.log.live_textures(), 1);
}

#[tokio::test]
async fn undecodable_texture_is_a_resource_error() {
    let dir = asset_dir("bad_png");
    write_asset(&dir, "bad.png", b"definitely not a png");
    let config = RendererConfig::new().with_asset_dir(&dir);
    let mut h = headless(config.clone());

    let err = load_texture(&mut h.store, &config, "bad.png").await.unwrap_err();

    assert!(matches!(err, RenderError::Resource(_)));
    assert_eq!(h.store.live_textures(), 0);
}
