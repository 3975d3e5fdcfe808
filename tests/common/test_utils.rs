#![allow(dead_code)]

use std::path::{Path, PathBuf};

use batch_ngin::{
    backend::headless::{CallLog, HeadlessBackend, HeadlessShader},
    BatchRenderer, GeometryStore, RendererConfig,
};

/// A unit quad in the XY plane facing +Z, as two triangles.
pub const QUAD_OBJ: &str = "\
# quad
v -0.5 -0.5 0.0
v 0.5 -0.5 0.0
v 0.5 0.5 0.0
v -0.5 0.5 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

/// A single triangle.
pub const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

/// A fresh asset directory under the system temp dir, unique per test name.
pub fn asset_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("batch_ngin_test_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_asset(dir: &Path, file_name: &str, contents: impl AsRef<[u8]>) {
    std::fs::write(dir.join(file_name), contents).unwrap();
}

/// Encode a solid-colour PNG into `dir`.
pub fn write_png(dir: &Path, file_name: &str, width: u32, height: u32, rgba: [u8; 4]) {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    image.save(dir.join(file_name)).unwrap();
}

pub struct Headless {
    pub log: CallLog,
    pub store: GeometryStore<HeadlessBackend>,
    pub renderer: BatchRenderer,
    pub config: RendererConfig,
}

/// A renderer, store and shared call log on a 1280x720 headless display.
pub fn headless(config: RendererConfig) -> Headless {
    batch_ngin::logging::init_for_tests();
    let log = CallLog::new();
    let backend = HeadlessBackend::with_log(log.clone(), 1280, 720);
    let renderer = BatchRenderer::new(
        config.clone(),
        &backend,
        Box::new(HeadlessShader::new("entity", log.clone())),
        Box::new(HeadlessShader::new("terrain", log.clone())),
    );
    Headless {
        log,
        store: GeometryStore::new(backend),
        renderer,
        config,
    }
}

#[cfg(feature = "integration-tests")]
pub fn gpu(width: u32, height: u32, config: &RendererConfig) -> Option<batch_ngin::backend::gpu::GpuBackend> {
    batch_ngin::logging::init_for_tests();
    match futures::executor::block_on(batch_ngin::context::Context::headless(width, height)) {
        Ok(context) => Some(batch_ngin::backend::gpu::GpuBackend::new(context, config)),
        Err(e) => {
            log::warn!("Skipping GPU test: {:#}", e);
            None
        }
    }
}
