use cgmath::Vector3;

/// The point light of a frame: where it is and what colour it emits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vector3<f32>,
    pub colour: Vector3<f32>,
}

impl Light {
    pub fn new(position: Vector3<f32>, colour: Vector3<f32>) -> Self {
        Self { position, colour }
    }

    /// A white light at `position`.
    pub fn white(position: Vector3<f32>) -> Self {
        Self::new(position, Vector3::new(1.0, 1.0, 1.0))
    }
}
