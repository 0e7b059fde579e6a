/// Canopy layers, bottom to top. A layer shows once regrowth reaches its
/// threshold; `half_blocks` is its half-width in canopy blocks.
pub const LAYERS: [CanopyLayer; 6] = [
    CanopyLayer { threshold: 0.2, height_blocks: 6, half_blocks: 5 },
    CanopyLayer { threshold: 0.4, height_blocks: 7, half_blocks: 4 },
    CanopyLayer { threshold: 0.6, height_blocks: 8, half_blocks: 3 },
    CanopyLayer { threshold: 0.8, height_blocks: 9, half_blocks: 2 },
    CanopyLayer { threshold: 0.95, height_blocks: 10, half_blocks: 1 },
    CanopyLayer { threshold: 1.0, height_blocks: 11, half_blocks: 0 },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanopyLayer {
    pub threshold: f32,
    /// Height of the layer above ground, in blocks.
    pub height_blocks: u8,
    pub half_blocks: u8,
}

/// Layers visible at `progress`. Leafy trees should pass 1.0.
pub fn canopy_layers(progress: f32) -> &'static [CanopyLayer] {
    let count = LAYERS.iter().take_while(|l| progress >= l.threshold).count();
    &LAYERS[..count]
}
