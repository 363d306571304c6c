use noise::core::worley::ReturnType;
use noise::{NoiseFn, Worley};
use rayon::prelude::*;

use crate::compute::{ComputeBackend, FieldDesc, FieldId};
use crate::error::EngineResult;
use crate::field::cell_count;

/// Cell frequency of the detail pattern across the unit cube
pub const DETAIL_FREQUENCY: f64 = 8.0;

/// Inverted Worley distance field that erodes cloud edges
pub struct CloudDetail {
    dims: [u32; 3],
    seed: u32,
    field: FieldId,
}

impl CloudDetail {
    pub fn new(backend: &mut dyn ComputeBackend, dims: [u32; 3], seed: u32) -> EngineResult<Self> {
        let field = backend.create_field(FieldDesc::scalar("volume.worley", dims))?;
        Ok(Self { dims, seed, field })
    }

    pub fn dims(&self) -> [u32; 3] {
        self.dims
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    /// Generate the pattern on the CPU and upload it
    pub fn compute(&self, backend: &mut dyn ComputeBackend) -> EngineResult<()> {
        let data = generate(self.dims, self.seed);
        backend.write_field(self.field, &data)?;
        log::info!(
            "[CloudDetail] Uploaded {:?} Worley detail field (seed {})",
            self.dims,
            self.seed
        );
        Ok(())
    }
}

/// Detail values in [0, 1], flat with x fastest; 1 at feature points
pub fn generate(dims: [u32; 3], seed: u32) -> Vec<f32> {
    let [nx, ny, _] = dims;
    let slice_len = nx as usize * ny as usize;
    let mut data = vec![0.0f32; cell_count(dims)];
    if slice_len == 0 {
        return data;
    }
    let extent = |n: u32| n.max(1) as f64;

    data.par_chunks_mut(slice_len)
        .enumerate()
        .for_each(|(z, slice)| {
            // Worley keeps its distance function behind an Rc, so one per slice
            let worley = Worley::new(seed)
                .set_return_type(ReturnType::Distance)
                .set_frequency(DETAIL_FREQUENCY);
            let w = z as f64 / extent(dims[2]);
            for (i, value) in slice.iter_mut().enumerate() {
                let u = (i % nx as usize) as f64 / extent(nx);
                let v = (i / nx as usize) as f64 / extent(ny);
                let distance = worley.get([u, v, w]) * 0.5 + 0.5;
                *value = (1.0 - distance).clamp(0.0, 1.0) as f32;
            }
        });
    data
}
