use glam::Vec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Entries in one period of the permutation table
pub const PERMUTATION_SIZE: usize = 256;

/// Gradient directions: cube edge midpoints
const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Perlin gradient noise over a permutation table.
///
/// A plain value: pass it to whatever needs noise. The same table is
/// uploaded to the GPU so the WGSL kernels evaluate identical noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientNoise {
    /// Permutation repeated twice so `perm[i + perm[j]]` never wraps
    perm: Vec<u8>,
}

impl Default for GradientNoise {
    fn default() -> Self {
        Self::identity()
    }
}

impl GradientNoise {
    /// Identity permutation (`perm[i] = i`)
    pub fn identity() -> Self {
        let table: Vec<u8> = (0..PERMUTATION_SIZE).map(|i| i as u8).collect();
        Self::from_table(&table)
    }

    /// Permutation shuffled deterministically from `seed`
    pub fn seeded(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..PERMUTATION_SIZE).map(|i| i as u8).collect();
        table.shuffle(&mut StdRng::seed_from_u64(seed));
        Self::from_table(&table)
    }

    /// Rebuild from an uploaded permutation field
    pub fn from_permutation_field(data: &[f32]) -> Self {
        let table: Vec<u8> = data
            .iter()
            .take(PERMUTATION_SIZE)
            .map(|&v| v as u8)
            .collect();
        Self::from_table(&table)
    }

    fn from_table(table: &[u8]) -> Self {
        let mut perm = Vec::with_capacity(PERMUTATION_SIZE * 2);
        perm.extend_from_slice(table);
        perm.extend_from_slice(table);
        Self { perm }
    }

    /// Noise at `p`, roughly in [-1, 1]; zero at integer lattice points
    pub fn sample(&self, p: Vec3) -> f32 {
        self.sample_periodic(p, PERMUTATION_SIZE as u32)
    }

    /// Noise whose lattice repeats every `period` units on each axis
    pub fn sample_periodic(&self, p: Vec3, period: u32) -> f32 {
        let base = p.floor();
        let f = p - base;

        let period = period.max(1) as i64;
        let wrap = |v: f32| ((v as i64).rem_euclid(period) as usize) & (PERMUTATION_SIZE - 1);
        let (x0, y0, z0) = (wrap(base.x), wrap(base.y), wrap(base.z));
        let (x1, y1, z1) = (wrap(base.x + 1.0), wrap(base.y + 1.0), wrap(base.z + 1.0));

        let corner = |x: usize, y: usize, z: usize, d: Vec3| {
            let hash = self.perm[x + self.perm[y + self.perm[z] as usize] as usize] as usize;
            let g = GRAD3[hash % 12];
            g[0] * d.x + g[1] * d.y + g[2] * d.z
        };

        let n000 = corner(x0, y0, z0, f);
        let n100 = corner(x1, y0, z0, f - Vec3::X);
        let n010 = corner(x0, y1, z0, f - Vec3::Y);
        let n110 = corner(x1, y1, z0, f - Vec3::X - Vec3::Y);
        let n001 = corner(x0, y0, z1, f - Vec3::Z);
        let n101 = corner(x1, y0, z1, f - Vec3::X - Vec3::Z);
        let n011 = corner(x0, y1, z1, f - Vec3::Y - Vec3::Z);
        let n111 = corner(x1, y1, z1, f - Vec3::ONE);

        let u = Vec3::new(fade(f.x), fade(f.y), fade(f.z));
        let lerp = |a: f32, b: f32, t: f32| a + t * (b - a);

        let nx00 = lerp(n000, n100, u.x);
        let nx10 = lerp(n010, n110, u.x);
        let nx01 = lerp(n001, n101, u.x);
        let nx11 = lerp(n011, n111, u.x);
        lerp(lerp(nx00, nx10, u.y), lerp(nx01, nx11, u.y), u.z)
    }

    /// Permutation table as a field payload (512 entries)
    pub fn permutation_field(&self) -> Vec<f32> {
        self.perm.iter().map(|&v| v as f32).collect()
    }
}

/// 6t^5 - 15t^4 + 10t^3
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}
