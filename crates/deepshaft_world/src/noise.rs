//! # Seeds and Simplex Noise
//!
//! Everything random in the shaft is derived from one [`WorldSeed`]:
//!
//! - smooth 2-D simplex noise for spatially correlated ore veins,
//! - per-tile and per-chunk RNG seeds so a chunk regenerates identically
//!   no matter when, or how often, it is materialized.
//!
//! Given the same `WorldSeed`, every value here is identical on every
//! platform and every run.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// World seed for deterministic generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives an independent sub-seed for a specific purpose.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        Self(mix64(self.0 ^ purpose.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    /// Seed for the single fresh draw made when generating tile `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn for_tile(self, x: i32, y: i32) -> Self {
        self.derive(pack_pair(x, y))
    }

    /// Seed for the chunk-level passes (caves, hazards) of chunk `(cx, cy)`.
    #[inline]
    #[must_use]
    pub const fn for_chunk(self, cx: i32, cy: i32) -> Self {
        self.derive(0xC4A7_0000_0000_0000 ^ pack_pair(cx, cy))
    }

    /// Builds a ChaCha RNG seeded from this value.
    #[must_use]
    pub fn rng(self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0x5EED_CAFE_BABE_D00D)
    }
}

/// SplitMix64 finalizer.
#[inline]
const fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
const fn pack_pair(a: i32, b: i32) -> u64 {
    ((a as u32 as u64) << 32) | (b as u32 as u64)
}

/// Seeded permutation table shared by all samples of one noise instance.
struct PermutationTable {
    /// 256 shuffled entries, doubled so lookups never wrap.
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient directions for 2-D simplex noise.
    const GRADIENTS: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64; the state is pre-mixed so a zero seed
        // still shuffles.
        let mut state = mix64(seed.value()) | 1;
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        let (low, high) = perm.split_at_mut(256);
        high.copy_from_slice(low);

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> usize {
        self.perm[index & 511] as usize
    }

    #[inline]
    fn gradient(&self, hash: usize) -> [i8; 2] {
        Self::GRADIENTS[hash % 12]
    }
}

/// 2-D simplex noise generator.
///
/// Produces smooth values in `[-1, 1]`; nearby inputs give nearby outputs,
/// which is what turns per-tile ore rolls into veins instead of static.
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid: (sqrt(3) - 1) / 2.
    const F2: f64 = 0.366_025_403_784_439;
    /// Unskewing factor for 2D simplex grid: (3 - sqrt(3)) / 6.
    const G2: f64 = 0.211_324_865_405_187;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples noise at `(x, y)`, returning a value in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle of the skewed cell.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let i1 = i1 as usize;
        let j1 = j1 as usize;

        let table = &self.perm_table;
        let g0 = table.get(ii + table.get(jj));
        let g1 = table.get(ii + i1 + table.get(jj + j1));
        let g2 = table.get(ii + 1 + table.get(jj + 1));

        let n = self.corner(x0, y0, g0) + self.corner(x1, y1, g1) + self.corner(x2, y2, g2);

        // 70 normalizes the corner sum to [-1, 1].
        (70.0 * n).clamp(-1.0, 1.0)
    }

    /// Contribution of one simplex corner.
    #[inline]
    fn corner(&self, x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let [gx, gy] = self.perm_table.gradient(hash);
            let t2 = t * t;
            t2 * t2 * (x * f64::from(gx) + y * f64::from(gy))
        }
    }

    /// Fractal noise: `octaves` layers, each `lacunarity` times the frequency
    /// and `persistence` times the amplitude of the previous one.
    ///
    /// Normalized back to `[-1, 1]`.
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }

    /// Octaved noise remapped to `[0, 1]`.
    #[must_use]
    pub fn unit(&self, x: f64, y: f64, octaves: u32) -> f64 {
        ((self.octaved(x, y, octaves, 0.5, 2.0) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}
