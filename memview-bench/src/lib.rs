use memview::prelude::v1::*;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng as CurRng;

pub const PARTICLE_SIZE: usize = 0x20;

/// Layout of [`Particle`] for the dynamic benchmarks.
pub const PARTICLE_LAYOUT: &str = r#"
[[view]]
name = "Particle"
size = 0x20

  [[view.field]]
  name = "id"
  type = "u32"
  offset = 0

  [[view.field]]
  name = "mass"
  type = "f32"
  offset = 4

  [[view.field]]
  name = "position"
  type = "[f32; 3]"
  offset = 8

  [[view.field]]
  name = "next"
  type = "*mut Particle"
  offset = 0x18
"#;

#[derive(View)]
#[view(size = 0x20)]
pub struct Particle {
    #[field(base)]
    pub base: Address,
    #[field(offset = 0x0)]
    pub id: Field<u32>,
    #[field(offset = 0x4)]
    pub mass: Field<f32>,
    #[field(offset = 0x8)]
    pub position: Field<[f32; 3]>,
    #[field(offset = 0x18)]
    pub next: Field<Ptr<Particle>>,
}

/// Mirror of [`Particle`] used as the raw pointer baseline.
#[repr(C)]
pub struct RawParticle {
    pub id: u32,
    pub mass: f32,
    pub position: [f32; 3],
    pub pad: u32,
    pub next: *mut RawParticle,
}

/// Backing storage of `count` particles chained into a ring.
pub struct ParticlePool {
    // keeps the particles alive, they are reached through `base`
    _storage: Vec<u64>,
    base: Address,
    count: usize,
}

impl ParticlePool {
    pub fn new(count: usize, seed: u64) -> Self {
        let mut storage = vec![0u64; count * PARTICLE_SIZE / 8];
        let base = Address::from(storage.as_mut_ptr());
        let pool = Self {
            _storage: storage,
            base,
            count,
        };

        let mut rng = CurRng::seed_from_u64(seed);
        for i in 0..count {
            let mut particle = pool.particle(i);
            particle.id.set(i as u32);
            particle.mass.set(rng.gen_range(0.5..2.0));
            for mut coord in particle.position.elements() {
                coord.set(rng.gen_range(-100.0..100.0));
            }
            let next = pool.address_of((i + 1) % count);
            particle.next.point_to(next);
        }

        pool
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn address_of(&self, i: usize) -> Address {
        self.base + i * PARTICLE_SIZE
    }

    pub fn particle(&self, i: usize) -> Particle {
        assert!(i < self.count);
        unsafe { Particle::from_address(self.address_of(i)) }
    }

    pub fn raw(&self, i: usize) -> *mut RawParticle {
        assert!(i < self.count);
        self.address_of(i).as_mut_ptr()
    }

    /// Random particle indices for access patterns that defeat prefetching.
    pub fn random_indices(&self, n: usize, seed: u64) -> Vec<usize> {
        let mut rng = CurRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(0..self.count)).collect()
    }
}

/// Keeps layout loading from logging into the measurements.
pub fn quiet_logs() {
    log::set_max_level(log::Level::Error.to_level_filter());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn pool_matches_raw_layout() {
        assert_eq!(std::mem::size_of::<RawParticle>(), PARTICLE_SIZE);

        let pool = ParticlePool::new(16, 7);
        assert_eq!(pool.len(), 16);

        for i in 0..pool.len() {
            let particle = pool.particle(i);
            let raw = unsafe { &*pool.raw(i) };
            assert_eq!(particle.id, raw.id);
            assert_eq!(particle.mass, raw.mass);
            assert_eq!(particle.position.element(2), raw.position[2]);
            assert_eq!(particle.next.pointer().address(), pool.address_of((i + 1) % 16));
        }
    }

    #[test]
    fn dynamic_layout_matches() {
        let registry = LayoutRegistry::from_toml(PARTICLE_LAYOUT).unwrap();
        let layout = registry.view("Particle").unwrap();
        assert_eq!(layout.size(), Some(Particle::SIZE));
        assert_eq!(layout.len(), 4);
    }
}
