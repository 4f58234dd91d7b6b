//! Synthetic client identifiers.

use uuid::Builder;

use crate::load_balancer::random::RandomSource;

/// Largest population that maps onto distinct `10.x.y.z` tokens.
pub const MAX_CLIENT_POPULATION: u32 = 0x00ff_ffff;

/// Generates the client identifier for each simulated request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIdGenerator {
    population: Option<u32>,
}

impl ClientIdGenerator {
    /// `None` yields a fresh random token per call; `Some(n)` draws from
    /// `n` stable address-like tokens.
    pub fn new(population: Option<u32>) -> Self {
        Self { population }
    }

    pub fn generate(&self, rng: &mut dyn RandomSource) -> String {
        match self.population {
            Some(n) if n > 0 => {
                let i = rng.next_index(n as usize) as u32 + 1;
                format!("10.{}.{}.{}", (i >> 16) & 0xff, (i >> 8) & 0xff, i & 0xff)
            }
            _ => {
                let mut bytes = [0u8; 16];
                bytes[..8].copy_from_slice(&rng.next_u64().to_le_bytes());
                bytes[8..].copy_from_slice(&rng.next_u64().to_le_bytes());
                Builder::from_random_bytes(bytes).into_uuid().to_string()
            }
        }
    }
}
