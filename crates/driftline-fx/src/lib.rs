//! Driftline FX
//! ============
//!
//! The effects shipped with Driftline. Each module pairs a DSP kernel built
//! from [`driftline_dsp`] primitives with a descriptor table, group metadata
//! and a streaming revision history, wired together through the SDK's
//! [`EffectAdapter`](driftline_fx_sdk::EffectAdapter).

pub mod bloom_chorus;
pub mod drift_delay;
pub mod orbit_phaser;

pub use bloom_chorus::{BloomChorus, BloomChorusFactory};
pub use drift_delay::{DriftDelay, DriftDelayFactory};
pub use orbit_phaser::{OrbitPhaser, OrbitPhaserFactory};

use driftline_stream::EffectCatalog;

/// Builds the catalog of every shipped effect type. Hosts call this once at
/// startup; patch loading resolves effect ids against it.
pub fn catalog() -> EffectCatalog {
    let mut catalog = EffectCatalog::new();
    catalog
        .register(DriftDelayFactory)
        .register(BloomChorusFactory)
        .register(OrbitPhaserFactory);
    catalog
}
