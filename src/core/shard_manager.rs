/*!
 * Shard Sizing
 *
 * CPU-topology-aware shard count calculation for the scoreboard. Scales
 * the number of independently locked shards with the core count so that
 * well-distributed keys rarely contend.
 *
 * # Design: Pure Functions Over Singleton
 *
 * No cached global: `available_parallelism` is cheap enough to call at
 * construction time, and keeping these as pure functions keeps them
 * trivially testable.
 */

use super::limits::{MAX_AUTO_SHARDS, MIN_AUTO_SHARDS};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Hardware-aware shard configuration (pure functions)
pub struct ShardManager;

impl ShardManager {
    /// Number of CPUs available to this process
    #[inline]
    pub fn cpu_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to detect CPU count, defaulting to 8");
                8
            })
    }

    /// Shard count for a given workload profile
    ///
    /// Always a power of two in `MIN_AUTO_SHARDS..=MAX_AUTO_SHARDS`.
    #[inline]
    pub fn shards(profile: WorkloadProfile) -> usize {
        Self::shards_for(Self::cpu_count(), profile)
    }

    /// Shard count for an explicit CPU count
    #[inline]
    pub fn shards_for(cpus: usize, profile: WorkloadProfile) -> usize {
        let multiplier = match profile {
            // Many writers hammering many keys (per-client request tallies)
            WorkloadProfile::HighContention => 4,
            WorkloadProfile::MediumContention => 2,
            // Occasional updates; extra shards would only cost memory
            WorkloadProfile::LowContention => 1,
        };

        (cpus.max(1) * multiplier)
            .next_power_of_two()
            .clamp(MIN_AUTO_SHARDS, MAX_AUTO_SHARDS)
    }
}

/// Workload characterization for shard count calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadProfile {
    /// Shard count: 4x CPU cores
    HighContention,

    /// Shard count: 2x CPU cores
    #[default]
    MediumContention,

    /// Shard count: 1x CPU cores
    LowContention,
}
