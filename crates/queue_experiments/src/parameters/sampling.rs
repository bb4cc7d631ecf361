use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{ParameterCombination, ParameterSet, ParameterSpace};

impl ParameterSpace {
    /// Generate random parameter sets (Monte Carlo sampling).
    ///
    /// Samples `count` unique combinations from the defined space, each expanded into
    /// `replications` runs. Stops early once the space is exhausted.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        let mut rng = StdRng::seed_from_u64(seed);
        let arrival_scales = self.arrival_scales();
        let tick_rates = self.tick_rates();
        let discount_factors = self.discount_factors();
        let policies = self.policies();

        let mut parameter_sets = Vec::new();
        let mut seen = HashSet::new();
        let mut attempts = 0;
        const MAX_ATTEMPTS: usize = 10000;

        while seen.len() < count && attempts < MAX_ATTEMPTS {
            attempts += 1;
            let combination = ParameterCombination {
                arrival_scale: pick(&arrival_scales, &mut rng),
                tick_rate: pick(&tick_rates, &mut rng),
                discount_factor: pick(&discount_factors, &mut rng),
                policy: pick(&policies, &mut rng),
            };

            let key = format!("{:?}", combination);
            if !seen.insert(key) {
                continue;
            }

            let experiment_id = format!("sample_{}", seen.len() - 1);
            let sample_seed = rng.gen::<u64>();
            for run_id in 0..self.replications {
                parameter_sets.push(ParameterSet::new(
                    self.base.clone(),
                    combination,
                    self.max_events,
                    experiment_id.clone(),
                    run_id,
                    super::replication_seed(sample_seed, run_id),
                ));
            }
        }

        parameter_sets
    }
}

fn pick<T: Copy>(values: &[T], rng: &mut StdRng) -> T {
    values[rng.gen_range(0..values.len())]
}
