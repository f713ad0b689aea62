//! Adaptive large neighborhood search for the CVRP.
//!
//! Each iteration destroys part of a copy of the current solution by random
//! client removal, repairs it with greedy minimum-delta insertion, and runs
//! the repaired candidate through a simulated-annealing acceptance test.
//! The best solution seen is tracked separately from the accepted current
//! one; the search stops after the iteration budget or a run of
//! non-improving iterations, whichever comes first.

use crate::instance::CvrpInstance;
use crate::solution::Solution;
use log::debug;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// ALNS configuration
#[derive(Debug, Clone)]
pub struct AlnsConfig {
    /// Number of iterations
    pub iterations: usize,
    /// Stop after this many iterations without improving the best
    pub max_no_improvement: usize,
    /// Starting temperature for the acceptance test
    pub initial_temperature: f64,
    /// Geometric cooling factor applied every iteration
    pub cooling_rate: f64,
    /// Removal attempts per destroy phase
    pub destroy_count: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for AlnsConfig {
    fn default() -> Self {
        AlnsConfig {
            iterations: 500,
            max_no_improvement: 250,
            initial_temperature: 30.0,
            cooling_rate: 0.99,
            destroy_count: 3,
            seed: 42,
        }
    }
}

/// ALNS engine
pub struct AlnsSearch {
    config: AlnsConfig,
    instance: CvrpInstance,
    rng: ChaCha8Rng,
}

impl AlnsSearch {
    pub fn new(instance: CvrpInstance, config: AlnsConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        AlnsSearch {
            config,
            instance,
            rng,
        }
    }

    /// Run the destroy/repair loop and return the best solution seen
    pub fn run(&mut self) -> Solution {
        let mut current = self.initial_solution();
        let mut current_distance = current.total_distance(&self.instance);
        let mut best = current.clone();
        let mut best_distance = current_distance;

        let mut temperature = self.config.initial_temperature;
        let mut no_improvement = 0usize;
        let mut iteration = 0usize;

        while iteration < self.config.iterations
            && no_improvement < self.config.max_no_improvement
        {
            let mut candidate = current.clone();
            self.destroy(&mut candidate);
            self.repair(&mut candidate);

            let candidate_distance = candidate.total_distance(&self.instance);
            if candidate.is_feasible(&self.instance)
                && self.accept(candidate_distance, current_distance, temperature)
            {
                current = candidate;
                current_distance = candidate_distance;

                if current_distance < best_distance {
                    best = current.clone();
                    best_distance = current_distance;
                    no_improvement = 0;
                    debug!("[alns] iteration {iteration}: new best {best_distance:.2}");
                } else {
                    no_improvement += 1;
                }
            } else {
                no_improvement += 1;
            }

            temperature *= self.config.cooling_rate;
            iteration += 1;
        }

        best
    }

    /// First fit in ascending id order under the half-load admission rule.
    /// The rule alone can overfill a route once loads are small relative to
    /// the capacity, so the hard capacity bound backs it up; a client no
    /// route admits opens a new single-client route.
    fn initial_solution(&self) -> Solution {
        let mut routes: Vec<Vec<usize>> = Vec::new();

        for client in self.instance.clients() {
            let demand = self.instance.demand(client);
            let admitting = routes.iter().position(|route| {
                let load = self.instance.route_demand(route);
                load / 2.0 + demand <= self.instance.capacity
                    && load + demand <= self.instance.capacity
            });
            match admitting {
                Some(r) => {
                    let route = &mut routes[r];
                    let end = route.len() - 1;
                    route.insert(end, client);
                }
                None => routes.push(vec![0, client, 0]),
            }
        }

        Solution::from_routes(routes)
    }

    /// Make up to `destroy_count` removal attempts, each picking a random
    /// route and, when it still has clients, dropping a random interior
    /// one; routes emptied down to the depot pair are pruned
    fn destroy(&mut self, solution: &mut Solution) {
        for _ in 0..self.config.destroy_count {
            let route_idx = self.rng.gen_range(0..solution.routes.len());
            let route = &mut solution.routes[route_idx];
            if route.len() > 2 {
                let client_idx = self.rng.gen_range(1..route.len() - 1);
                route.remove(client_idx);
            }
        }
        solution.routes.retain(|route| route.len() > 2);
    }

    /// Reinsert every missing client at its globally cheapest position,
    /// ignoring capacity (the acceptance test filters overloads). A client
    /// that finds no position at all — possible when pruning emptied the
    /// partial solution — opens a new route, so completeness is always
    /// restored. Depot-only routes are dropped afterwards.
    fn repair(&self, partial: &mut Solution) {
        for client in self.missing_clients(partial) {
            let mut best_slot: Option<(usize, usize)> = None;
            let mut best_cost = f64::INFINITY;

            for (r, route) in partial.routes.iter().enumerate() {
                for pos in 1..route.len() {
                    let prev = route[pos - 1];
                    let next = route[pos];
                    let cost = self.instance.distance(prev, client)
                        + self.instance.distance(client, next)
                        - self.instance.distance(prev, next);
                    if cost < best_cost {
                        best_cost = cost;
                        best_slot = Some((r, pos));
                    }
                }
            }

            match best_slot {
                Some((r, pos)) => partial.routes[r].insert(pos, client),
                None => partial.routes.push(vec![0, client, 0]),
            }
        }
        partial.routes.retain(|route| route.len() > 2);
    }

    /// Clients absent from the partial solution, in ascending id order
    fn missing_clients(&self, partial: &Solution) -> Vec<usize> {
        let mut present = vec![false; self.instance.dimension()];
        for route in &partial.routes {
            for &node in route {
                present[node] = true;
            }
        }
        self.instance
            .clients()
            .filter(|&client| !present[client])
            .collect()
    }

    /// Metropolis test: an improvement always passes, a worse candidate
    /// passes with probability exp((current - candidate) / temperature)
    fn accept(
        &mut self,
        candidate_distance: f64,
        current_distance: f64,
        temperature: f64,
    ) -> bool {
        if candidate_distance < current_distance {
            return true;
        }
        let probability = ((current_distance - candidate_distance) / temperature).exp();
        self.rng.gen::<f64>() < probability
    }
}
