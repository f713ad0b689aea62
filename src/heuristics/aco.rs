//! Ant colony optimization for the CVRP.
//!
//! Every iteration each ant builds a full solution route by route: the next
//! client is drawn by roulette wheel with weight
//! pheromone^alpha * (1/distance)^beta, and a route closes when the drawn
//! client no longer fits the remaining capacity (the client stays unvisited
//! for a later route). After all ants have finished, every trail evaporates
//! and every ant deposits 1/distance on the directed edges it travelled
//! (non-elitist update).

use crate::instance::CvrpInstance;
use crate::matrix::SquareMatrix;
use crate::solution::Solution;
use log::debug;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Ant colony configuration parameters
#[derive(Debug, Clone)]
pub struct AntColonyConfig {
    /// Number of ants per iteration
    pub num_ants: usize,
    /// Number of iterations
    pub iterations: usize,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Evaporation rate (rho)
    pub evaporation_rate: f64,
    /// Initial pheromone level
    pub initial_pheromone: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for AntColonyConfig {
    fn default() -> Self {
        AntColonyConfig {
            num_ants: 20,
            iterations: 100,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.1,
            initial_pheromone: 1.0,
            seed: 42,
        }
    }
}

/// Ant colony engine
pub struct AntColonySearch {
    config: AntColonyConfig,
    instance: CvrpInstance,
    pheromone: SquareMatrix,
    heuristic: SquareMatrix,
    best_solution: Option<Solution>,
    best_distance: f64,
    rng: ChaCha8Rng,
}

impl AntColonySearch {
    pub fn new(instance: CvrpInstance, config: AntColonyConfig) -> Self {
        let n = instance.dimension();
        let pheromone = SquareMatrix::filled(n, config.initial_pheromone);

        // Heuristic information: inverse distance, with a large finite
        // weight standing in for zero-distance pairs
        let mut heuristic = SquareMatrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dist = instance.distance(i, j);
                    heuristic.set(i, j, if dist > 0.0 { 1.0 / dist } else { 1e6 });
                }
            }
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        AntColonySearch {
            config,
            instance,
            pheromone,
            heuristic,
            best_solution: None,
            best_distance: f64::INFINITY,
            rng,
        }
    }

    /// Run all iterations and return the best solution any ant produced
    pub fn run(&mut self) -> Solution {
        for iteration in 0..self.config.iterations {
            let mut ant_solutions = Vec::with_capacity(self.config.num_ants);

            for _ in 0..self.config.num_ants {
                let solution = self.construct_solution();
                let distance = solution.total_distance(&self.instance);
                if distance < self.best_distance {
                    self.best_distance = distance;
                    self.best_solution = Some(solution.clone());
                }
                ant_solutions.push(solution);
            }

            self.update_pheromones(&ant_solutions);

            if (iteration + 1) % 10 == 0 {
                debug!(
                    "[aco] iteration {}: best distance {:.2}",
                    iteration + 1,
                    self.best_distance
                );
            }
        }

        self.best_solution.clone().unwrap_or_default()
    }

    /// Construct one ant's solution route by route
    fn construct_solution(&mut self) -> Solution {
        let mut visited = vec![false; self.instance.dimension()];
        visited[0] = true;
        let mut remaining = self.instance.num_clients;
        let mut routes = Vec::new();

        while remaining > 0 {
            let mut route = vec![0];
            let mut current = 0;
            let mut load = 0.0;

            while let Some(next) = self.select_next_client(current, &visited) {
                let demand = self.instance.demand(next);
                if load + demand > self.instance.capacity {
                    // drawn client does not fit; leave it for a later route
                    break;
                }
                route.push(next);
                visited[next] = true;
                load += demand;
                current = next;
                remaining -= 1;
            }

            route.push(0);
            routes.push(route);
        }

        Solution::from_routes(routes)
    }

    /// Roulette-wheel draw over unvisited clients, scanned in ascending id.
    /// Falls back to the last candidate when rounding (or a fully
    /// underflowed wheel) exhausts the probability mass.
    fn select_next_client(&mut self, current: usize, visited: &[bool]) -> Option<usize> {
        let mut candidates: Vec<(usize, f64)> = Vec::new();
        for j in self.instance.clients() {
            if visited[j] {
                continue;
            }
            let tau = self.pheromone.get(current, j).powf(self.config.alpha);
            let eta = self.heuristic.get(current, j).powf(self.config.beta);
            candidates.push((j, tau * eta));
        }

        if candidates.is_empty() {
            return None;
        }

        let total: f64 = candidates.iter().map(|&(_, weight)| weight).sum();
        if total <= 0.0 {
            return candidates.last().map(|&(j, _)| j);
        }

        let mut pick = self.rng.gen::<f64>() * total;
        for &(j, weight) in &candidates {
            pick -= weight;
            if pick <= 0.0 {
                return Some(j);
            }
        }

        candidates.last().map(|&(j, _)| j)
    }

    /// Evaporate every trail, then let every ant deposit 1/distance on the
    /// directed edges it travelled
    fn update_pheromones(&mut self, solutions: &[Solution]) {
        self.pheromone.scale_all(1.0 - self.config.evaporation_rate);

        for solution in solutions {
            let distance = solution.total_distance(&self.instance);
            if distance <= 0.0 {
                continue;
            }
            let deposit = 1.0 / distance;
            for route in &solution.routes {
                for leg in route.windows(2) {
                    self.pheromone.add(leg[0], leg[1], deposit);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_instance() -> CvrpInstance {
        let mut distances = SquareMatrix::zeros(3);
        for &(i, j, d) in &[(0usize, 1usize, 2.0), (0, 2, 3.0), (1, 2, 4.0)] {
            distances.set(i, j, d);
            distances.set(j, i, d);
        }
        CvrpInstance::new("tiny", 2, 2, 10.0, vec![5.0, 5.0], distances).unwrap()
    }

    fn create_line_instance() -> CvrpInstance {
        let n = 6;
        let mut distances = SquareMatrix::zeros(n + 1);
        for i in 0..=n {
            for j in 0..=n {
                distances.set(i, j, (i as f64 - j as f64).abs());
            }
        }
        CvrpInstance::new("line", n, 3, 10.0, vec![4.0; n], distances).unwrap()
    }

    #[test]
    fn test_finds_single_route_on_tiny_instance() {
        let instance = create_test_instance();
        let config = AntColonyConfig {
            num_ants: 5,
            iterations: 10,
            ..Default::default()
        };
        let mut aco = AntColonySearch::new(instance.clone(), config);
        let best = aco.run();
        assert_eq!(best.num_routes(), 1);
        assert!((best.total_distance(&instance) - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_heavy_clients_end_up_on_separate_routes() {
        let mut distances = SquareMatrix::zeros(3);
        for &(i, j, d) in &[(0usize, 1usize, 2.0), (0, 2, 3.0), (1, 2, 4.0)] {
            distances.set(i, j, d);
            distances.set(j, i, d);
        }
        let instance =
            CvrpInstance::new("heavy", 2, 2, 10.0, vec![6.0, 6.0], distances).unwrap();
        let config = AntColonyConfig {
            num_ants: 5,
            iterations: 10,
            ..Default::default()
        };
        let mut aco = AntColonySearch::new(instance.clone(), config);
        let best = aco.run();
        assert_eq!(best.num_routes(), 2);
        assert!(best.is_feasible(&instance));
        assert!(best.is_complete(&instance));
    }

    #[test]
    fn test_evaporation_scales_every_trail() {
        let instance = create_test_instance();
        let config = AntColonyConfig::default();
        let rate = config.evaporation_rate;
        let initial = config.initial_pheromone;
        let mut aco = AntColonySearch::new(instance, config);

        // no ants deposited anything, so every entry shrinks by (1 - rate)
        aco.update_pheromones(&[]);
        for entry in aco.pheromone.entries() {
            assert!((entry - initial * (1.0 - rate)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_deposit_follows_travel_direction() {
        let instance = create_test_instance();
        let mut aco = AntColonySearch::new(instance, AntColonyConfig::default());
        let solution = Solution::from_routes(vec![vec![0, 1, 2, 0]]);
        aco.update_pheromones(&[solution]);
        // the ant went 1 -> 2, never 2 -> 1
        assert!(aco.pheromone.get(1, 2) > aco.pheromone.get(2, 1));
    }

    #[test]
    fn test_result_is_complete_and_feasible() {
        let instance = create_line_instance();
        let config = AntColonyConfig {
            num_ants: 10,
            iterations: 30,
            ..Default::default()
        };
        let mut aco = AntColonySearch::new(instance.clone(), config);
        let best = aco.run();
        assert!(best.is_complete(&instance));
        assert!(best.is_feasible(&instance));
        assert!(best.is_well_formed());
    }

    #[test]
    fn test_same_seed_same_result() {
        let instance = create_line_instance();
        let config = AntColonyConfig {
            num_ants: 8,
            iterations: 15,
            seed: 99,
            ..Default::default()
        };
        let mut first = AntColonySearch::new(instance.clone(), config.clone());
        let mut second = AntColonySearch::new(instance, config);
        assert_eq!(first.run().routes, second.run().routes);
    }
}
