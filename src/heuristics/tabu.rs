//! Tabu search for the CVRP.
//!
//! Deterministic local search over intra-route swaps:
//! - the initial solution packs clients in ascending id order, first fit
//! - every iteration enumerates all interior position swaps inside each
//!   route, skipping candidates whose client pair is currently tabu
//! - the walk always moves to the best candidate, even when it is worse
//!   than the incumbent (no aspiration criterion); the best solution seen
//!   is tracked separately
//! - after each move the consecutive pairs of the new solution enter a
//!   FIFO queue capped at the tenure
//!
//! The engine owns no randomness: two runs on the same instance produce
//! the same result.

use crate::instance::CvrpInstance;
use crate::solution::Solution;
use log::debug;
use ordered_float::OrderedFloat;
use std::collections::VecDeque;

/// Tabu search configuration
#[derive(Debug, Clone)]
pub struct TabuConfig {
    /// Tabu tenure (maximum queue length)
    pub tenure: usize,
    /// Number of iterations
    pub iterations: usize,
}

impl Default for TabuConfig {
    fn default() -> Self {
        TabuConfig {
            tenure: 10,
            iterations: 500,
        }
    }
}

/// Tabu search engine
pub struct TabuSearch {
    config: TabuConfig,
    instance: CvrpInstance,
    tabu_list: VecDeque<(usize, usize)>,
}

impl TabuSearch {
    pub fn new(instance: CvrpInstance, config: TabuConfig) -> Self {
        TabuSearch {
            config,
            instance,
            tabu_list: VecDeque::new(),
        }
    }

    /// Walk the neighborhood for the configured number of iterations and
    /// return the best solution encountered
    pub fn run(&mut self) -> Solution {
        let mut current = self.initial_solution();
        let mut best = current.clone();
        let mut best_distance = best.total_distance(&self.instance);

        for iteration in 0..self.config.iterations {
            let neighborhood = self.generate_neighborhood(&current);
            if neighborhood.is_empty() {
                debug!("[tabu] iteration {iteration}: neighborhood exhausted");
                break;
            }

            let best_neighbor = neighborhood
                .into_iter()
                .min_by_key(|candidate| OrderedFloat(candidate.total_distance(&self.instance)))
                .expect("neighborhood is not empty");

            let distance = best_neighbor.total_distance(&self.instance);
            if distance < best_distance {
                best = best_neighbor.clone();
                best_distance = distance;
                debug!("[tabu] iteration {iteration}: new best {distance:.2}");
            }

            // the walk follows the best candidate even when it is worse
            current = best_neighbor;
            self.update_tabu_list(&current);
        }

        best
    }

    /// Pack clients in ascending id order, first fit
    fn initial_solution(&self) -> Solution {
        let mut routes = Vec::new();
        let mut route = vec![0];
        let mut load = 0.0;

        for client in self.instance.clients() {
            let demand = self.instance.demand(client);
            if load + demand <= self.instance.capacity {
                route.push(client);
                load += demand;
            } else {
                route.push(0);
                routes.push(route);
                route = vec![0, client];
                load = demand;
            }
        }
        if route.len() > 1 {
            route.push(0);
            routes.push(route);
        }
        Solution::from_routes(routes)
    }

    /// All feasible intra-route interior swaps whose client pair is not
    /// currently tabu; each candidate is a deep copy of the solution with
    /// one swap applied
    fn generate_neighborhood(&self, solution: &Solution) -> Vec<Solution> {
        let mut neighborhood = Vec::new();

        for (r, route) in solution.routes.iter().enumerate() {
            for i in 1..route.len() - 1 {
                for j in (i + 1)..route.len() - 1 {
                    if self.tabu_list.contains(&(route[i], route[j])) {
                        continue;
                    }
                    let mut candidate = solution.clone();
                    candidate.routes[r].swap(i, j);
                    if candidate.is_feasible(&self.instance) {
                        neighborhood.push(candidate);
                    }
                }
            }
        }

        neighborhood
    }

    /// Enqueue every consecutive pair of every route, starting at the first
    /// client (the leading depot edge is skipped, the trailing edge into
    /// the depot is not); oldest entries leave once the tenure is exceeded
    fn update_tabu_list(&mut self, solution: &Solution) {
        for route in &solution.routes {
            for i in 1..route.len() - 1 {
                self.tabu_list.push_back((route[i], route[i + 1]));
                if self.tabu_list.len() > self.config.tenure {
                    self.tabu_list.pop_front();
                }
            }
        }
    }
}
