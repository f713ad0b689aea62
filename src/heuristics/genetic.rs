//! Genetic algorithm for the CVRP.
//!
//! Fully generational scheme:
//! - random shuffle + first-fit packing builds the initial population
//! - tournament selection picks both parents
//! - crossover copies whole routes from one parent and repacks the missing
//!   clients in the other parent's visiting order
//! - mutation swaps two interior positions of one route
//!
//! There is no elitism: each generation replaces the whole population, and
//! the result is the best individual of the final generation.

use crate::instance::CvrpInstance;
use crate::solution::Solution;
use log::debug;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Genetic algorithm configuration
#[derive(Debug, Clone)]
pub struct GeneticConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub generations: usize,
    /// Per-offspring mutation probability
    pub mutation_rate: f64,
    /// Tournament size for parent selection
    pub tournament_size: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            population_size: 100,
            generations: 1000,
            mutation_rate: 0.1,
            tournament_size: 5,
            seed: 42,
        }
    }
}

/// Population member with its cached total distance
#[derive(Debug, Clone)]
struct Individual {
    solution: Solution,
    distance: f64,
}

impl Individual {
    fn new(solution: Solution, instance: &CvrpInstance) -> Self {
        let distance = solution.total_distance(instance);
        Individual { solution, distance }
    }
}

/// Genetic algorithm engine
pub struct GeneticSearch {
    config: GeneticConfig,
    instance: CvrpInstance,
    population: Vec<Individual>,
    rng: ChaCha8Rng,
}

impl GeneticSearch {
    pub fn new(instance: CvrpInstance, config: GeneticConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        GeneticSearch {
            config,
            instance,
            population: Vec::new(),
            rng,
        }
    }

    /// Run the configured number of generations and return the best
    /// individual of the final population
    pub fn run(&mut self) -> Solution {
        self.initialize_population();

        for generation in 0..self.config.generations {
            self.evolve();
            if (generation + 1) % 100 == 0 {
                debug!(
                    "[genetic] generation {}: best distance {:.2}",
                    generation + 1,
                    self.best_of_population().distance
                );
            }
        }

        self.best_of_population().solution.clone()
    }

    /// Fill the population with shuffled first-fit packings
    fn initialize_population(&mut self) {
        self.population.clear();
        for _ in 0..self.config.population_size {
            let mut clients: Vec<usize> = self.instance.clients().collect();
            clients.shuffle(&mut self.rng);
            let solution = Solution::from_routes(self.pack_first_fit(&clients));
            self.population.push(Individual::new(solution, &self.instance));
        }
    }

    /// First-fit packing: append each client to the current route while its
    /// demand still fits, otherwise close the route and open a new one
    fn pack_first_fit(&self, clients: &[usize]) -> Vec<Vec<usize>> {
        let mut routes = Vec::new();
        let mut route = vec![0];
        let mut load = 0.0;

        for &client in clients {
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
        routes
    }

    /// Produce the next generation (same size, no survivors)
    fn evolve(&mut self) {
        let mut next = Vec::with_capacity(self.config.population_size);

        for _ in 0..self.config.population_size {
            let parent1 = self.tournament_select().solution.clone();
            let parent2 = self.tournament_select().solution.clone();
            let mut offspring = self.crossover(&parent1, &parent2);
            if self.rng.gen::<f64>() < self.config.mutation_rate {
                self.mutate(&mut offspring);
            }
            next.push(Individual::new(offspring, &self.instance));
        }

        self.population = next;
    }

    /// Tournament selection: sample with replacement, keep the shortest
    fn tournament_select(&mut self) -> &Individual {
        let mut best_idx = self.rng.gen_range(0..self.population.len());

        for _ in 1..self.config.tournament_size {
            let idx = self.rng.gen_range(0..self.population.len());
            if self.population[idx].distance < self.population[best_idx].distance {
                best_idx = idx;
            }
        }

        &self.population[best_idx]
    }

    /// Copy the first `split` whole routes of parent 1, then repack the
    /// clients still missing in the order parent 2 visits them. The split
    /// point is drawn from [1, routes - 2] and clamped to 1 for parents
    /// with fewer than three routes.
    fn crossover(&mut self, parent1: &Solution, parent2: &Solution) -> Solution {
        let split = if parent1.routes.len() <= 2 {
            1
        } else {
            self.rng.gen_range(1..parent1.routes.len() - 1)
        };
        let split = split.min(parent1.routes.len());

        let mut routes: Vec<Vec<usize>> = parent1.routes[..split].to_vec();

        let mut covered = vec![false; self.instance.dimension()];
        for route in &routes {
            for &node in route {
                if node != 0 {
                    covered[node] = true;
                }
            }
        }

        let remaining: Vec<usize> = parent2
            .routes
            .iter()
            .flatten()
            .filter(|&&node| node != 0 && !covered[node])
            .copied()
            .collect();

        routes.extend(self.pack_first_fit(&remaining));
        Solution::from_routes(routes)
    }

    /// Swap two random interior positions of one random route; routes with
    /// a single client are left alone (no interior pair to swap)
    fn mutate(&mut self, solution: &mut Solution) {
        let route_idx = self.rng.gen_range(0..solution.routes.len());
        let route = &mut solution.routes[route_idx];
        if route.len() > 3 {
            let i = self.rng.gen_range(1..route.len() - 1);
            let j = self.rng.gen_range(1..route.len() - 1);
            route.swap(i, j);
        }
    }

    fn best_of_population(&self) -> &Individual {
        self.population
            .iter()
            .min_by_key(|ind| OrderedFloat(ind.distance))
            .expect("population is never empty")
    }
}
