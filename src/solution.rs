//! Solution representation and shared operations for the CVRP.
//!
//! A solution is a collection of routes; every route is a node sequence
//! that starts and ends at the depot (node 0). Distance, feasibility and
//! completeness are always recomputed from the instance, so no cached
//! value can go stale while an engine mutates a candidate. `Clone` is a
//! deep copy; engines clone before touching any kept solution.

use crate::instance::CvrpInstance;
use serde::{Deserialize, Serialize};

/// A set of depot-anchored routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Routes as node sequences, each beginning and ending with 0
    pub routes: Vec<Vec<usize>>,
}

impl Solution {
    /// Create an empty solution
    pub fn new() -> Self {
        Solution { routes: Vec::new() }
    }

    /// Create a solution from a set of routes
    pub fn from_routes(routes: Vec<Vec<usize>>) -> Self {
        Solution { routes }
    }

    /// Total travelled distance over all routes
    pub fn total_distance(&self, instance: &CvrpInstance) -> f64 {
        self.routes
            .iter()
            .map(|route| instance.route_distance(route))
            .sum()
    }

    /// Every route load stays within the vehicle capacity
    pub fn is_feasible(&self, instance: &CvrpInstance) -> bool {
        self.routes
            .iter()
            .all(|route| instance.route_demand(route) <= instance.capacity)
    }

    /// Every client 1..=n appears exactly once across all routes
    pub fn is_complete(&self, instance: &CvrpInstance) -> bool {
        let mut seen = vec![false; instance.dimension()];
        let mut served = 0usize;
        for route in &self.routes {
            for &node in route {
                if node == 0 {
                    continue;
                }
                if node >= seen.len() || seen[node] {
                    return false;
                }
                seen[node] = true;
                served += 1;
            }
        }
        served == instance.num_clients
    }

    /// Every route starts and ends at the depot and keeps the depot out of
    /// its interior
    pub fn is_well_formed(&self) -> bool {
        self.routes.iter().all(|route| {
            route.len() >= 2
                && route.first() == Some(&0)
                && route.last() == Some(&0)
                && route[1..route.len() - 1].iter().all(|&node| node != 0)
        })
    }

    /// Number of clients placed on routes (counting duplicates)
    pub fn num_clients_served(&self) -> usize {
        self.routes
            .iter()
            .map(|route| route.iter().filter(|&&node| node != 0).count())
            .sum()
    }

    /// Number of routes
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, route) in self.routes.iter().enumerate() {
            let path: Vec<String> = route.iter().map(|node| node.to_string()).collect();
            writeln!(f, "Route {}: {}", i + 1, path.join(" -> "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SquareMatrix;

    fn create_test_instance() -> CvrpInstance {
        // two clients, one vehicle can serve both
        let mut distances = SquareMatrix::zeros(3);
        for &(i, j, d) in &[(0usize, 1usize, 2.0), (0, 2, 3.0), (1, 2, 4.0)] {
            distances.set(i, j, d);
            distances.set(j, i, d);
        }
        CvrpInstance::new("tiny", 2, 2, 10.0, vec![5.0, 5.0], distances).unwrap()
    }

    #[test]
    fn test_total_distance() {
        let instance = create_test_instance();
        let merged = Solution::from_routes(vec![vec![0, 1, 2, 0]]);
        assert!((merged.total_distance(&instance) - 9.0).abs() < 1e-10);

        let split = Solution::from_routes(vec![vec![0, 1, 0], vec![0, 2, 0]]);
        assert!((split.total_distance(&instance) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_distance_is_additive_over_routes() {
        let instance = create_test_instance();
        let first = Solution::from_routes(vec![vec![0, 1, 0]]);
        let second = Solution::from_routes(vec![vec![0, 2, 0]]);
        let combined = Solution::from_routes(vec![vec![0, 1, 0], vec![0, 2, 0]]);
        let sum = first.total_distance(&instance) + second.total_distance(&instance);
        assert!((combined.total_distance(&instance) - sum).abs() < 1e-10);
    }

    #[test]
    fn test_feasibility() {
        let instance = create_test_instance();
        let merged = Solution::from_routes(vec![vec![0, 1, 2, 0]]);
        assert!(merged.is_feasible(&instance));

        let mut distances = SquareMatrix::zeros(3);
        distances.set(0, 1, 1.0);
        distances.set(1, 0, 1.0);
        distances.set(0, 2, 1.0);
        distances.set(2, 0, 1.0);
        distances.set(1, 2, 1.0);
        distances.set(2, 1, 1.0);
        let heavy =
            CvrpInstance::new("heavy", 2, 2, 10.0, vec![6.0, 6.0], distances).unwrap();
        let overloaded = Solution::from_routes(vec![vec![0, 1, 2, 0]]);
        assert!(!overloaded.is_feasible(&heavy));
        let split = Solution::from_routes(vec![vec![0, 1, 0], vec![0, 2, 0]]);
        assert!(split.is_feasible(&heavy));
    }

    #[test]
    fn test_completeness() {
        let instance = create_test_instance();
        assert!(Solution::from_routes(vec![vec![0, 1, 2, 0]]).is_complete(&instance));
        assert!(Solution::from_routes(vec![vec![0, 1, 0], vec![0, 2, 0]])
            .is_complete(&instance));
        // missing client
        assert!(!Solution::from_routes(vec![vec![0, 1, 0]]).is_complete(&instance));
        // duplicated client
        assert!(!Solution::from_routes(vec![vec![0, 1, 0], vec![0, 1, 2, 0]])
            .is_complete(&instance));
    }

    #[test]
    fn test_well_formedness() {
        assert!(Solution::from_routes(vec![vec![0, 1, 2, 0]]).is_well_formed());
        assert!(!Solution::from_routes(vec![vec![1, 2, 0]]).is_well_formed());
        assert!(!Solution::from_routes(vec![vec![0, 1, 2]]).is_well_formed());
        assert!(!Solution::from_routes(vec![vec![0, 1, 0, 2, 0]]).is_well_formed());
        assert!(!Solution::from_routes(vec![vec![0]]).is_well_formed());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Solution::from_routes(vec![vec![0, 1, 2, 0]]);
        let mut copy = original.clone();
        copy.routes[0].swap(1, 2);
        assert_eq!(original.routes[0], vec![0, 1, 2, 0]);
        assert_eq!(copy.routes[0], vec![0, 2, 1, 0]);
    }

    #[test]
    fn test_display_lists_routes() {
        let solution = Solution::from_routes(vec![vec![0, 1, 0], vec![0, 2, 0]]);
        let text = solution.to_string();
        assert!(text.contains("Route 1: 0 -> 1 -> 0"));
        assert!(text.contains("Route 2: 0 -> 2 -> 0"));
    }

    #[test]
    fn test_clients_served() {
        let solution = Solution::from_routes(vec![vec![0, 1, 0], vec![0, 2, 3, 0]]);
        assert_eq!(solution.num_clients_served(), 3);
        assert_eq!(solution.num_routes(), 2);
    }
}
