//! Module for parsing and representing CVRP instances.
//!
//! An instance carries the client demands, the uniform vehicle capacity and
//! a dense symmetric distance matrix over the depot (node 0) and the clients
//! (nodes 1..=n). Everything is validated at construction time so the search
//! engines can assume a feasible instance and never re-check it.

use crate::matrix::SquareMatrix;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating an instance
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("cannot read instance file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("instance must have at least one client")]
    NoClients,
    #[error("instance must have at least one vehicle")]
    NoVehicles,
    #[error("vehicle capacity must be positive, got {0}")]
    NonPositiveCapacity(f64),
    #[error("expected {expected} client demands, got {actual}")]
    DemandCount { expected: usize, actual: usize },
    #[error("client {client} has non-positive demand {demand}")]
    NonPositiveDemand { client: usize, demand: f64 },
    #[error(
        "client {client} demand {demand} exceeds vehicle capacity {capacity}: \
         no feasible solution exists"
    )]
    DemandExceedsCapacity {
        client: usize,
        demand: f64,
        capacity: f64,
    },
    #[error("distance matrix must be {expected}x{expected}, got {actual}x{actual}")]
    MatrixDimension { expected: usize, actual: usize },
    #[error("distance matrix is not symmetric at ({row}, {col})")]
    AsymmetricDistance { row: usize, col: usize },
    #[error("distance matrix diagonal entry ({node}, {node}) is not zero")]
    NonZeroDiagonal { node: usize },
    #[error("negative distance {value} at ({row}, {col})")]
    NegativeDistance { row: usize, col: usize, value: f64 },
}

fn parse_error(line: usize, message: impl Into<String>) -> InstanceError {
    InstanceError::Parse {
        line,
        message: message.into(),
    }
}

/// A validated CVRP instance
#[derive(Debug, Clone)]
pub struct CvrpInstance {
    /// Name of the instance (file stem or caller-supplied)
    pub name: String,
    /// Number of clients n; clients are nodes 1..=n, the depot is node 0
    pub num_clients: usize,
    /// Fleet size declared by the instance; reported but not enforced by
    /// any engine
    pub num_vehicles: usize,
    /// Uniform vehicle capacity
    pub capacity: f64,
    /// Demand of client i at index i - 1
    pub demands: Vec<f64>,
    /// Symmetric (n+1)x(n+1) distance matrix with zero diagonal
    pub distances: SquareMatrix,
}

impl CvrpInstance {
    /// Build and validate an instance. All engine code relies on the
    /// guarantees established here (see [`InstanceError`] for the checks).
    pub fn new(
        name: impl Into<String>,
        num_clients: usize,
        num_vehicles: usize,
        capacity: f64,
        demands: Vec<f64>,
        distances: SquareMatrix,
    ) -> Result<Self, InstanceError> {
        if num_clients == 0 {
            return Err(InstanceError::NoClients);
        }
        if num_vehicles == 0 {
            return Err(InstanceError::NoVehicles);
        }
        if capacity <= 0.0 {
            return Err(InstanceError::NonPositiveCapacity(capacity));
        }
        if demands.len() != num_clients {
            return Err(InstanceError::DemandCount {
                expected: num_clients,
                actual: demands.len(),
            });
        }
        for (i, &demand) in demands.iter().enumerate() {
            let client = i + 1;
            if demand <= 0.0 {
                return Err(InstanceError::NonPositiveDemand { client, demand });
            }
            if demand > capacity {
                return Err(InstanceError::DemandExceedsCapacity {
                    client,
                    demand,
                    capacity,
                });
            }
        }

        let dimension = num_clients + 1;
        if distances.size() != dimension {
            return Err(InstanceError::MatrixDimension {
                expected: dimension,
                actual: distances.size(),
            });
        }
        for i in 0..dimension {
            if distances.get(i, i) != 0.0 {
                return Err(InstanceError::NonZeroDiagonal { node: i });
            }
            for j in (i + 1)..dimension {
                let d = distances.get(i, j);
                if d < 0.0 {
                    return Err(InstanceError::NegativeDistance {
                        row: i,
                        col: j,
                        value: d,
                    });
                }
                if (d - distances.get(j, i)).abs() > f64::EPSILON {
                    return Err(InstanceError::AsymmetricDistance { row: i, col: j });
                }
            }
        }

        Ok(CvrpInstance {
            name: name.into(),
            num_clients,
            num_vehicles,
            capacity,
            demands,
            distances,
        })
    }

    /// Parse an instance from its text format:
    ///
    /// ```text
    /// line 1:  header (ignored)
    /// line 2:  <clients>-<vehicles>-<capacity>-[d1,d2,...,dn]
    /// line 3:  ignored
    /// line 4:  ignored
    /// then:    one "<from>,<to>,<distance>" triple per line, assigned
    ///          symmetrically; unlisted pairs stay at distance 0
    /// ```
    pub fn from_reader<R: BufRead>(reader: R, name: &str) -> Result<Self, InstanceError> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }
        if lines.len() < 2 {
            return Err(parse_error(lines.len(), "missing instance header line"));
        }

        let header = lines[1].trim();
        let parts: Vec<&str> = header.splitn(4, '-').collect();
        if parts.len() != 4 {
            return Err(parse_error(
                2,
                format!("expected 'clients-vehicles-capacity-[demands]', got '{header}'"),
            ));
        }
        let num_clients: usize = parts[0]
            .trim()
            .parse()
            .map_err(|_| parse_error(2, format!("invalid client count '{}'", parts[0])))?;
        let num_vehicles: usize = parts[1]
            .trim()
            .parse()
            .map_err(|_| parse_error(2, format!("invalid vehicle count '{}'", parts[1])))?;
        let capacity: f64 = parts[2]
            .trim()
            .parse()
            .map_err(|_| parse_error(2, format!("invalid capacity '{}'", parts[2])))?;

        let demand_list = parts[3].trim().trim_start_matches('[').trim_end_matches(']');
        let mut demands = Vec::new();
        for token in demand_list.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let demand: f64 = token
                .parse()
                .map_err(|_| parse_error(2, format!("invalid demand '{token}'")))?;
            demands.push(demand);
        }

        // The two lines after the header are descriptive and skipped; the
        // distance triples start on line 5.
        let mut distances = SquareMatrix::zeros(num_clients + 1);
        for (idx, raw) in lines.iter().enumerate().skip(4) {
            let line_no = idx + 1;
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let fields: Vec<&str> = raw.split(',').collect();
            if fields.len() != 3 {
                return Err(parse_error(
                    line_no,
                    format!("expected 'from,to,distance', got '{raw}'"),
                ));
            }
            let from: usize = fields[0]
                .trim()
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid node id '{}'", fields[0])))?;
            let to: usize = fields[1]
                .trim()
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid node id '{}'", fields[1])))?;
            let value: f64 = fields[2]
                .trim()
                .parse()
                .map_err(|_| parse_error(line_no, format!("invalid distance '{}'", fields[2])))?;
            if from > num_clients || to > num_clients {
                return Err(parse_error(
                    line_no,
                    format!("node id out of range in '{raw}' (max {num_clients})"),
                ));
            }
            distances.set(from, to, value);
            distances.set(to, from, value);
        }

        Self::new(name, num_clients, num_vehicles, capacity, demands, distances)
    }

    /// Load and validate an instance file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstanceError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("instance")
            .to_string();
        let file = File::open(path)?;
        let instance = Self::from_reader(BufReader::new(file), &name)?;
        info!(
            "loaded instance {}: {} clients, {} vehicles, capacity {}",
            instance.name, instance.num_clients, instance.num_vehicles, instance.capacity
        );
        Ok(instance)
    }

    /// Distance between two nodes
    #[inline]
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances.get(from, to)
    }

    /// Demand of a client (1..=n)
    #[inline]
    pub fn demand(&self, client: usize) -> f64 {
        self.demands[client - 1]
    }

    /// Iterate over client ids in ascending order
    pub fn clients(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.num_clients
    }

    /// Length of one route (sum over its consecutive legs)
    pub fn route_distance(&self, route: &[usize]) -> f64 {
        route.windows(2).map(|leg| self.distance(leg[0], leg[1])).sum()
    }

    /// Load carried on one route (sum of its client demands)
    pub fn route_demand(&self, route: &[usize]) -> f64 {
        route
            .iter()
            .filter(|&&node| node != 0)
            .map(|&client| self.demand(client))
            .sum()
    }

    /// Number of nodes including the depot
    #[inline]
    pub fn dimension(&self) -> usize {
        self.num_clients + 1
    }

    /// Sum of all client demands
    pub fn total_demand(&self) -> f64 {
        self.demands.iter().sum()
    }

    /// Summary statistics for reporting
    pub fn summary(&self) -> InstanceSummary {
        let total_demand = self.total_demand();
        let min_demand = self.demands.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_demand = self.demands.iter().cloned().fold(0.0, f64::max);
        let mean_demand = total_demand / self.num_clients as f64;

        let mut sum = 0.0;
        let mut count = 0usize;
        let mut max_distance = 0.0f64;
        for i in 0..self.dimension() {
            for j in (i + 1)..self.dimension() {
                let d = self.distance(i, j);
                sum += d;
                count += 1;
                max_distance = max_distance.max(d);
            }
        }
        let avg_distance = if count > 0 { sum / count as f64 } else { 0.0 };

        InstanceSummary {
            name: self.name.clone(),
            num_clients: self.num_clients,
            num_vehicles: self.num_vehicles,
            capacity: self.capacity,
            total_demand,
            min_demand,
            max_demand,
            mean_demand,
            min_vehicles_needed: (total_demand / self.capacity).ceil() as usize,
            avg_distance,
            max_distance,
        }
    }
}

/// Summary statistics about a CVRP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub name: String,
    pub num_clients: usize,
    pub num_vehicles: usize,
    pub capacity: f64,
    pub total_demand: f64,
    pub min_demand: f64,
    pub max_demand: f64,
    pub mean_demand: f64,
    /// Lower bound on the number of routes: ceil(total demand / capacity)
    pub min_vehicles_needed: usize,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Clients: {}", self.num_clients)?;
        writeln!(f, "  Vehicles: {}", self.num_vehicles)?;
        writeln!(f, "  Capacity: {}", self.capacity)?;
        writeln!(
            f,
            "  Demand: total {} (min {}, max {}, mean {:.2})",
            self.total_demand, self.min_demand, self.max_demand, self.mean_demand
        )?;
        writeln!(f, "  Routes needed (demand bound): {}", self.min_vehicles_needed)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build_matrix(size: usize, pairs: &[(usize, usize, f64)]) -> SquareMatrix {
        let mut m = SquareMatrix::zeros(size);
        for &(i, j, d) in pairs {
            m.set(i, j, d);
            m.set(j, i, d);
        }
        m
    }

    #[test]
    fn test_valid_instance() {
        let distances = build_matrix(3, &[(0, 1, 2.0), (0, 2, 3.0), (1, 2, 4.0)]);
        let instance =
            CvrpInstance::new("tiny", 2, 2, 10.0, vec![5.0, 5.0], distances).unwrap();
        assert_eq!(instance.num_clients, 2);
        assert_eq!(instance.dimension(), 3);
        assert_eq!(instance.demand(1), 5.0);
        assert_eq!(instance.distance(1, 2), 4.0);
        assert_eq!(instance.total_demand(), 10.0);
    }

    #[test]
    fn test_demand_exceeding_capacity_rejected() {
        let distances = build_matrix(3, &[(0, 1, 1.0), (0, 2, 1.0), (1, 2, 1.0)]);
        let err = CvrpInstance::new("bad", 2, 1, 10.0, vec![5.0, 11.0], distances)
            .unwrap_err();
        assert!(matches!(
            err,
            InstanceError::DemandExceedsCapacity { client: 2, .. }
        ));
    }

    #[test]
    fn test_asymmetric_matrix_rejected() {
        let mut distances = build_matrix(2, &[]);
        distances.set(0, 1, 2.0);
        distances.set(1, 0, 3.0);
        let err = CvrpInstance::new("bad", 1, 1, 10.0, vec![5.0], distances).unwrap_err();
        assert!(matches!(err, InstanceError::AsymmetricDistance { .. }));
    }

    #[test]
    fn test_nonzero_diagonal_rejected() {
        let mut distances = build_matrix(2, &[(0, 1, 2.0)]);
        distances.set(1, 1, 1.0);
        let err = CvrpInstance::new("bad", 1, 1, 10.0, vec![5.0], distances).unwrap_err();
        assert!(matches!(err, InstanceError::NonZeroDiagonal { node: 1 }));
    }

    #[test]
    fn test_negative_distance_rejected() {
        let distances = build_matrix(2, &[(0, 1, -2.0)]);
        let err = CvrpInstance::new("bad", 1, 1, 10.0, vec![5.0], distances).unwrap_err();
        assert!(matches!(err, InstanceError::NegativeDistance { .. }));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let distances = build_matrix(2, &[(0, 1, 2.0)]);
        let err = CvrpInstance::new("bad", 2, 1, 10.0, vec![5.0, 5.0], distances)
            .unwrap_err();
        assert!(matches!(
            err,
            InstanceError::MatrixDimension { expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn test_parse_text_format() {
        let text = "\
CVRP instance
3-2-100-[10,20,30]
distance section
start,end,distance
0,1,5
0,2,6
0,3,7
1,2,8
1,3,9
2,3,10
";
        let instance = CvrpInstance::from_reader(Cursor::new(text), "sample").unwrap();
        assert_eq!(instance.num_clients, 3);
        assert_eq!(instance.num_vehicles, 2);
        assert_eq!(instance.capacity, 100.0);
        assert_eq!(instance.demands, vec![10.0, 20.0, 30.0]);
        assert_eq!(instance.distance(1, 2), 8.0);
        assert_eq!(instance.distance(2, 1), 8.0);
        assert_eq!(instance.distance(3, 0), 7.0);
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let text = "\
header
2-1-10-[5,5]
skip
skip
0,1,2
1,oops,4
";
        let err = CvrpInstance::from_reader(Cursor::new(text), "bad").unwrap_err();
        match err {
            InstanceError::Parse { line, .. } => assert_eq!(line, 6),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_node() {
        let text = "\
header
2-1-10-[5,5]
skip
skip
0,9,2
";
        let err = CvrpInstance::from_reader(Cursor::new(text), "bad").unwrap_err();
        assert!(matches!(err, InstanceError::Parse { line: 5, .. }));
    }

    #[test]
    fn test_summary_vehicle_bound() {
        let distances = build_matrix(4, &[(0, 1, 1.0), (0, 2, 2.0), (0, 3, 3.0)]);
        let instance =
            CvrpInstance::new("s", 3, 5, 10.0, vec![6.0, 6.0, 6.0], distances).unwrap();
        let summary = instance.summary();
        assert_eq!(summary.min_vehicles_needed, 2);
        assert_eq!(summary.max_demand, 6.0);
        assert_eq!(summary.num_vehicles, 5);
    }
}
