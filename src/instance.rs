//! Module for parsing and representing TSP instances.
//!
//! An instance is an ordered set of 2-D points. Index 0 is always the tour
//! origin. Instances can be read from the inline `x,y x,y ...` syntax, from
//! JSON, or from TSP-LIB style files with a NODE_COORD_SECTION.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::error::{Result, SolverError};

/// A point of the instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Point identifier (0-indexed, 0 is the origin)
    #[serde(default)]
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Point { id, x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Check if this point is the tour origin
    pub fn is_origin(&self) -> bool {
        self.id == 0
    }
}

/// Accepted JSON layouts: a named point list or a bare array of pairs.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInstance {
    Named {
        #[serde(default)]
        name: String,
        points: Vec<Point>,
    },
    Pairs(Vec<[f64; 2]>),
}

/// Represents a complete TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the instance
    pub name: String,
    /// Points in input order; ids match their position
    pub points: Vec<Point>,
}

impl Instance {
    /// Build an instance from raw coordinates, numbering points in order.
    pub fn from_coordinates(name: &str, coords: &[(f64, f64)]) -> Self {
        let points = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(i, x, y))
            .collect();
        Instance { name: name.to_string(), points }
    }

    /// Parse the inline `x,y x,y ...` syntax.
    ///
    /// Pairs are separated by whitespace and the two components of a pair by a
    /// comma. When `expected` is set the number of pairs must match it.
    pub fn parse_inline(input: &str, expected: Option<usize>) -> Result<Self> {
        let mut coords = Vec::new();

        for (i, pair) in input.split_whitespace().enumerate() {
            let parts: Vec<&str> = pair.split(',').collect();
            if parts.len() != 2 {
                return Err(SolverError::invalid(format!(
                    "coordinate {} ('{}') must be of the form x,y",
                    i, pair
                )));
            }
            let x: f64 = parts[0].trim().parse()
                .map_err(|_| SolverError::invalid(format!("invalid x coordinate '{}' in pair {}", parts[0], i)))?;
            let y: f64 = parts[1].trim().parse()
                .map_err(|_| SolverError::invalid(format!("invalid y coordinate '{}' in pair {}", parts[1], i)))?;
            coords.push((x, y));
        }

        if coords.is_empty() {
            return Err(SolverError::invalid("no coordinates supplied"));
        }
        if let Some(n) = expected {
            if coords.len() != n {
                return Err(SolverError::invalid(format!(
                    "please enter {} coordinates, got {}",
                    n,
                    coords.len()
                )));
            }
        }

        let instance = Self::from_coordinates("inline", &coords);
        instance.validate()?;
        Ok(instance)
    }

    /// Parse a JSON document (named point list or array of `[x, y]` pairs)
    pub fn from_json_str(data: &str) -> Result<Self> {
        let instance = match serde_json::from_str::<JsonInstance>(data)? {
            JsonInstance::Named { name, points } => {
                // Ids are positional; whatever the file carried is renumbered.
                let points = points
                    .into_iter()
                    .enumerate()
                    .map(|(i, p)| Point::new(i, p.x, p.y))
                    .collect();
                Instance { name, points }
            }
            JsonInstance::Pairs(pairs) => {
                let coords: Vec<(f64, f64)> = pairs.iter().map(|p| (p[0], p[1])).collect();
                Self::from_coordinates("json", &coords)
            }
        };
        instance.validate()?;
        Ok(instance)
    }

    /// Load an instance from disk, choosing the parser from the extension.
    ///
    /// `.json` files go through [`Instance::from_json_str`]; anything else is
    /// read as TSP-LIB.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        if is_json {
            let data = std::fs::read_to_string(path)?;
            let mut instance = Self::from_json_str(&data)?;
            if instance.name.is_empty() {
                instance.name = Self::stem(path);
            }
            return Ok(instance);
        }
        Self::from_tsplib(path)
    }

    /// Parse a TSP-LIB format file (NAME, DIMENSION and NODE_COORD_SECTION).
    pub fn from_tsplib<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let mut name = String::new();
        let mut dimension: Option<usize> = None;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut in_coords = false;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if line.starts_with("NAME") {
                name = Self::header_value(line).to_string();
                continue;
            }
            if line.starts_with("DIMENSION") {
                dimension = Some(Self::header_value(line).parse()
                    .map_err(|_| SolverError::invalid(format!("invalid dimension '{}'", line)))?);
                continue;
            }
            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if line.ends_with("_SECTION") {
                in_coords = false;
                continue;
            }
            if line.contains(':') {
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(SolverError::invalid(format!("malformed coordinate line '{}'", line)));
                }
                let id: usize = parts[0].parse()
                    .map_err(|_| SolverError::invalid(format!("invalid node id '{}'", parts[0])))?;
                let x: f64 = parts[1].parse()
                    .map_err(|_| SolverError::invalid(format!("invalid x coordinate '{}'", parts[1])))?;
                let y: f64 = parts[2].parse()
                    .map_err(|_| SolverError::invalid(format!("invalid y coordinate '{}'", parts[2])))?;
                coords.push((id, x, y));
            }
        }

        if let Some(dim) = dimension {
            if dim != coords.len() {
                return Err(SolverError::invalid(format!(
                    "DIMENSION is {} but {} coordinates were read",
                    dim,
                    coords.len()
                )));
            }
        }

        // Ids are 1-indexed in files
        coords.sort_by_key(|&(id, _, _)| id);
        let points: Vec<Point> = coords
            .iter()
            .enumerate()
            .map(|(i, &(_, x, y))| Point::new(i, x, y))
            .collect();

        if name.is_empty() {
            name = Self::stem(path.as_ref());
        }

        let instance = Instance { name, points };
        instance.validate()?;
        Ok(instance)
    }

    fn header_value(line: &str) -> &str {
        line.split_once(':').map(|(_, v)| v.trim()).unwrap_or("")
    }

    fn stem(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Reject empty instances and non-finite coordinates.
    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(SolverError::invalid("instance has no points"));
        }
        if let Some(p) = self.points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(SolverError::invalid(format!("point {} has a non-finite coordinate", p.id)));
        }
        Ok(())
    }

    /// Number of points (including the origin)
    pub fn dimension(&self) -> usize {
        self.points.len()
    }

    /// Compute the Euclidean distance matrix
    pub fn distance_matrix(&self) -> Result<DistanceMatrix> {
        DistanceMatrix::from_points(&self.points)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> Result<InstanceStatistics> {
        let matrix = self.distance_matrix()?;
        let distances: Vec<f64> = matrix.pairwise().collect();

        let (avg_distance, min_distance, max_distance) = if distances.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                distances.iter().sum::<f64>() / distances.len() as f64,
                distances.iter().cloned().fold(f64::INFINITY, f64::min),
                distances.iter().cloned().fold(0.0, f64::max),
            )
        };

        let min_x = self.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = self.points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = self.points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = self.points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let n = self.dimension();
        Ok(InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            dp_states: 1usize.checked_shl(n as u32).map(|s| s.saturating_mul(n)).unwrap_or(usize::MAX),
            bounding_box: (min_x, min_y, max_x, max_y),
            avg_distance,
            min_distance,
            max_distance,
        })
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    /// Number of (mask, point) entries in a full Held-Karp table
    pub dp_states: usize,
    /// (min_x, min_y, max_x, max_y)
    pub bounding_box: (f64, f64, f64, f64),
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Points: {} (1 origin + {} stops)", self.dimension, self.dimension - 1)?;
        writeln!(f, "  DP states: {}", self.dp_states)?;
        let (min_x, min_y, max_x, max_y) = self.bounding_box;
        writeln!(f, "  Bounding box: ({:.2}, {:.2}) - ({:.2}, {:.2})", min_x, min_y, max_x, max_y)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}
