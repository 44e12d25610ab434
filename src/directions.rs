//! Human-readable directions for a solved tour.
//!
//! The origin is labelled "Starting Point" and every other point "Address k",
//! where k is its index.

use crate::distance::DistanceMatrix;
use crate::solution::Solution;

/// Display label for a point index
pub fn label(point: usize) -> String {
    if point == 0 {
        "Starting Point".to_string()
    } else {
        format!("Address {}", point)
    }
}

/// Numbered steps, one per leg of the cycle.
pub fn steps(solution: &Solution) -> Vec<String> {
    let tour = &solution.tour;
    if tour.len() < 2 {
        return Vec::new();
    }

    let last = tour.len() - 1;
    (0..tour.len())
        .map(|i| {
            let step = i + 1;
            if i == 0 {
                format!("{}) Start at the {} and head to {}", step, label(tour[0]), label(tour[1]))
            } else if i < last {
                format!("{}) Go from {} to {}", step, label(tour[i]), label(tour[i + 1]))
            } else {
                format!("{}) Return to the {}", step, label(tour[0]))
            }
        })
        .collect()
}

/// "Starting Point -> Address 2 -> ..."
pub fn path_line(solution: &Solution) -> String {
    solution.tour.iter().map(|&p| label(p)).collect::<Vec<_>>().join(" -> ")
}

/// Full instructions block: steps, total distance and the path summary.
///
/// The total is summed from the legs so it always agrees with the steps shown.
pub fn render(solution: &Solution, dist: &DistanceMatrix) -> String {
    let total: f64 = solution.legs(dist).iter().map(|leg| leg.distance).sum();

    let mut out = String::from("Instructions:\n");
    for step in steps(solution) {
        out.push_str(&step);
        out.push('\n');
    }
    out.push_str(&format!("\nTotal Distance: {:.2} units\n", total));
    out.push_str(&format!("Optimal Path: {}", path_line(solution)));
    out
}
