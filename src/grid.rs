//! Evaluation of many independent states at once.
use crate::{Fluid, MeosResult, PropertyBundle, SolverOptions};
use ndarray::{Array2, Zip};

/// States at all combinations of the given temperatures (K, rows) and
/// pressures (Pa, columns).
///
/// Every grid point is resolved independently, a failing point does not
/// affect the others. With the `rayon` feature the points are evaluated
/// in parallel.
pub fn temperature_pressure_grid(
    fluid: &Fluid,
    temperatures: &[f64],
    pressures: &[f64],
    options: &SolverOptions,
) -> Array2<MeosResult<PropertyBundle>> {
    let grid = Array2::from_shape_fn((temperatures.len(), pressures.len()), |(i, j)| {
        (temperatures[i], pressures[j])
    });
    let state = |&(t, p): &(f64, f64)| fluid.state_t_p(t, p, options);
    #[cfg(feature = "rayon")]
    let states = Zip::from(&grid).par_map_collect(state);
    #[cfg(not(feature = "rayon"))]
    let states = Zip::from(&grid).map_collect(state);
    states
}
