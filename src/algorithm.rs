mod astar;

pub(crate) use astar::a_star_search;

use std::collections::HashMap;

use crate::common::Path;

// Predecessor links keyed by (position, g cost); g keeps counting past the
// point where the time axis is frozen, so it identifies a node uniquely.
type Trace = HashMap<((usize, usize), usize), ((usize, usize), usize)>;

fn construct_path(trace: &Trace, mut current: ((usize, usize), usize)) -> Path {
    let mut path = vec![current.0];
    while let Some(&(position, g_cost)) = trace.get(&current) {
        path.push(position);
        current = (position, g_cost);
    }
    path.reverse();
    path
}
