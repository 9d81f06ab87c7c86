use gridpath_core::{Error, Grid, Point, Role};

/// Walk predecessor links from the cell at `target` back to Start.
///
/// The returned route starts at the cell adjacent to Target and ends at the
/// cell adjacent to Start; neither endpoint is included. Fails when a link
/// dangles, when the chain ends anywhere but Start, or when it is longer
/// than the grid has cells (a cycle).
pub fn reconstruct_path(grid: &Grid, target: usize) -> Result<Vec<Point>, Error> {
    let cells = grid.cells();
    let broken = |idx: usize| Error::BrokenPath {
        pos: grid.point(idx),
    };

    let mut path = Vec::new();
    let mut cur = cells
        .get(target)
        .and_then(|c| c.predecessor())
        .ok_or_else(|| broken(target))?;

    for _ in 0..cells.len() {
        let cell = cells.get(cur).ok_or_else(|| broken(cur))?;
        if cell.role() == Role::Start {
            return Ok(path);
        }
        path.push(cell.pos());
        cur = cell.predecessor().ok_or_else(|| broken(cur))?;
    }

    Err(broken(target))
}
