use crate::env::Playout;

/// Randomness levels `0, step, 2·step, …` up to and including `max`.
pub fn randomness_sweep(max: f32, step: f32) -> Vec<f32> {
    if step <= 0.0 || max <= 0.0 {
        return vec![0.0];
    }
    // Integer multiples keep the last level from drifting past `max`
    let levels = (max / step + 1e-4).floor() as usize;
    (0..=levels).map(|i| i as f32 * step).collect()
}

/// The playout with the fewest actions; earlier playouts win ties.
///
/// Unsolved playouts are only chosen when none of the playouts solved the board.
pub fn select_shortest<I>(playouts: I) -> Option<Playout>
where
    I: IntoIterator<Item = Playout>,
{
    let mut best: Option<Playout> = None;
    for playout in playouts {
        let better = match &best {
            None => true,
            Some(current) => match (playout.solved, current.solved) {
                (true, false) => true,
                (false, true) => false,
                _ => playout.actions.len() < current.actions.len(),
            },
        };
        if better {
            best = Some(playout);
        }
    }
    best
}
