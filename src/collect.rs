use std::collections::BTreeSet;

use tracing::{instrument, trace, warn};

use crate::env::{Condition, Dataset, RecNo};
use crate::types::{
    CollectError, Collected, EvalError, Fragment, PointGraph, PointTrace,
};

/// Walk all checkpoints in order and gather the records selected by
/// `return True` points.
///
/// Aborts with [`CollectError::WorkingSetOverflow`] as soon as a selecting
/// point or the running result reaches `max_ws_size`.
#[instrument(level = "trace", skip_all, fields(points = graph.points.len(), max_ws_size = max_ws_size))]
pub(crate) fn collect_rec_seq<C, D>(
    graph: &PointGraph<C>,
    fragments: &[Fragment],
    code_lines: &[&str],
    dataset: &D,
    max_ws_size: usize,
) -> Result<Collected, CollectError>
where
    C: Condition,
    D: Dataset<C> + ?Sized,
{
    let mut selected: BTreeSet<RecNo> = BTreeSet::new();
    let mut rows = Vec::with_capacity(graph.points.len());

    for point in &graph.points {
        let point_no = point.point_no();
        let mut row = PointTrace {
            code_frag: fragments
                .get(point_no)
                .map(|frag| frag.code_frag(code_lines))
                .unwrap_or_default(),
            count: None,
            decision: None,
        };

        if point.is_active() {
            let cond = graph.actual(point_no).ok_or(EvalError::NoSuchPoint {
                point_no,
                len: graph.points.len(),
            })?;
            let count = dataset.total_count(cond);
            trace!(point_no, count, "evaluated point");
            row.count = Some(count);
            row.decision = point.decision();
            if point.decision() == Some(true) {
                if count >= max_ws_size {
                    warn!(point_no, count, max_ws_size, "selection exceeds working set limit");
                    return Err(CollectError::WorkingSetOverflow {
                        point_no,
                        size: count,
                        max: max_ws_size,
                    });
                }
                if count > 0 {
                    selected.extend(dataset.rec_seq(cond, count));
                }
            }
        }
        rows.push(row);

        if selected.len() >= max_ws_size {
            warn!(point_no, size = selected.len(), max_ws_size, "working set limit reached");
            return Err(CollectError::WorkingSetOverflow {
                point_no,
                size: selected.len(),
                max: max_ws_size,
            });
        }
    }

    Ok(Collected {
        rec_nos: selected.into_iter().collect(),
        trace: rows,
    })
}
