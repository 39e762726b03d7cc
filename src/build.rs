use tracing::debug;

use crate::env::{ConditionEnv, UnitImporter};
use crate::types::{
    BuildError, Checkpoint, Fragment, Instr, PointBody, PointGraph, StoryId,
};

/// Build the checkpoint graph for a fragment sequence.
///
/// `prev_point` tracks the last top-level `if`: every new point is chained
/// to it, and a nested `return` lands in its sub-story.
pub(crate) fn activate<E, I>(
    fragments: &[Fragment],
    hash: &str,
    env: &E,
    importer: &mut I,
) -> Result<PointGraph<E::Cond>, BuildError>
where
    E: ConditionEnv,
    I: UnitImporter<E::Cond> + ?Sized,
{
    let mut graph = PointGraph::new(env.cond_all());
    let mut prev_point: Option<usize> = None;

    for (point_no, frag) in fragments.iter().enumerate() {
        match (frag.instr(), frag.level()) {
            (Instr::Error(_), 0) => {
                graph.push_point(Checkpoint::new(
                    point_no,
                    StoryId::ROOT,
                    0,
                    None,
                    PointBody::Error,
                ));
            }
            (Instr::Import { entries }, 0) => {
                graph.push_point(Checkpoint::new(
                    point_no,
                    StoryId::ROOT,
                    0,
                    prev_point,
                    PointBody::Import,
                ));
                let cond = graph.actual(point_no).ok_or_else(|| broken(point_no))?;
                for unit in entries {
                    debug!(point_no, unit = unit.as_str(), "importing unit");
                    if !importer.import_unit(point_no, unit, cond, hash) {
                        return Err(BuildError::ImportFailed {
                            point_no,
                            unit: unit.clone(),
                        });
                    }
                }
            }
            (Instr::If { cond_data, .. }, 0) => {
                let own = env
                    .parse_cond_data(cond_data)
                    .map_err(|source| BuildError::Condition { point_no, source })?;
                let sub_story = graph.add_story(StoryId::ROOT, point_no);
                graph.push_point(Checkpoint::new(
                    point_no,
                    StoryId::ROOT,
                    0,
                    prev_point,
                    PointBody::Condition { own, sub_story },
                ));
                prev_point = Some(point_no);
            }
            (Instr::Return { decision }, 0) => {
                graph.push_point(Checkpoint::new(
                    point_no,
                    StoryId::ROOT,
                    0,
                    prev_point,
                    PointBody::Terminal {
                        decision: *decision,
                    },
                ));
            }
            (Instr::Return { decision }, 1) => {
                let opening = prev_point.ok_or_else(|| BuildError::Structure {
                    point_no,
                    message: "return is indented outside of an if body".into(),
                })?;
                let sub_story = graph.points[opening]
                    .sub_story()
                    .ok_or_else(|| broken(point_no))?;
                if opening + 1 != point_no || !graph.story(sub_story).points().is_empty() {
                    return Err(BuildError::Structure {
                        point_no,
                        message: "an if body takes exactly one return".into(),
                    });
                }
                graph.push_point(Checkpoint::new(
                    point_no,
                    sub_story,
                    1,
                    Some(opening),
                    PointBody::Terminal {
                        decision: *decision,
                    },
                ));
            }
            (instr, level) => {
                return Err(BuildError::Structure {
                    point_no,
                    message: format!("{} is not allowed at level {level}", instr.kind()),
                });
            }
        }
    }

    debug!(
        points = graph.points.len(),
        stories = graph.stories.len(),
        "tree activated"
    );
    Ok(graph)
}

fn broken(point_no: usize) -> BuildError {
    BuildError::Structure {
        point_no,
        message: "checkpoint chain is inconsistent".into(),
    }
}
