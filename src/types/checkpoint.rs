use std::sync::OnceLock;

use super::fragment::InstrKind;
use super::graph::StoryId;

#[derive(Debug)]
pub(crate) enum PointBody<C> {
    Import,
    Error,
    Terminal { decision: bool },
    Condition { own: C, sub_story: StoryId },
}

/// Executable node built from one fragment.
///
/// `prev_point` is the nearest preceding `if` checkpoint the node is chained
/// to: the previous sibling at the same level, or for a nested `return` the
/// `if` that opened its branch. Conditions are computed lazily and cached.
#[derive(Debug)]
pub struct Checkpoint<C> {
    pub(crate) point_no: usize,
    pub(crate) story: StoryId,
    pub(crate) level: usize,
    pub(crate) prev_point: Option<usize>,
    pub(crate) body: PointBody<C>,
    pub(crate) actual: OnceLock<C>,
    pub(crate) accumulated: OnceLock<C>,
}

impl<C> Checkpoint<C> {
    pub(crate) fn new(
        point_no: usize,
        story: StoryId,
        level: usize,
        prev_point: Option<usize>,
        body: PointBody<C>,
    ) -> Self {
        Self {
            point_no,
            story,
            level,
            prev_point,
            body,
            actual: OnceLock::new(),
            accumulated: OnceLock::new(),
        }
    }

    /// Position in the flat checkpoint list; equals the fragment index.
    #[must_use]
    pub fn point_no(&self) -> usize {
        self.point_no
    }

    #[must_use]
    pub fn story(&self) -> StoryId {
        self.story
    }

    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    #[must_use]
    pub fn prev_point(&self) -> Option<usize> {
        self.prev_point
    }

    #[must_use]
    pub fn kind(&self) -> InstrKind {
        match self.body {
            PointBody::Import => InstrKind::Import,
            PointBody::Error => InstrKind::Error,
            PointBody::Terminal { .. } => InstrKind::Return,
            PointBody::Condition { .. } => InstrKind::If,
        }
    }

    /// Import and error points take no part in evaluation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.body,
            PointBody::Terminal { .. } | PointBody::Condition { .. }
        )
    }

    #[must_use]
    pub fn decision(&self) -> Option<bool> {
        match self.body {
            PointBody::Terminal { decision } => Some(decision),
            _ => None,
        }
    }

    #[must_use]
    pub fn own_condition(&self) -> Option<&C> {
        match &self.body {
            PointBody::Condition { own, .. } => Some(own),
            _ => None,
        }
    }

    #[must_use]
    pub fn sub_story(&self) -> Option<StoryId> {
        match self.body {
            PointBody::Condition { sub_story, .. } => Some(sub_story),
            _ => None,
        }
    }
}
