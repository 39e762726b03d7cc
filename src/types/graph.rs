use super::checkpoint::Checkpoint;

/// Index of a story in the tree's story arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoryId(pub(crate) usize);

impl StoryId {
    /// The master story holding the top-level statements.
    pub const ROOT: StoryId = StoryId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered checkpoints of one nesting level: the whole tree, or one `if` body.
#[derive(Debug, Clone)]
pub struct Story {
    pub(crate) parent: Option<StoryId>,
    pub(crate) start_point: Option<usize>,
    pub(crate) level: usize,
    pub(crate) points: Vec<usize>,
}

impl Story {
    pub(crate) fn root() -> Self {
        Self {
            parent: None,
            start_point: None,
            level: 0,
            points: Vec::new(),
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<StoryId> {
        self.parent
    }

    /// The `if` checkpoint that opened this branch; `None` for the root.
    #[must_use]
    pub fn start_point(&self) -> Option<usize> {
        self.start_point
    }

    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    #[must_use]
    pub fn points(&self) -> &[usize] {
        &self.points
    }

    /// Last checkpoint appended, falling back to the opening `if`.
    #[must_use]
    pub fn last_point(&self) -> Option<usize> {
        self.points.last().copied().or(self.start_point)
    }
}

/// Arena of checkpoints and stories produced by activation.
#[derive(Debug)]
pub(crate) struct PointGraph<C> {
    pub(crate) points: Vec<Checkpoint<C>>,
    pub(crate) stories: Vec<Story>,
    pub(crate) cond_all: C,
}

impl<C> PointGraph<C> {
    pub(crate) fn new(cond_all: C) -> Self {
        Self {
            points: Vec::new(),
            stories: vec![Story::root()],
            cond_all,
        }
    }

    pub(crate) fn story(&self, id: StoryId) -> &Story {
        &self.stories[id.0]
    }

    pub(crate) fn add_story(&mut self, parent: StoryId, start_point: usize) -> StoryId {
        let level = self.stories[parent.0].level + 1;
        let id = StoryId(self.stories.len());
        self.stories.push(Story {
            parent: Some(parent),
            start_point: Some(start_point),
            level,
            points: Vec::new(),
        });
        id
    }

    /// Register a checkpoint in the flat list and append it to its story.
    pub(crate) fn push_point(&mut self, point: Checkpoint<C>) {
        debug_assert_eq!(point.point_no, self.points.len());
        self.stories[point.story.0].points.push(point.point_no);
        self.points.push(point);
    }

    /// Story that does not end with a `return`, searching active branches
    /// depth first. `None` when every path reaches a decision.
    pub(crate) fn undetermined_story(&self, id: StoryId) -> Option<StoryId> {
        let story = &self.stories[id.0];
        let ends_with_return = story
            .points
            .last()
            .is_some_and(|&no| self.points[no].decision().is_some());
        if !ends_with_return {
            return Some(id);
        }
        let (_, heads) = story.points.split_last()?;
        heads
            .iter()
            .filter_map(|&no| self.points[no].sub_story())
            .find_map(|sub| self.undetermined_story(sub))
    }
}
