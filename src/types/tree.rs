use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::error;

use crate::config::EngineConfig;
use crate::env::{Condition, ConditionEnv, Dataset, UnitImporter};
use crate::parse::{ParsedTree, SyntaxError};

use super::checkpoint::Checkpoint;
use super::error::{BuildError, CollectError, EvalError};
use super::fragment::Fragment;
use super::graph::{PointGraph, Story, StoryId};
use super::report::{Collected, PointInfo, TreeReport};

/// A decision tree: parsed source plus, once activated, its checkpoint graph.
///
/// Construct with [`DTree::new`] (or [`build`](DTree::build) to parse and
/// activate in one step). Activation resolves conditions through a
/// [`ConditionEnv`] and must succeed before anything can be evaluated.
///
/// # Example
///
/// ```
/// use dtree::memory::{MemoryEnv, Record, RecordSet};
/// use dtree::{DTree, EngineConfig, RejectImports};
///
/// let code = "if FT in {\"PASS\"}:\n    return True\nreturn False";
/// let tree = DTree::build(code, None, &MemoryEnv::new(), &mut RejectImports).unwrap();
///
/// let records: RecordSet = vec![
///     Record::new().set("FT", "PASS"),
///     Record::new().set("FT", "LowQual"),
/// ]
/// .into_iter()
/// .collect();
/// let collected = tree.collect_rec_seq(&records, &EngineConfig::default()).unwrap();
/// assert_eq!(collected.rec_nos, vec![0]);
/// ```
#[derive(Debug)]
pub struct DTree<C> {
    parsed: ParsedTree,
    name: Option<String>,
    graph: Option<PointGraph<C>>,
}

impl<C> DTree<C> {
    /// Parse source text. The tree is inactive until [`activate`](Self::activate).
    #[must_use]
    pub fn new(code: &str, name: Option<&str>) -> Self {
        Self::from_parsed(crate::parse::parse(code), name)
    }

    /// Wrap an already parsed tree. A recorded syntax error is logged.
    #[must_use]
    pub fn from_parsed(parsed: ParsedTree, name: Option<&str>) -> Self {
        if let Some(err) = parsed.error() {
            error!(
                dtree = name.unwrap_or("-"),
                line = err.line,
                offset = err.offset,
                message = %err.message,
                "decision tree has a syntax error\n{}",
                parsed.code()
            );
        }
        Self {
            parsed,
            name: name.map(str::to_owned),
            graph: None,
        }
    }

    /// Read and parse a tree file.
    ///
    /// # Errors
    ///
    /// Returns [`DTreeError::Io`](crate::DTreeError::Io) if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self, crate::DTreeError> {
        let code = std::fs::read_to_string(path)?;
        Ok(Self::new(&code, name))
    }

    /// Read several files and parse their concatenation as one tree.
    ///
    /// # Errors
    ///
    /// Returns [`DTreeError::Io`](crate::DTreeError::Io) if any file cannot be read.
    pub fn from_files<P: AsRef<Path>>(
        paths: &[P],
        name: Option<&str>,
    ) -> Result<Self, crate::DTreeError> {
        let pieces = paths
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<Vec<String>, _>>()?;
        let pieces: Vec<&str> = pieces.iter().map(String::as_str).collect();
        Ok(Self::from_parsed(crate::parse::parse_sources(&pieces), name))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.graph.is_some()
    }

    #[must_use]
    pub fn no_errors(&self) -> bool {
        self.parsed.error().is_none()
    }

    #[must_use]
    pub fn error(&self) -> Option<&SyntaxError> {
        self.parsed.error()
    }

    #[must_use]
    pub fn code(&self) -> &str {
        self.parsed.code()
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        self.parsed.hash()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn parsed(&self) -> &ParsedTree {
        &self.parsed
    }

    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        self.parsed.fragments()
    }

    /// Number of checkpoints; zero until activated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.as_ref().map_or(0, |g| g.points.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn checkpoint(&self, point_no: usize) -> Option<&Checkpoint<C>> {
        self.graph.as_ref()?.points.get(point_no)
    }

    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint<C>] {
        self.graph.as_ref().map_or(&[], |g| &g.points)
    }

    #[must_use]
    pub fn story(&self, id: StoryId) -> Option<&Story> {
        self.graph.as_ref()?.stories.get(id.index())
    }

    /// `true` if the checkpoint is an import or error point.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the tree is inactive or the point does not exist.
    pub fn point_not_active(&self, point_no: usize) -> Result<bool, EvalError> {
        Ok(!self.point(point_no)?.is_active())
    }

    /// `true` if records may still be left over after the checkpoint, i.e. it
    /// is an `if` whose negation flows on to the next statement.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the tree is inactive or the point does not exist.
    pub fn check_zero_after(&self, point_no: usize) -> Result<bool, EvalError> {
        Ok(self.point(point_no)?.sub_story().is_some())
    }

    /// `true` when every path through the tree ends in a `return`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::NotActive`] if the tree has not been activated.
    pub fn is_determined(&self) -> Result<bool, EvalError> {
        Ok(self.undetermined_story()?.is_none())
    }

    /// First story (depth first) that does not end with a `return`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::NotActive`] if the tree has not been activated.
    pub fn undetermined_story(&self) -> Result<Option<StoryId>, EvalError> {
        Ok(self.graph()?.undetermined_story(StoryId::ROOT))
    }

    /// Structural summary of the activated tree.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::NotActive`] if the tree has not been activated.
    pub fn report_info(&self) -> Result<TreeReport, EvalError> {
        let graph = self.graph()?;
        let code_lines = self.parsed.code_lines();
        let fragments = self.parsed.fragments();

        let mut markers = BTreeMap::new();
        let mut points = Vec::with_capacity(graph.points.len());
        for (point, frag) in graph.points.iter().zip(fragments) {
            let leaves: Vec<_> = frag.markers().iter().map(|m| m.cond.clone()).collect();
            if !leaves.is_empty() {
                markers.insert(point.point_no(), leaves);
            }
            points.push(PointInfo {
                kind: point.kind(),
                level: point.level(),
                decision: point.decision(),
                cond_data: frag.cond_data().cloned(),
                code_frag: frag.code_frag(&code_lines),
            });
        }

        Ok(TreeReport {
            points,
            markers,
            code: self.parsed.code().to_owned(),
            hash: self.parsed.hash().to_owned(),
            error: !self.no_errors(),
            dtree_name: self.name.clone(),
        })
    }

    fn graph(&self) -> Result<&PointGraph<C>, EvalError> {
        self.graph.as_ref().ok_or(EvalError::NotActive)
    }

    fn point(&self, point_no: usize) -> Result<&Checkpoint<C>, EvalError> {
        let graph = self.graph()?;
        graph.points.get(point_no).ok_or(EvalError::NoSuchPoint {
            point_no,
            len: graph.points.len(),
        })
    }

    /// Graph of a tree that may be evaluated: active and free of errors.
    fn evaluable(&self) -> Result<&PointGraph<C>, EvalError> {
        let graph = self.graph()?;
        if !self.no_errors() {
            return Err(EvalError::HasErrors);
        }
        Ok(graph)
    }
}

impl<C: Condition> DTree<C> {
    /// Parse and activate in one step.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if activation fails.
    pub fn build<E, I>(
        code: &str,
        name: Option<&str>,
        env: &E,
        importer: &mut I,
    ) -> Result<Self, BuildError>
    where
        E: ConditionEnv<Cond = C>,
        I: UnitImporter<C> + ?Sized,
    {
        let mut tree = Self::new(code, name);
        tree.activate(env, importer)?;
        Ok(tree)
    }

    /// Build the checkpoint graph. Does nothing if the tree is already active;
    /// on failure the tree stays inactive.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] on a structural violation, a condition the
    /// environment rejects, or a failed import.
    pub fn activate<E, I>(&mut self, env: &E, importer: &mut I) -> Result<(), BuildError>
    where
        E: ConditionEnv<Cond = C>,
        I: UnitImporter<C> + ?Sized,
    {
        if self.graph.is_some() {
            return Ok(());
        }
        let graph = crate::build::activate(
            self.parsed.fragments(),
            self.parsed.hash(),
            env,
            importer,
        )?;
        self.graph = Some(graph);
        Ok(())
    }

    /// Condition under which control reaches the checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the tree is inactive, has errors, or has no
    /// such checkpoint.
    pub fn actual_condition(&self, point_no: usize) -> Result<C, EvalError> {
        let graph = self.evaluable()?;
        graph.actual(point_no).cloned().ok_or(EvalError::NoSuchPoint {
            point_no,
            len: graph.points.len(),
        })
    }

    /// Condition under which the branch of an `if` checkpoint is taken;
    /// `None` for other kinds of checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the tree is inactive, has errors, or has no
    /// such checkpoint.
    pub fn applied_condition(&self, point_no: usize) -> Result<Option<C>, EvalError> {
        let graph = self.evaluable()?;
        self.point(point_no)?;
        Ok(graph.applied(point_no))
    }

    /// Evaluate every checkpoint against `dataset` and collect the records
    /// selected by `return True` points.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] if the tree cannot be evaluated or the
    /// selection reaches [`EngineConfig::max_ws_size`].
    pub fn collect_rec_seq<D>(
        &self,
        dataset: &D,
        config: &EngineConfig,
    ) -> Result<Collected, CollectError>
    where
        D: Dataset<C> + ?Sized,
    {
        let graph = self.evaluable()?;
        let code_lines = self.parsed.code_lines();
        crate::collect::collect_rec_seq(
            graph,
            self.parsed.fragments(),
            &code_lines,
            dataset,
            config.max_ws_size(),
        )
    }
}

#[cfg(feature = "binary-cache")]
impl<C> DTree<C> {
    /// Serialize the parsed form of this tree. Activation state is not kept.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::serial::SerializeError> {
        self.parsed.to_bytes()
    }

    /// Load an inactive tree from bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(
        bytes: &[u8],
        name: Option<&str>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        Ok(Self::from_parsed(ParsedTree::from_bytes(bytes)?, name))
    }
}

impl<C> fmt::Display for DTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DTree({}, {} fragments, {})",
            self.name.as_deref().unwrap_or("unnamed"),
            self.parsed.fragments().len(),
            if self.is_active() { "active" } else { "inactive" },
        )
    }
}
