use crate::env::Condition;
use crate::types::PointGraph;

impl<C: Condition> PointGraph<C> {
    /// Condition under which control reaches the checkpoint.
    ///
    /// Without a predecessor this is the match-all condition. A predecessor
    /// at the same level means every earlier sibling `if` was false. A nested
    /// `return` is reached exactly when its opening `if` is taken.
    pub(crate) fn actual(&self, point_no: usize) -> Option<&C> {
        let point = self.points.get(point_no)?;
        if let Some(cond) = point.actual.get() {
            return Some(cond);
        }
        let cond = match point.prev_point {
            None => self.cond_all.clone(),
            Some(prev) if self.points.get(prev)?.level == point.level => {
                self.accumulated(prev)?.negate()
            }
            Some(prev) => self.applied(prev)?,
        };
        Some(point.actual.get_or_init(|| cond))
    }

    /// Union of the own conditions of an `if` and every earlier sibling `if`.
    ///
    /// Walks back to the nearest cached value and folds forward, so long
    /// chains are computed without recursion.
    pub(crate) fn accumulated(&self, point_no: usize) -> Option<&C> {
        let mut chain = Vec::new();
        let mut cursor = Some(point_no);
        let mut acc: Option<&C> = None;
        while let Some(no) = cursor {
            let point = self.points.get(no)?;
            if let Some(cached) = point.accumulated.get() {
                acc = Some(cached);
                break;
            }
            chain.push(no);
            cursor = point.prev_point;
        }
        for &no in chain.iter().rev() {
            let point = &self.points[no];
            let own = point.own_condition()?;
            let prev = acc;
            acc = Some(point.accumulated.get_or_init(|| match prev {
                Some(prev) => prev.or(own),
                None => own.clone(),
            }));
        }
        acc
    }

    /// Condition under which the branch of an `if` is taken.
    pub(crate) fn applied(&self, point_no: usize) -> Option<C> {
        let own = self.points.get(point_no)?.own_condition()?;
        Some(self.actual(point_no)?.and(own))
    }
}
