use std::collections::BTreeMap;

use super::observatory::Observatory;
use super::universe::Universe;
use crate::error::Result;
use crate::math::{south_east_zenith_to_az_el, AzElRange};
use crate::scene::ObjectId;

/// Colour class for a target by how many observatories hold it in regard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityClass {
    Single,
    Double,
    Multiple,
}

impl VisibilityClass {
    /// `None` for targets no observatory can see.
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            _ => Some(Self::Multiple),
        }
    }

    /// Display colour as linear RGB.
    pub fn rgb(self) -> [f32; 3] {
        match self {
            Self::Single => [1.0, 0.4, 0.0],   // red-orange
            Self::Double => [1.0, 1.0, 0.0],   // yellow
            Self::Multiple => [0.0, 1.0, 0.0], // green
        }
    }
}

/// One observatory holding one target in its field of regard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityHit {
    pub observatory: Observatory,
    pub target: ObjectId,
    pub look: AzElRange,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityReport {
    pub hits: Vec<VisibilityHit>,
    pub counts: BTreeMap<ObjectId, usize>,
}

impl VisibilityReport {
    pub fn count(&self, target: ObjectId) -> usize {
        self.counts.get(&target).copied().unwrap_or(0)
    }

    pub fn class(&self, target: ObjectId) -> Option<VisibilityClass> {
        VisibilityClass::from_count(self.count(target))
    }
}

impl Universe {
    /// Test every observatory against every candidate with each sensor's
    /// field of regard, using current object states.
    pub fn visibility(&mut self, candidates: &[ObjectId]) -> Result<VisibilityReport> {
        let mut report = VisibilityReport::default();
        let observatories = self.observatories.clone();
        for &target in candidates {
            let world = self.world_position(target)?;
            let mut count = 0;
            for obs in &observatories {
                let local = self.transform_point_to(obs.site, &world)?;
                let look = south_east_zenith_to_az_el(&local);
                let seen = self
                    .try_object(obs.sensor)?
                    .sensor()
                    .is_some_and(|s| s.in_regard(&look));
                if seen {
                    count += 1;
                    report.hits.push(VisibilityHit { observatory: *obs, target, look });
                }
            }
            report.counts.insert(target, count);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_by_count() {
        assert_eq!(VisibilityClass::from_count(0), None);
        assert_eq!(VisibilityClass::from_count(1), Some(VisibilityClass::Single));
        assert_eq!(VisibilityClass::from_count(2), Some(VisibilityClass::Double));
        assert_eq!(VisibilityClass::from_count(7), Some(VisibilityClass::Multiple));
        assert_eq!(VisibilityClass::Multiple.rgb(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn empty_report() {
        let report = VisibilityReport::default();
        assert_eq!(report.count(ObjectId(3)), 0);
        assert!(report.class(ObjectId(3)).is_none());
    }
}
