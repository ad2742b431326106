use crate::scene::ObjectId;

/// Site, gimbal and sensor that always move together.
///
/// The gimbal is a child of the site and the sensor a child of the gimbal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Observatory {
    pub site: ObjectId,
    pub gimbal: ObjectId,
    pub sensor: ObjectId,
}

impl Observatory {
    pub fn contains(&self, id: ObjectId) -> bool {
        self.site == id || self.gimbal == id || self.sensor == id
    }

    pub fn components(&self) -> [ObjectId; 3] {
        [self.site, self.gimbal, self.sensor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_in_update_order() {
        let obs = Observatory { site: ObjectId(4), gimbal: ObjectId(5), sensor: ObjectId(6) };
        assert_eq!(obs.components(), [ObjectId(4), ObjectId(5), ObjectId(6)]);
        assert!(obs.contains(ObjectId(5)));
        assert!(!obs.contains(ObjectId(7)));
    }
}
