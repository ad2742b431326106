use std::collections::{HashMap, HashSet};

use nalgebra::{Matrix4, Vector3};
use serde_json::Value;
use tracing::{debug, warn};

use super::config::UniverseConfig;
use super::event::{Event, EventId, EventQueue, TRACK_OBJECT};
use super::observatory::Observatory;
use crate::bodies::Earth;
use crate::error::{KernelError, Result};
use crate::math::{rigid, JulianDate};
use crate::object::{Kind, Orientation, SimObject};
use crate::orbital::{
    EphemerisPropagator, LagrangeInterpolated, OrbitalState, Propagator, Sgp4Propagator,
    TwoBodyPropagator,
};
use crate::physics::constants::{MU_EARTH, OMEGA_EARTH};
use crate::scene::{ObjectId, ReferenceFrame};
use crate::sensor::{AzElGimbal, ElectroOpticalSensor, GimbalType, GroundStation, TrackMode};

/// Placement options shared by the satellite factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatelliteOptions {
    pub orientation: Orientation,
    /// Wrap the propagator in a Lagrange window cache.
    pub interpolated: bool,
    /// Updated in the trackable pass rather than the non-trackable one.
    pub trackable: bool,
}

impl Default for SatelliteOptions {
    fn default() -> Self {
        Self { orientation: Orientation::Fixed, interpolated: false, trackable: true }
    }
}

/// Owner of every simulated object and the scheduler that advances them.
///
/// Objects live in an arena addressed by [`ObjectId`]. The Earth and the Sun
/// are created with the universe and cannot be removed.
pub struct Universe {
    config: UniverseConfig,
    pub(crate) objects: Vec<Option<SimObject>>,
    names: HashMap<String, ObjectId>,
    pub(crate) earth: ObjectId,
    pub(crate) sun: ObjectId,
    pub(crate) trackables: Vec<ObjectId>,
    pub(crate) non_trackables: Vec<ObjectId>,
    pub(crate) observatories: Vec<Observatory>,
    pub(crate) events: EventQueue,
    /// Objects whose update is on the call stack.
    pub(crate) updating: HashSet<ObjectId>,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    pub fn new() -> Self {
        Self::with_config(UniverseConfig::default())
    }

    pub fn with_config(config: UniverseConfig) -> Self {
        let earth_model = config.earth_model;
        let mut universe = Self {
            config,
            objects: Vec::new(),
            names: HashMap::new(),
            earth: ObjectId(0),
            sun: ObjectId(0),
            trackables: Vec::new(),
            non_trackables: Vec::new(),
            observatories: Vec::new(),
            events: EventQueue::new(),
            updating: HashSet::new(),
        };
        let earth = SimObject::new("Earth", Some(ReferenceFrame::Fixed), Kind::Earth(Earth::new(earth_model)));
        universe.earth = universe.insert(earth, None, true);
        let sun = SimObject::new("Sun", Some(ReferenceFrame::Inertial), Kind::Sun);
        universe.sun = universe.insert(sun, None, true);
        universe.events.register_handler(TRACK_OBJECT, Box::new(track_object_handler));
        universe
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Factories
    // -----------------------------------------------------------------------

    fn insert(&mut self, mut object: SimObject, parent: Option<ObjectId>, indexed: bool) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        if let Some(parent) = parent {
            object.node.set_parent(Some(parent));
            if let Some(p) = self.object_mut(parent) {
                p.node.add_child(id);
            }
        }
        debug!(object = %object.name(), id = %id, kind = object.kind().label(), "object added");
        if indexed {
            if let Some(previous) = self.names.insert(object.name().to_string(), id) {
                warn!(object = %object.name(), previous = %previous, "duplicate object name, index now points at the newest");
            }
        }
        self.objects.push(Some(object));
        id
    }

    fn classify(&mut self, id: ObjectId, trackable: bool) {
        if trackable {
            self.trackables.push(id);
        } else {
            self.non_trackables.push(id);
        }
    }

    /// Ground site under the Earth node, local axes South-East-Zenith.
    pub fn add_ground_site(&mut self, name: &str, lat_deg: f64, lon_deg: f64, alt_m: f64, trackable: bool) -> ObjectId {
        let station = GroundStation::new(lat_deg, lon_deg, alt_m);
        let object = SimObject::new(name, Some(ReferenceFrame::Fixed), Kind::GroundStation(station));
        let id = self.insert(object, Some(self.earth), true);
        self.classify(id, trackable);
        id
    }

    /// Inertial object driven by any propagator.
    pub fn add_satellite(&mut self, name: &str, propagator: Box<dyn Propagator>, options: SatelliteOptions) -> ObjectId {
        let propagator: Box<dyn Propagator> = if options.interpolated {
            Box::new(LagrangeInterpolated::new(propagator, self.config.lagrange))
        } else {
            propagator
        };
        let kind = Kind::Satellite { propagator, orientation: options.orientation };
        let id = self.insert(SimObject::new(name, Some(ReferenceFrame::Inertial), kind), None, true);
        self.classify(id, options.trackable);
        id
    }

    pub fn add_sgp4_satellite(&mut self, name: &str, line1: &str, line2: &str, options: SatelliteOptions) -> Result<ObjectId> {
        let propagator = Sgp4Propagator::from_tle(name, line1, line2)?;
        Ok(self.add_satellite(name, Box::new(propagator), options))
    }

    pub fn add_two_body_satellite(
        &mut self,
        name: &str,
        r0: Vector3<f64>,
        v0: Vector3<f64>,
        t0: JulianDate,
        options: SatelliteOptions,
    ) -> ObjectId {
        let epoch = OrbitalState { time: t0, pos: r0, vel: v0 };
        let propagator = TwoBodyPropagator::with_mu(epoch, MU_EARTH, self.config.max_kepler_iterations);
        self.add_satellite(name, Box::new(propagator), options)
    }

    pub fn add_ephemeris_object(&mut self, name: &str, samples: Vec<OrbitalState>, options: SatelliteOptions) -> Result<ObjectId> {
        let propagator = EphemerisPropagator::new(name, samples)?;
        Ok(self.add_satellite(name, Box::new(propagator), options))
    }

    /// Plain transform group, updated in the non-trackable pass.
    pub fn add_group(&mut self, name: &str, parent: Option<ObjectId>, frame: Option<ReferenceFrame>) -> Result<ObjectId> {
        if let Some(parent) = parent {
            self.try_object(parent)?;
        }
        let id = self.insert(SimObject::new(name, frame, Kind::Group), parent, true);
        self.classify(id, false);
        Ok(id)
    }

    /// Site, gimbal and sensor as one unit. Only the site is name-indexed.
    pub fn add_ground_electro_optical_observatory(
        &mut self,
        name: &str,
        lat_deg: f64,
        lon_deg: f64,
        alt_m: f64,
        gimbal_type: GimbalType,
        sensor: ElectroOpticalSensor,
    ) -> Observatory {
        let site = self.add_ground_site(name, lat_deg, lon_deg, alt_m, false);
        let mount = match gimbal_type {
            GimbalType::AzEl => AzElGimbal::new(self.config.default_gimbal_range),
        };
        let gimbal = self.insert(SimObject::new(&format!("{name} gimbal"), None, Kind::Gimbal(mount)), Some(site), false);
        let sensor = self.insert(SimObject::new(&format!("{name} sensor"), None, Kind::Sensor(sensor)), Some(gimbal), false);
        let observatory = Observatory { site, gimbal, sensor };
        self.observatories.push(observatory);
        observatory
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn earth_id(&self) -> ObjectId {
        self.earth
    }

    pub fn sun_id(&self) -> ObjectId {
        self.sun
    }

    pub fn earth(&self) -> Option<&Earth> {
        self.object(self.earth).and_then(SimObject::earth)
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn get_object(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    pub fn object(&self, id: ObjectId) -> Option<&SimObject> {
        self.objects.get(id.index()).and_then(Option::as_ref)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SimObject> {
        self.objects.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub(crate) fn try_object(&self, id: ObjectId) -> Result<&SimObject> {
        self.object(id).ok_or(KernelError::UnknownObject(id))
    }

    pub(crate) fn try_object_mut(&mut self, id: ObjectId) -> Result<&mut SimObject> {
        self.object_mut(id).ok_or(KernelError::UnknownObject(id))
    }

    /// Live objects in creation order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SimObject)> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().map(|o| (ObjectId(i as u32), o)))
    }

    pub fn trackables(&self) -> &[ObjectId] {
        &self.trackables
    }

    pub fn non_trackables(&self) -> &[ObjectId] {
        &self.non_trackables
    }

    pub fn observatories(&self) -> &[Observatory] {
        &self.observatories
    }

    /// Observatory whose site carries `site_name`.
    pub fn observatory(&self, site_name: &str) -> Option<Observatory> {
        self.observatories
            .iter()
            .find(|o| self.object(o.site).is_some_and(|s| s.name() == site_name))
            .copied()
    }

    pub fn gimbal(&self, id: ObjectId) -> Option<&AzElGimbal> {
        self.object(id).and_then(SimObject::gimbal)
    }

    fn is_descendant(&self, candidate: ObjectId, ancestor: ObjectId) -> bool {
        let mut cursor = self.object(candidate).and_then(|o| o.node.parent());
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.object(id).and_then(|o| o.node.parent());
        }
        false
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    fn detach(&mut self, id: ObjectId) {
        let parent = self.object(id).and_then(|o| o.node.parent());
        if let Some(parent) = parent {
            if let Some(p) = self.object_mut(parent) {
                p.node.remove_child(id);
            }
        }
    }

    /// Remove `id` and its whole subtree; returns the removed handles.
    ///
    /// Removing a gimbal or sensor removes the observatory's mount and the
    /// observatory entry, leaving the site in place. Gimbals tracking a
    /// removed object stop tracking.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<Vec<ObjectId>> {
        let name = self.try_object(id)?.name().to_string();
        if id == self.earth || id == self.sun {
            warn!(object = %name, "refusing to remove a built-in body");
            return Ok(Vec::new());
        }

        let mut roots = vec![id];
        for obs in &self.observatories {
            if obs.site != id && obs.contains(id) {
                roots.push(obs.gimbal);
            }
        }

        let mut removed = Vec::new();
        for root in roots {
            self.detach(root);
            let mut stack = vec![root];
            while let Some(next) = stack.pop() {
                let Some(object) = self.objects.get_mut(next.index()).and_then(Option::take) else {
                    continue;
                };
                stack.extend_from_slice(object.node.children());
                if self.names.get(object.name()) == Some(&next) {
                    self.names.remove(object.name());
                }
                removed.push(next);
            }
        }

        self.trackables.retain(|o| !removed.contains(o));
        self.non_trackables.retain(|o| !removed.contains(o));
        self.observatories
            .retain(|obs| !obs.components().iter().any(|c| removed.contains(c)));
        for object in self.objects.iter_mut().flatten() {
            if let Some(gimbal) = object.gimbal_mut() {
                if gimbal.track_object().is_some_and(|t| removed.contains(&t)) {
                    gimbal.set_track_object(None);
                }
            }
        }

        debug!(object = %name, removed = removed.len(), "object removed");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Events, tracking, listeners
    // -----------------------------------------------------------------------

    pub fn schedule_event(&mut self, event: Event) -> EventId {
        self.events.add(event)
    }

    /// Handler for every event of type `kind` without its own handler.
    pub fn register_handler<F>(&mut self, kind: &str, handler: F)
    where
        F: FnMut(&mut Universe, &Event) -> Result<()> + 'static,
    {
        self.events.register_handler(kind, Box::new(handler));
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    fn gimbal_mut_checked(&mut self, gimbal: ObjectId) -> Result<&mut AzElGimbal> {
        let object = self.try_object_mut(gimbal)?;
        let name = object.name().to_string();
        object.gimbal_mut().ok_or(KernelError::WrongKind { name, expected: "gimbal" })
    }

    /// Target the gimbal at `target`, or stop tracking with `None`.
    ///
    /// Tracking itself or a direct child is ignored with a warning; a deeper
    /// descendant is a contract violation.
    pub fn set_track_object(&mut self, gimbal: ObjectId, target: Option<ObjectId>) -> Result<()> {
        self.gimbal_mut_checked(gimbal)?;
        if let Some(target) = target {
            let target_object = self.try_object(target)?;
            if target == gimbal || target_object.node.parent() == Some(gimbal) {
                warn!(gimbal = %gimbal, target = %target_object.name(), "gimbal cannot track itself or its child");
                return Ok(());
            }
            if self.is_descendant(target, gimbal) {
                return Err(KernelError::DescendantTrackTarget {
                    gimbal: self.try_object(gimbal)?.name().to_string(),
                    target: target_object.name().to_string(),
                });
            }
        }
        self.gimbal_mut_checked(gimbal)?.set_track_object(target);
        Ok(())
    }

    pub fn set_track_mode(&mut self, gimbal: ObjectId, mode: TrackMode) -> Result<()> {
        self.gimbal_mut_checked(gimbal)?.set_track_mode(mode);
        Ok(())
    }

    /// Command fixed-mode pointing, degrees.
    pub fn set_gimbal_angles(&mut self, gimbal: ObjectId, az: f64, el: f64) -> Result<()> {
        self.gimbal_mut_checked(gimbal)?.set_angles(az, el);
        Ok(())
    }

    /// Run `listener` after every update of `id`.
    pub fn add_update_listener<F>(&mut self, id: ObjectId, listener: F) -> Result<()>
    where
        F: FnMut(&Universe, ObjectId, &JulianDate) + 'static,
    {
        self.try_object_mut(id)?.listeners.push(Box::new(listener));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Frames and transforms
    // -----------------------------------------------------------------------

    /// Own declared frame, else the nearest ancestor's.
    pub fn reference_frame(&self, id: ObjectId) -> Result<ReferenceFrame> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let object = self.try_object(current)?;
            if let Some(frame) = object.declared_frame() {
                return Ok(frame);
            }
            cursor = object.node.parent();
        }
        Err(KernelError::UnresolvedFrame(self.try_object(id)?.name().to_string()))
    }

    /// Local-to-world transform, catching the parent up to this node's time
    /// first when the node is dirty. A node whose update is in progress has
    /// no settled time yet and is composed as it stands.
    pub fn local_to_world(&mut self, id: ObjectId) -> Result<Matrix4<f64>> {
        let object = self.try_object(id)?;
        let Some(parent) = object.node.parent() else {
            let local = *object.node.local();
            self.try_object_mut(id)?.node.clear_dirty();
            return Ok(local);
        };
        if object.node.is_dirty() && !self.updating.contains(&id) {
            if let Some(t) = object.time {
                if self.try_object(parent)?.time != Some(t) {
                    self.update_object(parent, &t, false, false)?;
                }
            }
        }
        let parent_to_world = self.local_to_world(parent)?;
        let object = self.try_object_mut(id)?;
        object.node.clear_dirty();
        Ok(parent_to_world * object.node.local())
    }

    pub fn world_to_local(&mut self, id: ObjectId) -> Result<Matrix4<f64>> {
        Ok(rigid::rigid_inverse(&self.local_to_world(id)?))
    }

    /// World (inertial) point expressed in the local frame of `id`.
    pub fn transform_point_to(&mut self, id: ObjectId, world_point: &Vector3<f64>) -> Result<Vector3<f64>> {
        Ok(rigid::transform_point(&self.world_to_local(id)?, world_point))
    }

    pub fn world_position(&mut self, id: ObjectId) -> Result<Vector3<f64>> {
        if id == self.earth {
            return Ok(Vector3::zeros());
        }
        match self.reference_frame(id)? {
            ReferenceFrame::Inertial => Ok(*self.try_object(id)?.position()),
            ReferenceFrame::Fixed => Ok(rigid::translation_part(&self.local_to_world(id)?)),
        }
    }

    /// Inertial velocity; Earth-fixed objects pick up `omega x r`.
    pub fn world_velocity(&mut self, id: ObjectId) -> Result<Vector3<f64>> {
        if id == self.earth {
            return Ok(Vector3::zeros());
        }
        match self.reference_frame(id)? {
            ReferenceFrame::Inertial => Ok(*self.try_object(id)?.velocity()),
            ReferenceFrame::Fixed => {
                let world = self.world_position(id)?;
                let velocity = *self.try_object(id)?.velocity();
                let earth = self
                    .earth()
                    .ok_or(KernelError::UnknownObject(self.earth))?;
                let r_fixed = earth.transform_point_from_world(&world);
                let v_fixed = velocity + Vector3::new(0.0, 0.0, OMEGA_EARTH).cross(&r_fixed);
                Ok(earth.transform_vector_to_world(&v_fixed))
            }
        }
    }
}

/// Built-in `trackObject` handler: `data = {observer, target}`.
fn track_object_handler(universe: &mut Universe, event: &Event) -> Result<()> {
    let Some(observer) = event.data.get("observer").and_then(Value::as_str) else {
        warn!(event = ?event, "trackObject event without an observer");
        return Ok(());
    };
    let Some(observatory) = universe.observatory(observer) else {
        warn!(observer, "trackObject: no observatory with that site name");
        return Ok(());
    };
    let target = match event.data.get("target").and_then(Value::as_str) {
        None => None,
        Some(name) => match universe.get_object(name) {
            Some(id) => Some(id),
            None => {
                warn!(observer, target = name, "trackObject: unknown target, tracking unchanged");
                return Ok(());
            }
        },
    };
    universe.set_track_mode(observatory.gimbal, TrackMode::Rate)?;
    universe.set_track_object(observatory.gimbal, target)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::sensor::FieldOfRegard;

    fn t0() -> JulianDate {
        JulianDate::from_utc(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn with_observatory() -> (Universe, Observatory) {
        let mut u = Universe::new();
        let sensor = ElectroOpticalSensor::new(512, 512, 1.0, 1.0, vec![FieldOfRegard::hemisphere()]);
        let obs = u.add_ground_electro_optical_observatory("OBS", 0.0, 0.0, 0.0, GimbalType::AzEl, sensor);
        (u, obs)
    }

    /// Earth-fixed marker at `ecef`.
    fn fixed_marker(u: &mut Universe, name: &str, ecef: Vector3<f64>) -> ObjectId {
        let earth = u.earth_id();
        let id = u.add_group(name, Some(earth), None).unwrap();
        u.object_mut(id).unwrap().set_state(ecef, Vector3::zeros());
        id
    }

    #[test]
    fn builtin_bodies() {
        let mut u = Universe::new();
        assert_eq!(u.get_object("Earth"), Some(u.earth_id()));
        assert_eq!(u.get_object("Sun"), Some(u.sun_id()));
        u.update(&t0()).unwrap();
        let earth = u.earth_id();
        assert_eq!(u.world_position(earth).unwrap(), Vector3::zeros());
        assert_eq!(u.world_velocity(earth).unwrap(), Vector3::zeros());
        assert!(u.remove_object(earth).unwrap().is_empty());
        assert!(u.has_object("Earth"));
        let sun = u.sun_id();
        let sun_pos = u.world_position(sun).unwrap();
        assert_eq!(&sun_pos, u.object(sun).unwrap().position());
    }

    #[test]
    fn duplicate_names_reindex() {
        let mut u = Universe::new();
        let a = u.add_ground_site("SITE", 10.0, 10.0, 0.0, false);
        let b = u.add_ground_site("SITE", 20.0, 20.0, 0.0, false);
        assert_eq!(u.get_object("SITE"), Some(b));
        assert!(u.non_trackables().contains(&a) && u.non_trackables().contains(&b));
    }

    #[test]
    fn frame_resolution() {
        let mut u = Universe::new();
        let site = u.add_ground_site("SITE", 0.0, 0.0, 0.0, false);
        let child = u.add_group("child", Some(site), None).unwrap();
        assert_eq!(u.reference_frame(child).unwrap(), ReferenceFrame::Fixed);
        let orphan = u.add_group("orphan", None, None).unwrap();
        assert!(matches!(u.reference_frame(orphan), Err(KernelError::UnresolvedFrame(_))));
        assert!(matches!(u.add_group("bad", Some(ObjectId(999)), None), Err(KernelError::UnknownObject(_))));
    }

    #[test]
    fn track_guards() {
        let (mut u, obs) = with_observatory();
        u.set_track_object(obs.gimbal, Some(obs.gimbal)).unwrap();
        assert_eq!(u.gimbal(obs.gimbal).unwrap().track_object(), None);
        u.set_track_object(obs.gimbal, Some(obs.sensor)).unwrap();
        assert_eq!(u.gimbal(obs.gimbal).unwrap().track_object(), None);

        let deep = u.add_group("deep", Some(obs.sensor), None).unwrap();
        let err = u.set_track_object(obs.gimbal, Some(deep)).unwrap_err();
        assert!(matches!(err, KernelError::DescendantTrackTarget { .. }));
        assert!(err.is_contract_violation());

        let site = u.get_object("OBS").unwrap();
        assert!(matches!(u.set_track_mode(site, TrackMode::Rate), Err(KernelError::WrongKind { .. })));
    }

    #[test]
    fn rate_tracking_points_at_target() {
        let (mut u, obs) = with_observatory();
        let station = *u.object(obs.site).unwrap().ground_station().unwrap().ecef();
        let overhead = fixed_marker(&mut u, "overhead", station + Vector3::new(1.0e6, 0.0, 0.0));
        let east = fixed_marker(&mut u, "east", station + Vector3::new(0.0, 1.0e5, 0.0));

        u.set_track_mode(obs.gimbal, TrackMode::Rate).unwrap();
        u.set_track_object(obs.gimbal, Some(overhead)).unwrap();
        u.update(&t0()).unwrap();
        let g = u.gimbal(obs.gimbal).unwrap();
        assert!((g.el() - 90.0).abs() < 1e-6, "el {}", g.el());
        assert!((g.range() - 1.0e6).abs() < 1e-3, "range {}", g.range());

        u.set_track_object(obs.gimbal, Some(east)).unwrap();
        u.update(&t0()).unwrap();
        let g = u.gimbal(obs.gimbal).unwrap();
        assert!((g.az() - 90.0).abs() < 1e-6 && g.el().abs() < 1e-6, "az {} el {}", g.az(), g.el());

        // The sensor boresight (-Z) points along the line of sight in world axes.
        let sensor_to_world = u.local_to_world(obs.sensor).unwrap();
        let boresight = rigid::transform_vector(&sensor_to_world, &Vector3::new(0.0, 0.0, -1.0));
        let line_of_sight = (u.world_position(east).unwrap() - u.world_position(obs.site).unwrap()).normalize();
        assert!((boresight - line_of_sight).norm() < 1e-9);
    }

    #[test]
    fn gimbals_tracking_each_other_settle() {
        let (mut u, a) = with_observatory();
        let sensor = ElectroOpticalSensor::new(512, 512, 1.0, 1.0, vec![FieldOfRegard::hemisphere()]);
        let b = u.add_ground_electro_optical_observatory("EAST", 0.0, 10.0, 0.0, GimbalType::AzEl, sensor);
        for (from, to) in [(a, b), (b, a)] {
            u.set_track_mode(from.gimbal, TrackMode::Rate).unwrap();
            u.set_track_object(from.gimbal, Some(to.sensor)).unwrap();
        }

        for step in 0..3 {
            let t = t0().add_seconds(60.0 * step as f64);
            u.update(&t).unwrap();
            assert!(u.updating.is_empty(), "update left objects marked in progress");
            for id in a.components().into_iter().chain(b.components()) {
                assert_eq!(u.object(id).unwrap().time(), Some(&t));
            }
        }

        let ga = u.gimbal(a.gimbal).unwrap();
        let gb = u.gimbal(b.gimbal).unwrap();
        assert!((ga.az() - 90.0).abs() < 1e-6, "A looks east, az {}", ga.az());
        assert!((gb.az() - 270.0).abs() < 1e-6, "B looks west, az {}", gb.az());
        assert!(ga.el() < 0.0 && (ga.el() - gb.el()).abs() < 1e-9);
        let chord = (station_ecef(0.0, 10.0) - station_ecef(0.0, 0.0)).norm();
        assert!((ga.range() - chord).abs() < 1e-3, "range {} vs {}", ga.range(), chord);
    }

    #[test]
    fn transforms_compose_parent_first() {
        let (mut u, obs) = with_observatory();
        u.set_gimbal_angles(obs.gimbal, 30.0, 40.0).unwrap();
        u.update(&t0()).unwrap();
        let parent = u.local_to_world(obs.gimbal).unwrap();
        let sensor = u.local_to_world(obs.sensor).unwrap();
        let local = *u.object(obs.sensor).unwrap().local_transform();
        assert_eq!(sensor, parent * local);
        let round_trip = u.world_to_local(obs.sensor).unwrap() * sensor;
        assert!((round_trip - Matrix4::identity()).norm() < 1e-9);
    }

    #[test]
    fn stale_fixed_node_catches_earth_up() {
        let mut u = Universe::new();
        let site = u.add_ground_site("SITE", 45.0, 45.0, 0.0, false);
        u.update(&t0()).unwrap();
        let at_t0 = u.world_position(site).unwrap();

        // Move only the Earth forward; the site is now stale relative to it.
        let earth = u.earth_id();
        u.update_object(earth, &t0().add_seconds(3_600.0), false, true).unwrap();
        u.object_mut(site).unwrap().node_mut().set_translation(&station_ecef(45.0, 45.0));
        let again = u.world_position(site).unwrap();
        assert!((again - at_t0).norm() < 1e-6, "moved {} m", (again - at_t0).norm());
        assert_eq!(u.object(earth).unwrap().time(), Some(&t0()));
    }

    fn station_ecef(lat: f64, lon: f64) -> Vector3<f64> {
        *GroundStation::new(lat, lon, 0.0).ecef()
    }

    #[test]
    fn removing_site_removes_observatory() {
        let (mut u, obs) = with_observatory();
        let site = u.get_object("OBS").unwrap();
        let removed = u.remove_object(site).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(u.observatories().is_empty());
        assert!(!u.has_object("OBS"));
        assert!(u.object(obs.sensor).is_none());
        assert!(!u.object(u.earth_id()).unwrap().node().children().contains(&site));
        u.update(&t0()).unwrap();
    }

    #[test]
    fn removing_sensor_keeps_site() {
        let (mut u, obs) = with_observatory();
        let removed = u.remove_object(obs.sensor).unwrap();
        assert!(removed.contains(&obs.gimbal) && removed.contains(&obs.sensor));
        assert!(u.observatories().is_empty());
        assert!(u.object(obs.site).unwrap().node().children().is_empty());
        assert!(u.has_object("OBS"));
    }

    #[test]
    fn removing_target_stops_tracking() {
        let (mut u, obs) = with_observatory();
        let target = fixed_marker(&mut u, "target", Vector3::new(8.0e6, 0.0, 0.0));
        u.set_track_object(obs.gimbal, Some(target)).unwrap();
        u.remove_object(target).unwrap();
        assert_eq!(u.gimbal(obs.gimbal).unwrap().track_object(), None);
        assert!(matches!(u.remove_object(target), Err(KernelError::UnknownObject(_))));
    }

    #[test]
    fn listeners_see_each_update() {
        let mut u = Universe::new();
        let site = u.add_ground_site("SITE", 0.0, 0.0, 0.0, false);
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        u.add_update_listener(site, move |universe, id, t| {
            assert_eq!(universe.object(id).unwrap().time(), Some(t));
            counter.set(counter.get() + 1);
        })
        .unwrap();
        u.update(&t0()).unwrap();
        u.update(&t0()).unwrap();
        assert_eq!(seen.get(), 1, "unforced update at the same time is skipped");
        u.update_with(&t0(), true).unwrap();
        assert_eq!(seen.get(), 2);
        assert_eq!(u.object(site).unwrap().listener_count(), 1);
    }

    #[test]
    fn every_object_reaches_tick_time() {
        let (mut u, _) = with_observatory();
        u.add_two_body_satellite(
            "SAT",
            Vector3::new(7.0e6, 0.0, 0.0),
            Vector3::new(0.0, 7_546.0, 0.0),
            t0(),
            SatelliteOptions { orientation: Orientation::Nadir, ..Default::default() },
        );
        let t = t0().add_seconds(120.0);
        u.update(&t).unwrap();
        for (id, object) in u.objects() {
            assert_eq!(object.time(), Some(&t), "{} {}", id, object.name());
        }
    }

    #[test]
    fn handlers_can_schedule_more_events() {
        let mut u = Universe::new();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        u.register_handler("chain", move |universe, event| {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                universe.schedule_event(Event::new(event.time.add_seconds(1.0), "chain", Value::Null));
                universe.schedule_event(Event::new(event.time.add_seconds(100.0), "chain", Value::Null));
            }
            Ok(())
        });
        u.schedule_event(Event::new(t0(), "chain", Value::Null));
        u.update(&t0().add_seconds(10.0)).unwrap();
        assert_eq!(fired.get(), 2);
        assert_eq!(u.pending_events(), 1);
    }

    #[test]
    fn handler_errors_abort_the_tick() {
        let mut u = Universe::new();
        u.schedule_event(Event::new(t0(), "boom", Value::Null).with_handler(Box::new(|_: &mut Universe, _: &Event| {
            Err(KernelError::Handler { kind: "boom".into(), reason: "test".into() })
        })));
        assert!(u.update(&t0()).is_err());
        assert!(u.object(u.earth_id()).unwrap().time().is_none());
    }
}
