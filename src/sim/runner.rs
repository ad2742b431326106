use tracing::{debug, warn};

use super::universe::Universe;
use crate::error::Result;
use crate::math::{south_east_zenith_to_az_el, JulianDate};
use crate::object::Kind;
use crate::scene::ObjectId;
use crate::sensor::TrackMode;

// ---------------------------------------------------------------------------
// Tick scheduling
// ---------------------------------------------------------------------------

impl Universe {
    /// Advance everything to `t`.
    pub fn update(&mut self, t: &JulianDate) -> Result<()> {
        self.update_with(t, false)
    }

    /// Advance everything to `t`, in a fixed order: due events, Earth, Sun,
    /// trackables, non-trackables, then each observatory's site, gimbal and
    /// sensor. Observatories are always forced so gimbals can slew while the
    /// clock stands still.
    pub fn update_with(&mut self, t: &JulianDate, force: bool) -> Result<()> {
        self.process_events(t)?;

        self.update_object(self.earth, t, force, true)?;
        self.update_object(self.sun, t, force, true)?;
        for i in 0..self.trackables.len() {
            let id = self.trackables[i];
            self.update_object(id, t, force, true)?;
        }
        for i in 0..self.non_trackables.len() {
            let id = self.non_trackables[i];
            self.update_object(id, t, force, true)?;
        }
        for i in 0..self.observatories.len() {
            for id in self.observatories[i].components() {
                self.update_object(id, t, true, true)?;
            }
        }
        Ok(())
    }

    /// Bring one object to `t`.
    ///
    /// Skipped when already at `t` unless forced. With `update_parent` the
    /// parent chain is brought to `t` first. An object reached again while
    /// its own update is in progress (gimbals tracking each other) keeps its
    /// current state.
    pub fn update_object(&mut self, id: ObjectId, t: &JulianDate, force: bool, update_parent: bool) -> Result<()> {
        let object = self.try_object(id)?;
        if !force && object.time.as_ref() == Some(t) {
            return Ok(());
        }
        if !self.updating.insert(id) {
            debug!(object = %id, "update cycle, using current state");
            return Ok(());
        }
        let result = self.refresh_object(id, t, force, update_parent);
        self.updating.remove(&id);
        result
    }

    fn refresh_object(&mut self, id: ObjectId, t: &JulianDate, force: bool, update_parent: bool) -> Result<()> {
        let object = self.try_object(id)?;
        let parent = object.node.parent();
        let is_gimbal = matches!(object.kind, Kind::Gimbal(_));

        if update_parent {
            if let Some(parent) = parent {
                self.update_object(parent, t, force, true)?;
            }
        }

        if is_gimbal {
            self.refresh_gimbal(id, t)?;
        } else {
            self.try_object_mut(id)?.refresh_local(t);
        }

        let object = self.try_object_mut(id)?;
        let position = object.position;
        object.node.set_translation(&position);
        object.time = Some(*t);

        self.notify_listeners(id, t);
        Ok(())
    }

    fn refresh_gimbal(&mut self, id: ObjectId, t: &JulianDate) -> Result<()> {
        let object = self.try_object(id)?;
        let site = object.node.parent();
        let (mode, target) = match object.gimbal() {
            Some(g) => (g.track_mode(), g.track_object()),
            None => return Ok(()),
        };

        let mut look = None;
        if let (TrackMode::Rate, Some(target), Some(site)) = (mode, target, site) {
            if self.object(target).is_some() {
                self.update_object(target, t, false, true)?;
                let world = self.world_position(target)?;
                let local = self.transform_point_to(site, &world)?;
                look = Some(south_east_zenith_to_az_el(&local));
            } else {
                warn!(gimbal = %id, target = %target, "track object no longer exists, tracking stopped");
                if let Some(g) = self.try_object_mut(id)?.gimbal_mut() {
                    g.set_track_object(None);
                }
            }
        }

        let object = self.try_object_mut(id)?;
        if let Kind::Gimbal(gimbal) = &mut object.kind {
            if let Some(look) = look {
                gimbal.point(&look);
            }
            if mode != TrackMode::Sidereal {
                gimbal.compose(&mut object.node);
            }
        }
        Ok(())
    }

    fn notify_listeners(&mut self, id: ObjectId, t: &JulianDate) {
        let Some(object) = self.object_mut(id) else {
            return;
        };
        if object.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut object.listeners);
        for listener in listeners.iter_mut() {
            listener(self, id, t);
        }
        if let Some(object) = self.object_mut(id) {
            object.listeners = listeners;
        }
    }

    // -----------------------------------------------------------------------
    // Event dispatch
    // -----------------------------------------------------------------------

    /// Fire every event due at or before `now`, earliest first. Events that
    /// handlers schedule for `now` or earlier fire in the same drain.
    pub(crate) fn process_events(&mut self, now: &JulianDate) -> Result<()> {
        while let Some((id, mut event)) = self.events.pop_due(now) {
            debug!(event = %id, kind = %event.kind, time = %event.time, "dispatching event");
            if let Some(mut handler) = event.handler.take() {
                handler(self, &event)?;
            } else if let Some(mut handler) = self.events.take_handler(&event.kind) {
                let result = handler(self, &event);
                self.events.restore_handler(&event.kind, handler);
                result?;
            } else {
                warn!(event = %id, kind = %event.kind, "no handler for event type, dropped");
            }
        }
        Ok(())
    }
}
