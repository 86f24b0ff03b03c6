//! Builds the transition model from mobility traces and samples from it.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::{debug, info, warn};

use gd_core::{Point, Route};

use crate::directions::{DirectionsProvider, RouteDetails, shortest_route_details};
use crate::geocoder::{OsmId, ReverseGeocoder};
use crate::store::{MobilityStore, Transition};
use crate::MobilityResult;

/// A road-segment transition model over one [`MobilityStore`].
///
/// `G` maps points to segments and `D` provides the distance and duration
/// of each movement.
pub struct MobilityModel<G, D> {
    store:      MobilityStore,
    geocoder:   G,
    directions: D,
    nr_routes:  usize,
}

/// Segments and route details for one consecutive point pair.
struct PairLookup {
    current: OsmId,
    next:    OsmId,
    details: RouteDetails,
}

impl<G: ReverseGeocoder, D: DirectionsProvider> MobilityModel<G, D> {
    pub fn new(store: MobilityStore, geocoder: G, directions: D) -> Self {
        Self { store, geocoder, directions, nr_routes: 0 }
    }

    /// Add `traces` to the model, then recompute transition probabilities.
    ///
    /// Each trace is its trip start time and a `LatLon` route.  Pairs whose
    /// segments cannot be looked up are skipped with a warning.
    pub fn calculate<'a, I>(&mut self, traces: I) -> MobilityResult<()>
    where
        I: IntoIterator<Item = (DateTime<Utc>, &'a Route)>,
    {
        let mut skipped = 0usize;
        for (trip_start, route) in traces {
            let weekday = trip_start.weekday().num_days_from_monday();
            self.nr_routes += 1;

            let last_pair = route.len().saturating_sub(2);
            for (i, pair) in route.points().windows(2).enumerate() {
                let current_point = pair[0].to_degrees()?;
                let next_point = pair[1].to_degrees()?;

                let lookup = match self.lookup_pair(&current_point, &next_point) {
                    Ok(lookup) => lookup,
                    Err(e) => {
                        warn!(
                            route = self.nr_routes, pair = i, current = %current_point, next = %next_point,
                            error = %e, "segment lookup failed, pair skipped"
                        );
                        skipped += 1;
                        continue;
                    }
                };
                debug!(
                    route = self.nr_routes, pair = i, from = %lookup.current, to = %lookup.next,
                    distance_m = lookup.details.distance_m, "transition"
                );

                self.store.create_or_update_transition(
                    lookup.current,
                    lookup.next,
                    weekday,
                    lookup.details.distance_m,
                    lookup.details.duration_s,
                )?;
                self.store.create_or_update_location(lookup.current, &current_point)?;
                if i == last_pair {
                    self.store.create_or_update_location(lookup.next, &next_point)?;
                }
            }
        }

        self.store.calculate_transition_probabilities()?;
        info!(
            routes = self.nr_routes,
            skipped_pairs = skipped,
            transitions = self.store.transition_count()?,
            locations = self.store.location_count()?,
            "mobility model updated"
        );
        Ok(())
    }

    fn lookup_pair(&self, current: &Point, next: &Point) -> MobilityResult<PairLookup> {
        Ok(PairLookup {
            current: self.geocoder.reverse(current)?,
            next:    self.geocoder.reverse(next)?,
            details: shortest_route_details(&self.directions, current, next)?,
        })
    }

    /// Draw the next segment after `start` on `weekday`, weighted by
    /// transition probability.  Segments in `visited` are never chosen.
    /// `None` if no transition with a positive probability exists.
    pub fn sample_next_segment<R: Rng + ?Sized>(
        &self,
        start: OsmId,
        visited: &[OsmId],
        weekday: u32,
        rng: &mut R,
    ) -> MobilityResult<Option<Transition>> {
        let mut candidates = self.store.find_possible_transitions(start, visited, weekday)?;
        if candidates.is_empty() {
            return Ok(None);
        }
        let weights: Vec<f64> = candidates
            .iter()
            .map(|t| t.transition_probability.unwrap_or(0.0))
            .collect();
        let Ok(dist) = WeightedIndex::new(&weights) else {
            debug!(%start, weekday, "no transition with a positive probability");
            return Ok(None);
        };
        Ok(Some(candidates.swap_remove(dist.sample(rng))))
    }

    /// Number of traces processed so far.
    pub fn nr_routes(&self) -> usize {
        self.nr_routes
    }

    pub fn store(&self) -> &MobilityStore {
        &self.store
    }

    pub fn into_store(self) -> MobilityStore {
        self.store
    }
}
