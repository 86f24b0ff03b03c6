//! Unit tests for gd-mobility.  No network access: services are stubbed.

#[cfg(test)]
mod stubs {
    use gd_core::{Point, Route};

    use crate::{Directions, DirectionsProvider, MobilityError, MobilityResult, OsmId, ReverseGeocoder};

    /// Maps a point to `round(lon * 1000)`.  Fails for longitudes above
    /// `fail_above_lon`.
    pub struct GridGeocoder {
        pub fail_above_lon: f64,
    }

    impl Default for GridGeocoder {
        fn default() -> Self {
            Self { fail_above_lon: f64::INFINITY }
        }
    }

    impl ReverseGeocoder for GridGeocoder {
        fn reverse(&self, point: &Point) -> MobilityResult<OsmId> {
            let point = point.to_degrees()?;
            if point.x_lon() > self.fail_above_lon {
                return Err(MobilityError::BadResponse("stub geocoder refused".to_string()));
            }
            Ok(OsmId((point.x_lon() * 1000.0).round() as i64))
        }
    }

    pub struct FixedDirections {
        pub fail:       bool,
        pub distance_m: Option<f64>,
        pub duration_s: Option<f64>,
    }

    impl FixedDirections {
        pub fn ok(distance_m: f64, duration_s: f64) -> Self {
            Self { fail: false, distance_m: Some(distance_m), duration_s: Some(duration_s) }
        }

        pub fn failing() -> Self {
            Self { fail: true, distance_m: None, duration_s: None }
        }
    }

    impl DirectionsProvider for FixedDirections {
        fn directions(&self, from: &Point, to: &Point) -> MobilityResult<Directions> {
            if self.fail {
                return Err(MobilityError::BadResponse("stub router down".to_string()));
            }
            Ok(Directions {
                distance_m: self.distance_m,
                duration_s: self.duration_s,
                geometry:   Route::from_points(vec![from.to_degrees()?, to.to_degrees()?])?,
            })
        }
    }

    /// A radians route through the given degree longitudes at latitude 52.5.
    pub fn route_through(lons: &[f64]) -> Route {
        let points = lons
            .iter()
            .map(|lon| Point::degrees(*lon, 52.5).unwrap().to_radians().unwrap())
            .collect();
        Route::from_points(points).unwrap()
    }
}

#[cfg(test)]
mod store {
    use gd_core::Point;
    use tempfile::TempDir;

    use crate::{MobilityStore, OsmId};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn new_transition_starts_at_one() {
        let mut store = MobilityStore::in_memory().unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 3, 120.0, 15.0).unwrap();

        let t = store.find_transition(OsmId(1), OsmId(2), 3).unwrap().unwrap();
        assert_eq!(t.counter, 1);
        assert_eq!(t.osm_id_1, OsmId(1));
        assert_eq!(t.osm_id_2, OsmId(2));
        assert_eq!(t.weekday, 3);
        assert!(close(t.distance_avg, 120.0));
        assert_eq!(t.transition_probability, None);
    }

    #[test]
    fn repeated_transition_accumulates() {
        let mut store = MobilityStore::in_memory().unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 0, 100.0, 10.0).unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 0, 300.0, 30.0).unwrap();

        let t = store.find_transition(OsmId(1), OsmId(2), 0).unwrap().unwrap();
        assert_eq!(t.counter, 2);
        assert!(close(t.distance_sum, 400.0));
        assert!(close(t.duration_sum, 40.0));
        assert!(close(t.distance_avg, 200.0));
        assert!(close(t.duration_avg, 20.0));
        assert_eq!(store.transition_count().unwrap(), 1);
    }

    #[test]
    fn weekday_is_part_of_the_key() {
        let mut store = MobilityStore::in_memory().unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 0, 1.0, 1.0).unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 1, 1.0, 1.0).unwrap();
        assert_eq!(store.transition_count().unwrap(), 2);
        assert!(store.find_transition(OsmId(1), OsmId(2), 2).unwrap().is_none());
    }

    #[test]
    fn probabilities_normalise_per_start_and_weekday() {
        let mut store = MobilityStore::in_memory().unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 0, 1.0, 1.0).unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 0, 1.0, 1.0).unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(3), 0, 1.0, 1.0).unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(3), 4, 1.0, 1.0).unwrap();
        store.calculate_transition_probabilities().unwrap();

        let p = |a, b, w| {
            store.find_transition(OsmId(a), OsmId(b), w).unwrap().unwrap().transition_probability.unwrap()
        };
        assert!(close(p(1, 2, 0), 2.0 / 3.0));
        assert!(close(p(1, 3, 0), 1.0 / 3.0));
        assert!(close(p(1, 3, 4), 1.0));
    }

    #[test]
    fn probabilities_can_be_recalculated() {
        let mut store = MobilityStore::in_memory().unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 0, 1.0, 1.0).unwrap();
        store.calculate_transition_probabilities().unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(3), 0, 1.0, 1.0).unwrap();
        store.calculate_transition_probabilities().unwrap();

        let t = store.find_transition(OsmId(1), OsmId(2), 0).unwrap().unwrap();
        assert!(close(t.transition_probability.unwrap(), 0.5));
    }

    #[test]
    fn possible_transitions_exclude_forbidden_targets() {
        let mut store = MobilityStore::in_memory().unwrap();
        for target in [2, 3, 4] {
            store.create_or_update_transition(OsmId(1), OsmId(target), 0, 1.0, 1.0).unwrap();
        }
        store.create_or_update_transition(OsmId(9), OsmId(2), 0, 1.0, 1.0).unwrap();
        store.calculate_transition_probabilities().unwrap();

        let all = store.find_possible_transitions(OsmId(1), &[], 0).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|t| t.transition_probability.is_some()));

        let allowed = store.find_possible_transitions(OsmId(1), &[OsmId(2), OsmId(4)], 0).unwrap();
        assert_eq!(allowed.len(), 1);
        assert_eq!(allowed[0].osm_id_2, OsmId(3));

        assert!(store.find_possible_transitions(OsmId(1), &[], 6).unwrap().is_empty());
    }

    #[test]
    fn first_location_is_its_own_center() {
        let mut store = MobilityStore::in_memory().unwrap();
        let p = Point::degrees(13.4, 52.5).unwrap();
        store.create_or_update_location(OsmId(7), &p).unwrap();

        let loc = store.find_location(OsmId(7)).unwrap().unwrap();
        assert_eq!(loc.locations.len(), 1);
        assert_eq!(loc.center, p);
    }

    #[test]
    fn location_center_is_mean_of_points() {
        let mut store = MobilityStore::in_memory().unwrap();
        store.create_or_update_location(OsmId(7), &Point::degrees(13.0, 52.0).unwrap()).unwrap();
        store.create_or_update_location(OsmId(7), &Point::degrees(14.0, 53.0).unwrap()).unwrap();

        let loc = store.find_location(OsmId(7)).unwrap().unwrap();
        assert_eq!(loc.locations.len(), 2);
        assert!(close(loc.center.x_lon(), 13.5));
        assert!(close(loc.center.y_lat(), 52.5));
    }

    #[test]
    fn duplicate_location_point_is_not_added() {
        let mut store = MobilityStore::in_memory().unwrap();
        let p = Point::degrees(13.0, 52.0).unwrap();
        store.create_or_update_location(OsmId(7), &p).unwrap();
        store.create_or_update_location(OsmId(7), &p).unwrap();
        assert_eq!(store.find_location(OsmId(7)).unwrap().unwrap().locations.len(), 1);
    }

    #[test]
    fn radians_location_is_stored_in_degrees() {
        let mut store = MobilityStore::in_memory().unwrap();
        let p = Point::degrees(13.0, 52.0).unwrap().to_radians().unwrap();
        store.create_or_update_location(OsmId(7), &p).unwrap();
        let loc = store.find_location(OsmId(7)).unwrap().unwrap();
        assert!((loc.center.x_lon() - 13.0).abs() < 1e-9);
        assert!((loc.center.y_lat() - 52.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_location_is_none() {
        let store = MobilityStore::in_memory().unwrap();
        assert!(store.find_location(OsmId(42)).unwrap().is_none());
        assert_eq!(store.location_count().unwrap(), 0);
    }

    #[test]
    fn file_store_persists_across_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mobility.db");
        {
            let mut store = MobilityStore::open(&path).unwrap();
            store.create_or_update_transition(OsmId(1), OsmId(2), 0, 1.0, 1.0).unwrap();
            store.create_or_update_location(OsmId(1), &Point::degrees(1.0, 2.0).unwrap()).unwrap();
        }
        let store = MobilityStore::open(&path).unwrap();
        assert_eq!(store.transition_count().unwrap(), 1);
        assert_eq!(store.location_count().unwrap(), 1);
    }
}

#[cfg(test)]
mod directions {
    use gd_core::{CoordinatesUnit, Point, distance};
    use serde_json::json;

    use super::stubs::FixedDirections;
    use crate::directions::directions_from_geojson;
    use crate::{DEFAULT_AVG_SPEED_KMH, MobilityError, OrsProfile, shortest_route_details};

    #[test]
    fn profile_names_parse_back() {
        for profile in OrsProfile::ALL {
            assert_eq!(profile.to_string().parse::<OrsProfile>().unwrap(), profile);
        }
        assert_eq!("cycling-electric".parse::<OrsProfile>().unwrap(), OrsProfile::CyclingElectric);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(matches!("car".parse::<OrsProfile>(), Err(MobilityError::UnknownProfile(_))));
    }

    #[test]
    fn geojson_response_is_read() {
        let response = json!({
            "type": "FeatureCollection",
            "features": [{
                "properties": { "summary": { "distance": 1234.5, "duration": 98.7 } },
                "geometry": { "type": "LineString", "coordinates": [[8.68, 49.41], [8.69, 49.42, 110.0]] }
            }]
        });
        let d = directions_from_geojson(&response).unwrap();
        assert_eq!(d.distance_m, Some(1234.5));
        assert_eq!(d.duration_s, Some(98.7));
        assert_eq!(d.geometry.len(), 2);
        assert_eq!(d.geometry.coordinates_unit(), Some(CoordinatesUnit::Degrees));
        assert_eq!(d.geometry[1].coordinates(), [8.69, 49.42]);
    }

    #[test]
    fn summary_without_values_gives_none() {
        let response = json!({
            "features": [{ "properties": { "summary": {} }, "geometry": { "coordinates": [] } }]
        });
        let d = directions_from_geojson(&response).unwrap();
        assert_eq!(d.distance_m, None);
        assert_eq!(d.duration_s, None);
    }

    #[test]
    fn response_without_features_is_bad() {
        let err = directions_from_geojson(&json!({ "error": { "code": 2010 } })).unwrap_err();
        assert!(matches!(err, MobilityError::BadResponse(_)));
    }

    #[test]
    fn provider_failure_falls_back_to_direct_connection() {
        let from = Point::degrees(8.68, 49.41).unwrap().to_radians().unwrap();
        let to = Point::degrees(8.69, 49.42).unwrap().to_radians().unwrap();
        let details = shortest_route_details(&FixedDirections::failing(), &from, &to).unwrap();

        let direct = distance(&from, &to).unwrap();
        assert!((details.distance_m - direct).abs() < 1e-6);
        let expected_s = direct / (DEFAULT_AVG_SPEED_KMH / 3.6);
        assert!((details.duration_s - expected_s).abs() < 1e-6);
        assert_eq!(details.geometry.len(), 2);
        assert_eq!(details.geometry.coordinates_unit(), Some(CoordinatesUnit::Radians));
        assert!((details.geometry[0].x_lon() - from.x_lon()).abs() < 1e-12);
    }

    #[test]
    fn missing_duration_uses_average_speed() {
        let from = Point::degrees(8.68, 49.41).unwrap();
        let to = Point::degrees(8.69, 49.42).unwrap();
        let provider = FixedDirections { fail: false, distance_m: Some(1250.0), duration_s: None };
        let details = shortest_route_details(&provider, &from, &to).unwrap();
        assert_eq!(details.distance_m, 1250.0);
        assert!((details.duration_s - 100.0).abs() < 1e-9);
        assert_eq!(details.geometry.coordinates_unit(), Some(CoordinatesUnit::Degrees));
    }

    #[test]
    fn reported_values_are_kept() {
        let from = Point::degrees(8.68, 49.41).unwrap();
        let to = Point::degrees(8.69, 49.42).unwrap();
        let details = shortest_route_details(&FixedDirections::ok(2000.0, 180.0), &from, &to).unwrap();
        assert_eq!(details.distance_m, 2000.0);
        assert_eq!(details.duration_s, 180.0);
    }
}

#[cfg(test)]
mod geocoder {
    use gd_core::Point;
    use serde_json::json;

    use crate::geocoder::osm_id_from_response;
    use crate::http::normalize_base_url;
    use crate::{Location, MobilityError, NearestSegmentGeocoder, OsmId, ReverseGeocoder};

    #[test]
    fn osm_id_is_read_from_number_or_string() {
        assert_eq!(osm_id_from_response(&json!({ "osm_id": 4_000_123, "osm_type": "way" })).unwrap(), OsmId(4_000_123));
        assert_eq!(osm_id_from_response(&json!({ "osm_id": "17" })).unwrap(), OsmId(17));
    }

    #[test]
    fn nominatim_error_is_bad_response() {
        let err = osm_id_from_response(&json!({ "error": "Unable to geocode" })).unwrap_err();
        assert!(matches!(err, MobilityError::BadResponse(_)));
        assert!(osm_id_from_response(&json!({ "place_id": 3 })).is_err());
    }

    #[test]
    fn base_url_gets_scheme() {
        assert_eq!(normalize_base_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(normalize_base_url("localhost:8008/ors/"), "http://localhost:8008/ors");
        assert_eq!(normalize_base_url("https://example.org"), "https://example.org");
    }

    fn location(osm_id: i64, lon: f64, lat: f64) -> Location {
        Location::from_stored(OsmId(osm_id), &format!("[[{lon}, {lat}]]"), &format!("[{lon}, {lat}]")).unwrap()
    }

    #[test]
    fn nearest_segment_is_chosen() {
        let geocoder =
            NearestSegmentGeocoder::from_locations(&[location(1, 13.40, 52.50), location(2, 13.50, 52.50)]).unwrap();
        assert_eq!(geocoder.len(), 2);

        let near_second = Point::degrees(13.48, 52.51).unwrap();
        assert_eq!(geocoder.reverse(&near_second).unwrap(), OsmId(2));

        let near_first_radians = Point::degrees(13.41, 52.49).unwrap().to_radians().unwrap();
        assert_eq!(geocoder.reverse(&near_first_radians).unwrap(), OsmId(1));
    }

    #[test]
    fn empty_index_has_no_segment() {
        let geocoder = NearestSegmentGeocoder::from_locations(&[]).unwrap();
        assert!(geocoder.is_empty());
        let err = geocoder.reverse(&Point::degrees(0.0, 0.0).unwrap()).unwrap_err();
        assert!(matches!(err, MobilityError::NoSegment));
    }
}

#[cfg(test)]
mod model {
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::stubs::{FixedDirections, GridGeocoder, route_through};
    use crate::{MobilityModel, MobilityStore, OsmId};

    fn monday() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 2, 15, 8, 0, 0).unwrap()
    }

    #[test]
    fn trace_creates_transitions_and_locations() {
        let store = MobilityStore::in_memory().unwrap();
        let mut model = MobilityModel::new(store, GridGeocoder::default(), FixedDirections::ok(100.0, 10.0));
        let route = route_through(&[13.400, 13.401, 13.402]);
        model.calculate([(monday(), &route)]).unwrap();

        assert_eq!(model.nr_routes(), 1);
        let store = model.store();
        assert_eq!(store.transition_count().unwrap(), 2);
        assert_eq!(store.location_count().unwrap(), 3);

        let t = store.find_transition(OsmId(13400), OsmId(13401), 0).unwrap().unwrap();
        assert_eq!(t.counter, 1);
        assert_eq!(t.distance_sum, 100.0);
        assert_eq!(t.transition_probability, Some(1.0));
    }

    #[test]
    fn weekday_comes_from_trip_start() {
        let store = MobilityStore::in_memory().unwrap();
        let mut model = MobilityModel::new(store, GridGeocoder::default(), FixedDirections::ok(1.0, 1.0));
        let route = route_through(&[13.400, 13.401]);
        let sunday = Utc.with_ymd_and_hms(2021, 2, 21, 23, 0, 0).unwrap();
        model.calculate([(sunday, &route)]).unwrap();
        assert!(model.store().find_transition(OsmId(13400), OsmId(13401), 6).unwrap().is_some());
    }

    #[test]
    fn failed_lookup_skips_pair() {
        let store = MobilityStore::in_memory().unwrap();
        let geocoder = GridGeocoder { fail_above_lon: 13.4015 };
        let mut model = MobilityModel::new(store, geocoder, FixedDirections::ok(1.0, 1.0));
        let route = route_through(&[13.400, 13.401, 13.402]);
        model.calculate([(monday(), &route)]).unwrap();

        let store = model.store();
        assert_eq!(store.transition_count().unwrap(), 1);
        // The last pair was skipped, so its end point is never recorded.
        assert_eq!(store.location_count().unwrap(), 1);
    }

    #[test]
    fn router_outage_still_records_transitions() {
        let store = MobilityStore::in_memory().unwrap();
        let mut model = MobilityModel::new(store, GridGeocoder::default(), FixedDirections::failing());
        let route = route_through(&[13.400, 13.401]);
        model.calculate([(monday(), &route)]).unwrap();

        let t = model.store().find_transition(OsmId(13400), OsmId(13401), 0).unwrap().unwrap();
        assert!(t.distance_sum > 60.0 && t.distance_sum < 75.0);
        assert!(t.duration_sum > 0.0);
    }

    #[test]
    fn single_point_route_is_counted_but_adds_nothing() {
        let store = MobilityStore::in_memory().unwrap();
        let mut model = MobilityModel::new(store, GridGeocoder::default(), FixedDirections::ok(1.0, 1.0));
        let route = route_through(&[13.400]);
        model.calculate([(monday(), &route)]).unwrap();
        assert_eq!(model.nr_routes(), 1);
        assert_eq!(model.store().transition_count().unwrap(), 0);
    }

    #[test]
    fn sampling_respects_visited_segments() {
        let store = MobilityStore::in_memory().unwrap();
        let mut model = MobilityModel::new(store, GridGeocoder::default(), FixedDirections::ok(1.0, 1.0));
        let a = route_through(&[13.400, 13.401]);
        let b = route_through(&[13.400, 13.402]);
        model.calculate([(monday(), &a), (monday(), &b)]).unwrap();

        let mut rng = SmallRng::seed_from_u64(7);
        let next = model.sample_next_segment(OsmId(13400), &[OsmId(13401)], 0, &mut rng).unwrap().unwrap();
        assert_eq!(next.osm_id_2, OsmId(13402));

        for _ in 0..20 {
            let next = model.sample_next_segment(OsmId(13400), &[], 0, &mut rng).unwrap().unwrap();
            assert!(next.osm_id_2 == OsmId(13401) || next.osm_id_2 == OsmId(13402));
        }

        let none = model.sample_next_segment(OsmId(13400), &[OsmId(13401), OsmId(13402)], 0, &mut rng).unwrap();
        assert!(none.is_none());
        assert!(model.sample_next_segment(OsmId(1), &[], 0, &mut rng).unwrap().is_none());
    }
}

#[cfg(test)]
mod export {
    use gd_core::Point;
    use tempfile::TempDir;

    use crate::export::{load_locations_csv, load_transitions_csv, persist_csv, write_locations};
    use crate::{MobilityStore, OsmId};

    fn filled_store() -> MobilityStore {
        let mut store = MobilityStore::in_memory().unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(2), 0, 100.0, 10.0).unwrap();
        store.create_or_update_transition(OsmId(1), OsmId(3), 0, 50.0, 5.0).unwrap();
        store.calculate_transition_probabilities().unwrap();
        store.create_or_update_location(OsmId(1), &Point::degrees(13.0, 52.0).unwrap()).unwrap();
        store.create_or_update_location(OsmId(1), &Point::degrees(13.5, 52.5).unwrap()).unwrap();
        store
    }

    #[test]
    fn location_csv_has_bracketed_columns() {
        let store = filled_store();
        let mut buf = Vec::new();
        write_locations(&store, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("osm_id,locations,center"));
        assert_eq!(lines.next(), Some("1,\"[[13, 52], [13.5, 52.5]]\",\"[13.25, 52.25]\""));
    }

    #[test]
    fn persisted_tables_load_back() {
        let dir = TempDir::new().unwrap();
        let transitions_path = dir.path().join("transitions.csv");
        let locations_path = dir.path().join("locations.csv");
        let store = filled_store();
        persist_csv(&store, &transitions_path, &locations_path).unwrap();

        let transitions = load_transitions_csv(&transitions_path).unwrap();
        assert_eq!(transitions, store.transitions().unwrap());
        let locations = load_locations_csv(&locations_path).unwrap();
        assert_eq!(locations, store.locations().unwrap());

        let mut copy = MobilityStore::in_memory().unwrap();
        copy.import_transitions(&transitions).unwrap();
        copy.import_locations(&locations).unwrap();
        assert_eq!(copy.transitions().unwrap(), transitions);
        assert_eq!(copy.location_count().unwrap(), 1);
    }
}
