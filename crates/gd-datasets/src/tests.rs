//! Unit tests for gd-datasets loaders.

#[cfg(test)]
mod taxi {
    use std::io::Cursor;

    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::taxi::find_date_range;
    use crate::{Dataset, DatasetError, TaxiDataset, TaxiOptions};

    const HEADER: &str = "TRIP_ID,CALL_TYPE,ORIGIN_CALL,ORIGIN_STAND,TAXI_ID,TIMESTAMP,DAY_TYPE,MISSING_DATA,POLYLINE\n";

    fn fixture() -> String {
        let rows = [
            r#""T1","C","","","20000589","1372636858","A","False","[[-8.618643,41.141412],[-8.618499,41.141376],[-8.620326,41.14251]]""#,
            r#""T2","A","2002","","20000596","1372637303","A","False","[]""#,
            r#""T3","C","","","20000320","1372636951","A","True","[[-8.61,41.14],[-8.62,41.15]]""#,
            r#""T4","C","","","20000520","1372637091","A","False","[[-8.6,41.14],[-8.5,41.14]]""#,
            r#""T5","B","","15","20000337","1372636000","A","False","[[-8.61,41.15]]""#,
        ];
        let mut csv = HEADER.to_string();
        for r in rows {
            csv.push_str(r);
            csv.push('\n');
        }
        csv
    }

    fn load(options: TaxiOptions) -> Result<TaxiDataset, DatasetError> {
        TaxiDataset::create_from_reader(Cursor::new(fixture()), None, None, options)
    }

    #[test]
    fn cleaning_drops_invalid_rows() {
        let data = load(TaxiOptions::default()).unwrap();
        let ids: Vec<&str> = data.trips().iter().map(|t| t.record.trip_id.as_str()).collect();
        // sorted by start: T5 (23:46 the day before), T1, T4
        assert_eq!(ids, vec!["T5", "T1", "T4"]);
        assert_eq!(data.max_route_len(), 3);
    }

    #[test]
    fn speed_limit_drops_fast_trips() {
        let options = TaxiOptions { max_allowed_speed_kmh: Some(60.0), ..Default::default() };
        let data = load(options).unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.trips().iter().all(|t| t.max_speed_kmh().unwrap() <= 60.0));
    }

    #[test]
    fn min_route_length_drops_short_trips() {
        let options = TaxiOptions { min_route_length: 2, ..Default::default() };
        let data = load(options).unwrap();
        assert!(data.trips().iter().all(|t| t.route.len() >= 2));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn min_route_length_is_at_least_one() {
        let options = TaxiOptions { min_route_length: 0, ..Default::default() };
        assert_eq!(load(options).unwrap().len(), 3);
    }

    #[test]
    fn optional_origin_columns() {
        let data = load(TaxiOptions::default()).unwrap();
        let t5 = &data.trips()[0].record;
        assert_eq!(t5.origin_call, None);
        assert_eq!(t5.origin_stand, Some(15));
        assert!(!t5.missing_data);
    }

    #[test]
    fn routes_are_radians_with_15s_timestamps() {
        let data = load(TaxiOptions::default()).unwrap();
        let t1 = &data.trips()[1];
        assert!((t1.route[0].x_lon() - (-8.618643f64).to_radians()).abs() < 1e-12);
        let secs: Vec<i64> = t1.timestamps.iter().map(|t| t.timestamp()).collect();
        assert_eq!(secs, vec![1372636858, 1372636873, 1372636888]);
    }

    #[test]
    fn computed_bounds_cover_all_points() {
        let data = load(TaxiOptions::default()).unwrap();
        let b = data.location_bounds();
        assert!((b.lon_min - (-8.620326f64).to_radians()).abs() < 1e-12);
        assert!((b.lon_max - (-8.5f64).to_radians()).abs() < 1e-12);
        assert!((b.lat_max - 41.15f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn sample_is_padded() {
        let data = load(TaxiOptions::default()).unwrap();
        let sample = data.get(0).unwrap();
        assert_eq!((sample.day_of_week.rows, sample.day_of_week.cols), (3, 7));
        // 2013-06-30 23:46 UTC is a Sunday in June
        assert_eq!(sample.day_of_week.get(0, 6), Some(1.0));
        assert_eq!(sample.quarter_hour_of_day.get(0, 95), Some(1.0));
        assert_eq!(sample.month.get(0, 5), Some(1.0));
        assert!(sample.day_of_week.row(1).unwrap().iter().all(|v| *v == 0.0));

        assert_eq!(sample.route_raw_padded.rows, 3);
        assert_eq!(sample.route_raw_padded.row(2), Some(&[0.0, 0.0][..]));
        assert_eq!(sample.route_with_timestamps.len(), 3);
        let stamps = sample.route_with_timestamps.timestamps();
        assert!(stamps.iter().all(|t| *t == stamps[0]));
    }

    #[test]
    fn time_features_advance_along_route() {
        let data = load(TaxiOptions::default()).unwrap();
        let sample = data.get(1).unwrap();
        let start = Utc.timestamp_opt(1372636858, 0).unwrap();
        assert_eq!(sample.route_with_timestamps[0].timestamp, start);
        // Monday 00:00:58 .. 00:01:28 all fall in slot 0
        for row in 0..3 {
            assert_eq!(sample.day_of_week.get(row, 0), Some(1.0));
            assert_eq!(sample.quarter_hour_of_day.get(row, 0), Some(1.0));
        }
    }

    #[test]
    fn scaled_sample_in_unit_square() {
        let data = load(TaxiOptions { scale: true, ..Default::default() }).unwrap();
        for sample in data.iter() {
            let sample = sample.unwrap();
            for v in &sample.route_scaled_padded.data {
                assert!((0.0..=1.0).contains(v), "value {v}");
            }
        }
    }

    #[test]
    fn out_of_range_index() {
        let data = load(TaxiOptions::default()).unwrap();
        assert!(matches!(data.get(3), Err(DatasetError::IndexOutOfBounds { index: 3, len: 3 })));
    }

    #[test]
    fn skip_and_limit_keep_header() {
        // rows 2 and 3 are the empty polyline and the missing-data trip
        let result = TaxiDataset::create_from_reader(
            Cursor::new(fixture()),
            Some(1),
            Some(2),
            TaxiOptions::default(),
        );
        assert!(matches!(result, Err(DatasetError::NoValidEntries)));
        let data =
            TaxiDataset::create_from_reader(Cursor::new(fixture()), Some(3), Some(1), TaxiOptions::default())
                .unwrap();
        assert_eq!(data.trips()[0].record.trip_id, "T4");
    }

    #[test]
    fn daytype_header_alias() {
        let csv = fixture().replacen("DAY_TYPE", "DAYTYPE", 1);
        let data = TaxiDataset::create_from_reader(Cursor::new(csv), None, None, TaxiOptions::default()).unwrap();
        assert_eq!(data.trips()[0].record.day_type, "A");
    }

    #[test]
    fn latin1_fields() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"\"caf\xe9\",\"C\",\"\",\"\",\"1\",\"1372636858\",\"A\",\"False\",\"[[-8.6,41.1]]\"\n");
        let data = TaxiDataset::create_from_reader(Cursor::new(bytes), None, None, TaxiOptions::default()).unwrap();
        assert_eq!(data.trips()[0].record.trip_id, "café");
    }

    #[test]
    fn wrong_extension() {
        let result = TaxiDataset::create_from_csv(
            std::path::Path::new("train.txt"),
            None,
            None,
            TaxiOptions::default(),
        );
        assert!(matches!(result, Err(DatasetError::WrongExtension { expected: "csv", .. })));
    }

    fn ts_csv(days: &[u32]) -> String {
        // 2013-07-01 12:00 UTC plus whole days
        let mut csv = "TIMESTAMP\n".to_string();
        for d in days {
            csv.push_str(&format!("{}\n", 1372680000 + 86_400 * i64::from(*d - 1)));
        }
        csv
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2013, 7, d).unwrap()
    }

    #[test]
    fn date_scan_stops_after_end_date_chunks() {
        let csv = ts_csv(&[1, 2, 1, 3, 2, 2, 1, 3]);
        assert_eq!(find_date_range(Cursor::new(csv.clone()), day(1), day(2), 2).unwrap(), (0, 1));
        assert_eq!(find_date_range(Cursor::new(csv), day(1), day(3), 2).unwrap(), (0, 3));
    }

    #[test]
    fn date_scan_uses_trailing_partial_chunk() {
        let csv = ts_csv(&[2, 2, 1]);
        assert_eq!(find_date_range(Cursor::new(csv), day(1), day(2), 2).unwrap(), (2, 1));
    }

    #[test]
    fn date_scan_missing_dates() {
        let csv = ts_csv(&[1, 1]);
        assert!(matches!(
            find_date_range(Cursor::new(csv.clone()), day(5), day(1), 2),
            Err(DatasetError::DateNotFound { which: "start", .. })
        ));
        assert!(matches!(
            find_date_range(Cursor::new(csv), day(1), day(5), 2),
            Err(DatasetError::DateNotFound { which: "end", .. })
        ));
    }

    #[test]
    fn load_within_time_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, fixture()).unwrap();

        let july_1 = day(1);
        let june_30 = NaiveDate::from_ymd_opt(2013, 6, 30).unwrap();
        let data =
            TaxiDataset::create_from_csv_within_time_range(&path, july_1, july_1, TaxiOptions::default())
                .unwrap();
        // rows T1..T4; only T1 and T4 survive cleaning
        assert_eq!(data.len(), 2);
        // T5 on June 30 is the last row, after every July 1 row
        let reversed =
            TaxiDataset::create_from_csv_within_time_range(&path, june_30, july_1, TaxiOptions::default());
        assert!(matches!(reversed, Err(DatasetError::InvalidArgument(_))));
    }
}

#[cfg(test)]
mod grouping {
    use chrono::{TimeZone, Utc};

    use gd_core::{CoordinatesUnit, Point, TimedPoint};

    use crate::DailyRouteBuilder;

    fn point(secs: i64) -> TimedPoint {
        TimedPoint::new(Point::degrees(10.0, 50.0).unwrap(), Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn splits_by_entity_and_day() {
        let mut b = DailyRouteBuilder::new();
        assert!(b.push(0, point(1_372_680_000)).unwrap());
        assert!(!b.push(0, point(1_372_680_060)).unwrap());
        assert!(b.push(0, point(1_372_680_000 + 86_400)).unwrap());
        assert!(b.push(1, point(1_372_680_000 + 86_400)).unwrap());
        let routes = b.finish().unwrap();
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].route.len(), 2);
        assert_eq!(routes[1].date.to_string(), "2013-07-02");
        assert_eq!(routes[2].entity_id, 1);
        assert_eq!(routes[0].route.coordinates_unit(), Some(CoordinatesUnit::Radians));
    }
}

#[cfg(test)]
mod cabspotting {
    use std::io::Cursor;

    use crate::{CabspottingDataset, Dataset};

    // Newest first, as in the published files.
    const TAXI_0: &str = "\
37.75 -122.39 0 1213171200
37.74 -122.38 0 1213088702
37.73 -122.37 0 1213088642
37.72 -122.36 1 1213088582
37.71 -122.35 1 1213088522
37.45667 -122.1343 0 1213088462
";
    const TAXI_1: &str = "37.70 -122.40 1 1213088462\n";

    fn load(limit: Option<usize>) -> CabspottingDataset {
        CabspottingDataset::create_from_readers(vec![Cursor::new(TAXI_0), Cursor::new(TAXI_1)], limit).unwrap()
    }

    #[test]
    fn routes_per_taxi_per_day() {
        let data = load(None);
        assert_eq!(data.len(), 3);
        assert_eq!(data.get(0).unwrap().len(), 5);
        assert_eq!(data.routes()[1].entity_id, 0);
        assert_eq!(data.routes()[2].entity_id, 1);
    }

    #[test]
    fn first_point_is_earliest() {
        let data = load(None);
        let first = data.get(0).unwrap().to_degrees().unwrap()[0];
        assert!((first.point.x_lon() - -122.1343).abs() < 1e-9);
        assert!((first.point.y_lat() - 37.45667).abs() < 1e-9);
        assert_eq!(first.timestamp.to_rfc3339(), "2008-06-10T09:01:02+00:00");
    }

    #[test]
    fn pickups_and_dropoffs() {
        let data = load(None);
        assert_eq!(data.stops(0).unwrap(), &[1, 2]);
        assert!(data.stops(1).unwrap().is_empty());
        assert!(data.stops(2).unwrap().is_empty());
        assert!(data.stops(3).is_err());
    }

    #[test]
    fn limit_caps_rows_per_file() {
        // the two newest rows of taxi 0 fall on different days
        let data = load(Some(2));
        assert_eq!(data.len(), 3);
        assert_eq!(data.get(0).unwrap().len(), 1);
    }

    #[test]
    fn invalid_point_is_skipped() {
        let taxi = "37.73 -122.37 0 1213088642\nNaN -122.36 1 1213088582\n37.71 -122.35 0 1213088522\n";
        let data = CabspottingDataset::create_from_readers(vec![Cursor::new(taxi)], None).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.get(0).unwrap().len(), 2);
        // the skipped row's occupancy change is not seen
        assert!(data.stops(0).unwrap().is_empty());
    }
}

#[cfg(test)]
mod geolife {
    use std::io::Cursor;

    use crate::{Dataset, GeoLifeDataset};

    const PLT: &str = "\
Geolife trajectory
WGS 84
Altitude is in Feet
Reserved 3
0,2,255,My Track,0,0,2,8421376
0
39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04
39.984683,116.31845,0,492,39744.1202546296,2008-10-23,02:53:10
39.984686,116.318417,0,492,39745.1203125,2008-10-24,02:53:15
";

    #[test]
    fn skips_header_and_groups_by_day() {
        let data = GeoLifeDataset::create_from_readers(vec![Cursor::new(PLT), Cursor::new(PLT)], None).unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data.get(0).unwrap().len(), 2);
        assert_eq!(data.routes()[0].date.to_string(), "2008-10-23");
        assert_eq!(data.routes()[2].entity_id, 1);
        let first = data.get(0).unwrap()[0];
        assert_eq!(first.timestamp.timestamp(), 1_224_730_384);
        assert!((first.point.y_lat() - 39.984702f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn limit_per_file() {
        let data = GeoLifeDataset::create_from_readers(vec![Cursor::new(PLT)], Some(1)).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.get(0).unwrap().len(), 1);
    }

    #[test]
    fn invalid_point_is_skipped() {
        let header: String = PLT.lines().take(6).map(|l| format!("{l}\n")).collect();
        let plt = format!(
            "{header}NaN,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04\n\
             39.984683,116.31845,0,492,39744.1202546296,2008-10-23,02:53:10\n"
        );
        let data = GeoLifeDataset::create_from_readers(vec![Cursor::new(plt)], None).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.get(0).unwrap().len(), 1);
        let only = data.get(0).unwrap()[0];
        assert!((only.point.y_lat() - 39.984683f64.to_radians()).abs() < 1e-12);
    }
}

#[cfg(test)]
mod t_drive {
    use std::io::Cursor;

    use crate::{Dataset, TDriveDataset};

    const TAXI_1: &str = "\
1,2008-02-02 15:36:08,116.51172,39.92123
1,2008-02-02 15:46:08,116.51135,39.93883
1,2008-02-03 00:01:00,116.51627,39.91034
";
    const TAXI_2: &str = "2,2008-02-02 13:33:52,116.36422,39.88781\n2,2008-02-02 13:37:16,NaN,39.88782\n";

    #[test]
    fn routes_per_taxi_per_day() {
        let data = TDriveDataset::create_from_readers(vec![Cursor::new(TAXI_1), Cursor::new(TAXI_2)], None).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.get(0).unwrap().len(), 2);
        assert_eq!(data.routes()[2].entity_id, 2);
        // the NaN point is skipped
        assert_eq!(data.get(2).unwrap().len(), 1);
    }

    #[test]
    fn limit_per_file() {
        let data = TDriveDataset::create_from_readers(vec![Cursor::new(TAXI_1)], Some(2)).unwrap();
        assert_eq!(data.len(), 1);
    }
}

#[cfg(test)]
mod de4l {
    use std::io::Cursor;

    use crate::{Dataset, DatasetError, De4lSensorDataset};

    const LINES: &str = r#"{"timestamp": "2021-02-16T09:45:02.000Z", "location": {"lon": 11.61, "lat": 50.87}, "pm10": 3.1}
{"timestamp": "2021-02-16T09:45:04.000Z", "location": {"lon": 11.62, "lat": 50.77}}
{"timestamp": "2021-02-16T09:45:06.000Z", "location": {"lon": 11.615, "lat": 50.8}}
{"timestamp": "2021-02-16T09:45:08.000Z", "location": {"lon": 11.611, "lat": 50.81}}
{"timestamp": "2021-02-16T09:45:10.000Z", "location": {"lon": 11.612, "lat": 50.82}}
"#;

    fn load(route_len: usize) -> Result<De4lSensorDataset, DatasetError> {
        De4lSensorDataset::create_from_reader(Cursor::new(LINES), route_len, None)
    }

    #[test]
    fn length_rounds_up() {
        let data = load(2).unwrap();
        assert_eq!(data.point_count(), 5);
        assert_eq!(data.len(), 3);
        assert_eq!(load(5).unwrap().len(), 1);
    }

    #[test]
    fn bounds_in_radians() {
        let b = load(1).unwrap().location_bounds();
        let expected = (11.61f64.to_radians(), 11.62f64.to_radians(), 50.77f64.to_radians(), 50.87f64.to_radians());
        assert_eq!(b.as_tuple(), expected);
    }

    #[test]
    fn last_sample_is_padded() {
        let data = load(2).unwrap();
        let sample = data.get(2).unwrap();
        assert_eq!(sample.route_with_timestamps.len(), 1);
        assert_eq!(sample.route_raw_padded.rows, 2);
        assert_eq!(sample.route_raw_padded.row(1), Some(&[0.0, 0.0][..]));
        assert_eq!(sample.day_of_week.rows, 2);
        // Tuesday
        assert_eq!(sample.day_of_week.get(0, 1), Some(1.0));
        assert!(sample.day_of_week.row(1).unwrap().iter().all(|v| *v == 0.0));
        assert!(data.get(3).is_err());
    }

    #[test]
    fn scaled_routes_in_unit_square() {
        let data = load(2).unwrap();
        for sample in data.iter() {
            let sample = sample.unwrap();
            assert_eq!(sample.route_scaled_padded.rows, 2);
            assert!(sample.route_scaled_padded.data.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn limit_and_zero_route_len() {
        let data = De4lSensorDataset::create_from_reader(Cursor::new(LINES), 2, Some(3)).unwrap();
        assert_eq!(data.point_count(), 3);
        assert!(matches!(load(0), Err(DatasetError::InvalidArgument(_))));
    }

    #[test]
    fn json_extension_required() {
        let result = De4lSensorDataset::create_from_json(std::path::Path::new("sensors.csv"), 2, None);
        assert!(matches!(result, Err(DatasetError::WrongExtension { expected: "json", .. })));
    }
}
