//! Geo utilities: great-circle distance and the Germany bounding box

/// Earth's mean radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Germany, approximately. A coarse box on purpose: it only has to reject
/// obviously wrong event locations, not trace the border.
const GERMANY_LAT_MIN: f64 = 47.3;
const GERMANY_LAT_MAX: f64 = 55.1;
const GERMANY_LNG_MIN: f64 = 5.9;
const GERMANY_LNG_MAX: f64 = 15.0;

/// Haversine great-circle distance in meters between two lat/lng pairs
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Whether the coordinates fall inside Germany's bounding box
pub fn is_in_germany(lat: f64, lng: f64) -> bool {
    (GERMANY_LAT_MIN..=GERMANY_LAT_MAX).contains(&lat)
        && (GERMANY_LNG_MIN..=GERMANY_LNG_MAX).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        assert_eq!(haversine_distance_m(52.52, 13.405, 52.52, 13.405), 0.0);
    }

    #[test]
    fn berlin_to_munich_is_roughly_500km() {
        // Berlin (52.52, 13.405) to Munich (48.137, 11.575)
        let d = haversine_distance_m(52.52, 13.405, 48.137, 11.575);
        assert!((480_000.0..520_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = haversine_distance_m(50.94, 6.96, 53.55, 9.99);
        let ba = haversine_distance_m(53.55, 9.99, 50.94, 6.96);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn german_cities_are_in_bounds() {
        assert!(is_in_germany(52.52, 13.405)); // Berlin
        assert!(is_in_germany(48.137, 11.575)); // Munich
        assert!(is_in_germany(53.55, 9.99)); // Hamburg
    }

    #[test]
    fn foreign_points_are_rejected() {
        assert!(!is_in_germany(40.0, 0.0)); // off the Spanish coast
        assert!(!is_in_germany(48.85, 2.35)); // Paris
        assert!(!is_in_germany(0.0, 0.0));
    }

    #[test]
    fn box_edges_are_inclusive() {
        assert!(is_in_germany(47.3, 5.9));
        assert!(is_in_germany(55.1, 15.0));
        assert!(!is_in_germany(55.100001, 15.0));
    }
}
