use crate::types::LatLon;

/// Earth radius in nautical miles.
pub const EARTH_RADIUS_NMI: f64 = 3443.89849;

/// Linear extrapolation one step past `last`, componentwise.
pub fn extrapolate(second_to_last: LatLon, last: LatLon) -> LatLon {
    LatLon::new(
        last.lat + (last.lat - second_to_last.lat),
        last.lon + (last.lon - second_to_last.lon),
    )
}

/// Great-circle distance using the haversine formula.
pub fn distance_nmi(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NMI * h.sqrt().asin()
}

pub fn path_length_nmi(path: &[LatLon]) -> f64 {
    path.windows(2).map(|w| distance_nmi(w[0], w[1])).sum()
}
