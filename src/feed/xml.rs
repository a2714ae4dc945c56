//! Point records from the XML feed.
//!
//! A document carries any number of record elements (`<balloonOne>` by
//! default) at any depth, each with `pointIndex`, `time`, `altitude`,
//! `latitude`, `longitude` and `speed` children.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;
use crate::types::TrackPoint;

/// Parse every record in `xml`, sorted by index. Records with a missing
/// index or coordinate are skipped.
pub fn parse_points(xml: &str, element: &str) -> Result<Vec<TrackPoint>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let element = element.as_bytes();
    let mut record: Option<HashMap<String, String>> = None;
    let mut field: Option<String> = None;
    let mut points = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == element => {
                record = Some(HashMap::new());
            }
            Event::Start(e) if record.is_some() => {
                field = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Event::Text(t) => {
                if let (Some(rec), Some(name)) = (record.as_mut(), field.as_ref()) {
                    rec.insert(name.clone(), t.unescape()?.into_owned());
                }
            }
            Event::End(e) if e.name().as_ref() == element => {
                if let Some(rec) = record.take() {
                    match to_point(&rec) {
                        Some(p) => points.push(p),
                        None => tracing::warn!(record = ?rec, "skipping malformed point record"),
                    }
                }
                field = None;
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
    }

    points.sort_by_key(|p| p.index);
    Ok(points)
}

fn to_point(rec: &HashMap<String, String>) -> Option<TrackPoint> {
    let num = |key: &str| rec.get(key).and_then(|v| v.trim().parse::<f64>().ok());

    let index = rec.get("pointIndex").and_then(|v| parse_index(v))?;
    Some(TrackPoint {
        index: Some(index),
        latitude: num("latitude")?,
        longitude: num("longitude")?,
        time: rec.get("time").filter(|t| !t.is_empty()).cloned(),
        altitude: num("altitude"),
        speed: num("speed"),
    })
}

// feeds have been seen writing "12" and "12.0"
fn parse_index(v: &str) -> Option<i64> {
    let v = v.trim();
    v.parse::<i64>().ok().or_else(|| {
        v.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEARTBEAT: &str = r#"<?xml version="1.0"?>
<flight>
  <balloonOne>
    <pointIndex>7</pointIndex>
    <time>2014-05-03T16:02:10Z</time>
    <altitude>18250.5</altitude>
    <latitude>39.0311</latitude>
    <longitude>-104.2802</longitude>
    <speed>12.4</speed>
  </balloonOne>
  <balloonOne>
    <pointIndex>5</pointIndex>
    <time></time>
    <altitude>17900</altitude>
    <latitude>39.0205</latitude>
    <longitude>-104.2743</longitude>
    <speed>11.0</speed>
  </balloonOne>
  <balloonOne>
    <pointIndex>6.0</pointIndex>
    <latitude>39.0251</latitude>
    <longitude>-104.2770</longitude>
  </balloonOne>
</flight>"#;

    #[test]
    fn parses_and_sorts_records() {
        let pts = parse_points(HEARTBEAT, "balloonOne").unwrap();
        let idx: Vec<_> = pts.iter().map(|p| p.index).collect();
        assert_eq!(idx, vec![Some(5), Some(6), Some(7)]);

        let last = &pts[2];
        assert_eq!(last.latitude, 39.0311);
        assert_eq!(last.longitude, -104.2802);
        assert_eq!(last.altitude, Some(18250.5));
        assert_eq!(last.speed, Some(12.4));
        assert_eq!(last.time.as_deref(), Some("2014-05-03T16:02:10Z"));

        assert_eq!(pts[0].time, None);
        assert_eq!(pts[1].altitude, None);
    }

    #[test]
    fn skips_incomplete_records() {
        let xml = r#"<d>
            <balloonOne><pointIndex>1</pointIndex><latitude>1</latitude></balloonOne>
            <balloonOne><pointIndex>x</pointIndex><latitude>1</latitude><longitude>2</longitude></balloonOne>
            <balloonOne><pointIndex>2</pointIndex><latitude>1</latitude><longitude>2</longitude></balloonOne>
        </d>"#;
        let pts = parse_points(xml, "balloonOne").unwrap();
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].index, Some(2));
    }

    #[test]
    fn element_name_is_configurable() {
        let pts = parse_points(HEARTBEAT, "balloonTwo").unwrap();
        assert!(pts.is_empty());

        let xml = "<r><aprs><pointIndex>3</pointIndex><latitude>1</latitude><longitude>2</longitude></aprs></r>";
        assert_eq!(parse_points(xml, "aprs").unwrap().len(), 1);
    }

    #[test]
    fn broken_document_is_an_error() {
        assert!(parse_points("<a><balloonOne></a>", "balloonOne").is_err());
    }
}
