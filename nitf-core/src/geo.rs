//! Conversions between the geographic and decimal corner coordinate layouts.
//!
//! An IGEOLO field holds four corners of fifteen bytes each. In geographic
//! form a corner is `ddmmssXdddmmssY` (latitude then longitude, hemisphere
//! letters N/S and E/W); in decimal form it is `+dd.ddd+ddd.ddd`.
use crate::enums::CoordinateSystem;
use crate::errors::*;

/// A corner coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

fn parse_err(value: &str) -> NitfError {
    NitfError::Parse {
        field: "IGEOLO".to_string(),
        value: value.to_string(),
    }
}

/// Convert a `ddmmss` / `dddmmss` group plus hemisphere letter to decimal
/// degrees.
///
/// ```
/// use nitf_core::geo::dms_to_decimal;
///
/// let lat = dms_to_decimal("513030", 'N').unwrap();
/// assert!((lat - 51.508333).abs() < 1e-5);
/// let lon = dms_to_decimal("0000730", 'W').unwrap();
/// assert!((lon + 0.125).abs() < 1e-5);
/// ```
pub fn dms_to_decimal(dms: &str, hemisphere: char) -> Result<f64, NitfError> {
    let (d_len, sign) = match hemisphere {
        'N' => (2, 1.0),
        'S' => (2, -1.0),
        'E' => (3, 1.0),
        'W' => (3, -1.0),
        _ => return Err(parse_err(dms)),
    };
    if dms.len() != d_len + 4 || !dms.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_err(dms));
    }
    let degrees: f64 = dms[..d_len].parse().map_err(|_| parse_err(dms))?;
    let minutes: f64 = dms[d_len..d_len + 2].parse().map_err(|_| parse_err(dms))?;
    let seconds: f64 = dms[d_len + 2..].parse().map_err(|_| parse_err(dms))?;
    if minutes >= 60.0 || seconds >= 60.0 {
        return Err(parse_err(dms));
    }
    Ok(sign * (degrees + minutes / 60.0 + seconds / 3600.0))
}

/// Format a latitude as `ddmmssX`.
pub fn decimal_to_dms_lat(value: f64) -> String {
    let (d, m, s, neg) = split_dms(value);
    format!("{:02}{:02}{:02}{}", d, m, s, if neg { 'S' } else { 'N' })
}

/// Format a longitude as `dddmmssX`.
pub fn decimal_to_dms_lon(value: f64) -> String {
    let (d, m, s, neg) = split_dms(value);
    format!("{:03}{:02}{:02}{}", d, m, s, if neg { 'W' } else { 'E' })
}

fn split_dms(value: f64) -> (u32, u32, u32, bool) {
    let neg = value < 0.0;
    let mut total = (value.abs() * 3600.0).round() as u64;
    let seconds = (total % 60) as u32;
    total /= 60;
    let minutes = (total % 60) as u32;
    let degrees = (total / 60) as u32;
    (degrees, minutes, seconds, neg)
}

/// Parse one fifteen byte corner in the given coordinate system.
pub fn parse_corner(corner: &str, system: CoordinateSystem) -> Result<GeoPoint, NitfError> {
    if corner.len() != 15 {
        return Err(parse_err(corner));
    }
    match system {
        CoordinateSystem::Geographic => {
            let lat_h = corner.as_bytes()[6] as char;
            let lon_h = corner.as_bytes()[14] as char;
            Ok(GeoPoint {
                lat: dms_to_decimal(&corner[..6], lat_h)?,
                lon: dms_to_decimal(&corner[7..14], lon_h)?,
            })
        }
        CoordinateSystem::Decimal => {
            let lat: f64 = corner[..7].parse().map_err(|_| parse_err(corner))?;
            let lon: f64 = corner[7..].parse().map_err(|_| parse_err(corner))?;
            Ok(GeoPoint { lat, lon })
        }
        _ => Err(NitfError::InvalidArgument {
            msg: format!("no corner conversion for coordinate system {:?}", system),
        }),
    }
}

/// Format one fifteen byte corner in the given coordinate system.
pub fn format_corner(point: GeoPoint, system: CoordinateSystem) -> Result<String, NitfError> {
    match system {
        CoordinateSystem::Geographic => Ok(format!(
            "{}{}",
            decimal_to_dms_lat(point.lat),
            decimal_to_dms_lon(point.lon)
        )),
        CoordinateSystem::Decimal => Ok(format!("{:+07.3}{:+08.3}", point.lat, point.lon)),
        _ => Err(NitfError::InvalidArgument {
            msg: format!("no corner conversion for coordinate system {:?}", system),
        }),
    }
}

/// Parse a sixty byte IGEOLO field into its four corners.
pub fn parse_igeolo(igeolo: &str, system: CoordinateSystem) -> Result<[GeoPoint; 4], NitfError> {
    if igeolo.len() != 60 {
        return Err(parse_err(igeolo));
    }
    let mut corners = [GeoPoint::new(0.0, 0.0); 4];
    for (i, corner) in corners.iter_mut().enumerate() {
        *corner = parse_corner(&igeolo[i * 15..(i + 1) * 15], system)?;
    }
    Ok(corners)
}

/// Format four corners as a sixty byte IGEOLO field.
pub fn format_igeolo(corners: &[GeoPoint; 4], system: CoordinateSystem) -> Result<String, NitfError> {
    let mut out = String::with_capacity(60);
    for corner in corners {
        out.push_str(&format_corner(*corner, system)?);
    }
    Ok(out)
}
