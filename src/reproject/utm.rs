//! Proyección UTM (Universal Transverse Mercator) sobre ETRS89
//!
//! Zonas soportadas (hemisferio norte):
//! - Zona 28N (EPSG:25828) - Canarias occidentales
//! - Zona 29N (EPSG:25829) - Galicia, oeste peninsular
//! - Zona 30N (EPSG:25830) - Zona oficial peninsular
//! - Zona 31N (EPSG:25831) - Cataluña, Baleares

use super::ellipsoid::GRS80;
use super::Geographic;

/// Factor de escala UTM
const K0: f64 = 0.9996;
/// False easting
const X0: f64 = 500000.0;

/// Meridiano central de una zona UTM, en radianes
fn meridiano_central(zona: u32) -> f64 {
    ((zona as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Convierte UTM (ETRS89, hemisferio norte) a coordenadas geográficas
pub fn utm_a_geografica(x: f64, y: f64, zona: u32) -> Geographic {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let ep2 = GRS80::EP2;

    let lon0 = meridiano_central(zona);
    let x = x - X0;

    // Latitud footprint
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}

/// Convierte coordenadas geográficas a UTM (ETRS89, hemisferio norte)
pub fn geografica_a_utm(geo: Geographic, zona: u32) -> (f64, f64) {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let ep2 = GRS80::EP2;

    let lat = geo.lat;
    let lon0 = meridiano_central(zona);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
    let t = tan_lat.powi(2);
    let c = ep2 * cos_lat.powi(2);
    let aa = (geo.lon - lon0) * cos_lat;

    // Arco de meridiano desde el ecuador
    let m = a
        * ((1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e2.powi(2) / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                * (2.0 * lat).sin()
            + (15.0 * e2.powi(2) / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * lat).sin());

    let x = K0
        * n
        * (aa + (1.0 - t + c) * aa.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * aa.powi(5) / 120.0)
        + X0;

    let y = K0
        * (m + n
            * tan_lat
            * (aa.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * aa.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * aa.powi(6) / 720.0));

    (x, y)
}
