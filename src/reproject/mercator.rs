//! Proyección Web Mercator (EPSG:3857)
//!
//! Modelo esférico sobre el radio ecuatorial WGS84: es la proyección de los
//! servicios de teselas (ortofoto PNOA, visores WMS) de donde llegan los
//! encuadres de parcela.

use super::ellipsoid::WGS84;
use super::Geographic;

/// Convierte coordenadas geográficas a Web Mercator
pub fn geografica_a_web_mercator(geo: Geographic) -> (f64, f64) {
    // Limitar la latitud para evitar el infinito en los polos
    let lat = geo.lat.clamp(-85.0_f64.to_radians(), 85.0_f64.to_radians());

    let x = WGS84::A * geo.lon;
    let y = WGS84::A * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

/// Convierte Web Mercator a coordenadas geográficas
pub fn web_mercator_a_geografica(x: f64, y: f64) -> Geographic {
    let lon = x / WGS84::A;
    let lat = 2.0 * (y / WGS84::A).exp().atan() - std::f64::consts::FRAC_PI_2;
    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_madrid() {
        // Madrid: -3.70379°E, 40.416775°N
        // EPSG:3857 aproximadamente (-412300, 4927000)
        let geo = Geographic::from_degrees(-3.70379, 40.416775);
        let (x, y) = geografica_a_web_mercator(geo);

        assert!((x - (-412300.0)).abs() < 500.0, "x={}", x);
        assert!((y - 4927000.0).abs() < 2000.0, "y={}", y);
    }

    #[test]
    fn test_ida_y_vuelta() {
        let geo = Geographic::from_degrees(-1.1307, 37.9922);
        let (x, y) = geografica_a_web_mercator(geo);
        let vuelta = web_mercator_a_geografica(x, y);
        let (lon, lat) = vuelta.to_degrees();

        assert!((lon - (-1.1307)).abs() < 1e-10);
        assert!((lat - 37.9922).abs() < 1e-10);
    }

    #[test]
    fn test_latitud_polar_acotada() {
        // Por encima de 85° la proyección se satura en vez de divergir
        let (_, y_polar) = geografica_a_web_mercator(Geographic::from_degrees(0.0, 89.9));
        let (_, y_limite) = geografica_a_web_mercator(Geographic::from_degrees(0.0, 85.0));

        assert!(y_polar.is_finite());
        assert_eq!(y_polar, y_limite);
    }

    #[test]
    fn test_origen() {
        let geo = web_mercator_a_geografica(0.0, 0.0);
        let (lon, lat) = geo.to_degrees();
        assert!(lon.abs() < 1e-12);
        assert!(lat.abs() < 1e-12);
    }
}
