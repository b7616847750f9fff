//! Reproyección ligera en Rust puro (sin dependencias externas)
//!
//! Cubre los CRS que emiten las fuentes catastrales y regulatorias españolas:
//! - ETRS89 / UTM 28N..31N (EPSG:25828-25831) - Canarias y península
//! - WGS84 / ETRS89 geográficas (EPSG:4326, 4258)
//! - Web Mercator (EPSG:3857) - teselas de visores
//!
//! Cualquier combinación fuente/destino entre ellos es válida; la
//! transformación pasa siempre por coordenadas geográficas intermedias.
//! La diferencia de datum WGS84/ETRS89 (< 1 m, deriva continental) está por
//! debajo de la precisión de las capas regulatorias y se ignora.

mod ellipsoid;
mod mercator;
mod utm;

pub use ellipsoid::{GRS80, WGS84};

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::AfeccionError;

/// Punto en coordenadas geográficas (radianes)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitud en radianes
    pub lon: f64,
    /// Latitud en radianes
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convierte a grados
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crea desde grados
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Familia de CRS soportada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Familia {
    /// Coordenadas geográficas en grados (4326, 4258)
    Geografica,
    /// Web Mercator (3857)
    WebMercator,
    /// ETRS89 / UTM hemisferio norte (25828-25831)
    Utm { zona: u32 },
}

fn clasificar(epsg: u32) -> Option<Familia> {
    match epsg {
        4326 | 4258 => Some(Familia::Geografica),
        3857 => Some(Familia::WebMercator),
        25828..=25831 => Some(Familia::Utm { zona: epsg - 25800 }),
        _ => None,
    }
}

/// Indica si un EPSG es un CRS geográfico (coordenadas en grados)
pub fn es_geografico(epsg: u32) -> bool {
    matches!(clasificar(epsg), Some(Familia::Geografica))
}

/// Reproyector entre dos CRS soportados
pub struct Reprojector {
    source_epsg: u32,
    target_epsg: u32,
    source: Familia,
    target: Familia,
}

impl Reprojector {
    /// Crea un reproyector; falla con `UnsupportedCrs` fuera del catálogo
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, AfeccionError> {
        let source = clasificar(source_epsg).ok_or(AfeccionError::UnsupportedCrs(source_epsg))?;
        let target = clasificar(target_epsg).ok_or(AfeccionError::UnsupportedCrs(target_epsg))?;

        Ok(Self {
            source_epsg,
            target_epsg,
            source,
            target,
        })
    }

    /// Verifica si un EPSG está soportado
    pub fn is_supported(epsg: u32) -> bool {
        clasificar(epsg).is_some()
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforma un punto (x, y) de la fuente al destino
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        if self.source_epsg == self.target_epsg {
            return (x, y);
        }

        let geo = match self.source {
            Familia::Geografica => Geographic::from_degrees(x, y),
            Familia::WebMercator => mercator::web_mercator_a_geografica(x, y),
            Familia::Utm { zona } => utm::utm_a_geografica(x, y, zona),
        };

        match self.target {
            Familia::Geografica => geo.to_degrees(),
            Familia::WebMercator => mercator::geografica_a_web_mercator(geo),
            Familia::Utm { zona } => utm::geografica_a_utm(geo, zona),
        }
    }

    /// Transforma una LineString
    pub fn transform_linestring(&self, ls: &LineString<f64>) -> LineString<f64> {
        let coords: Vec<Coord<f64>> = ls
            .coords()
            .map(|c| {
                let (x, y) = self.transform_point(c.x, c.y);
                Coord { x, y }
            })
            .collect();
        LineString::new(coords)
    }

    /// Transforma un Polygon
    pub fn transform_polygon(&self, poly: &Polygon<f64>) -> Polygon<f64> {
        let exterior = self.transform_linestring(poly.exterior());
        let interiors: Vec<LineString<f64>> = poly
            .interiors()
            .iter()
            .map(|ring| self.transform_linestring(ring))
            .collect();
        Polygon::new(exterior, interiors)
    }

    /// Transforma un MultiPolygon
    pub fn transform_multipolygon(&self, mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(mp.iter().map(|p| self.transform_polygon(p)).collect())
    }
}
