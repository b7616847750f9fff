//! Tipos de datos del motor de afecciones

use geo::{Geometry, MultiPolygon};
use std::collections::HashMap;

use crate::AfeccionError;

/// Una feature decodificada con su geometría y sus atributos
///
/// Es lo que entrega el colaborador externo de lectura de ficheros
/// (GML, GeoJSON, KML, GPKG): el núcleo nunca hace I/O de ficheros.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Geometría (cualquier tipo; el cargador filtra las poligonales)
    pub geometry: Geometry<f64>,

    /// Atributos de la feature (clave -> valor)
    pub properties: HashMap<String, String>,
}

/// Colección de features decodificada con su CRS de origen
///
/// `epsg: None` significa que la fuente no traía metadatos de CRS. Algunas
/// fuentes oficiales los omiten: el cargador asume entonces el CRS planar
/// por defecto en vez de fallar.
#[derive(Debug, Clone, Default)]
pub struct VectorSource {
    pub features: Vec<Feature>,
    pub epsg: Option<u32>,
}

impl VectorSource {
    pub fn new(features: Vec<Feature>, epsg: Option<u32>) -> Self {
        Self { features, epsg }
    }
}

/// Parcela catastral normalizada al CRS de cálculo
#[derive(Debug, Clone)]
pub struct Parcela {
    /// Referencia catastral
    pub referencia: String,

    /// Geometría en el CRS de cálculo
    pub geometria: MultiPolygon<f64>,

    /// CRS de cálculo (proyectado, nunca geográfico)
    pub epsg: u32,

    /// CRS de la fuente original
    pub epsg_origen: u32,

    /// Área planar en m², calculada en el CRS de cálculo. Invariante: > 0
    pub area_m2: f64,
}

/// Feature poligonal de una capa regulatoria
#[derive(Debug, Clone)]
pub struct FeatureCapa {
    pub geometria: MultiPolygon<f64>,
    pub atributos: HashMap<String, String>,
}

/// Capa regulatoria: colección nombrada de features poligonales
///
/// Invariante: todas las features comparten el CRS `epsg` en el momento
/// del análisis.
#[derive(Debug, Clone)]
pub struct Capa {
    pub nombre: String,
    pub epsg: u32,
    pub features: Vec<FeatureCapa>,
}

/// Tile raster RGBA ya decodificado, entregado por el colaborador WMS
///
/// Píxeles fila a fila desde la esquina superior izquierda, 4 bytes por
/// píxel (R, G, B, A).
#[derive(Debug, Clone)]
pub struct RasterTile {
    pub ancho: u32,
    pub alto: u32,
    pixeles: Vec<u8>,
}

impl RasterTile {
    /// Crea un tile validando que el buffer case con las dimensiones
    pub fn new(ancho: u32, alto: u32, pixeles: Vec<u8>) -> Result<Self, AfeccionError> {
        let esperado = ancho as usize * alto as usize * 4;
        if pixeles.len() != esperado {
            return Err(AfeccionError::InvalidRaster(format!(
                "{}x{} RGBA requiere {} bytes, recibidos {}",
                ancho,
                alto,
                esperado,
                pixeles.len()
            )));
        }
        Ok(Self {
            ancho,
            alto,
            pixeles,
        })
    }

    /// Intensidad en escala de grises del píxel (col, fila)
    ///
    /// Luminancia ITU-R 601. Los píxeles totalmente transparentes cuentan
    /// como fondo (255): los overlays WMS se sirven con fondo transparente
    /// y su RGB subyacente es arbitrario.
    pub fn luminancia(&self, col: u32, fila: u32) -> u8 {
        debug_assert!(col < self.ancho && fila < self.alto);
        let i = (fila as usize * self.ancho as usize + col as usize) * 4;
        let (r, g, b, a) = (
            self.pixeles[i] as f64,
            self.pixeles[i + 1] as f64,
            self.pixeles[i + 2] as f64,
            self.pixeles[i + 3],
        );
        if a == 0 {
            return 255;
        }
        (0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0) as u8
    }
}

/// Redondeo a dos decimales, contrato de salida de porcentajes y áreas
pub(crate) fn redondear2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
