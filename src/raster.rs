//! Estimador de afección por muestreo raster
//!
//! Cuando una fuente regulatoria no ofrece capa vectorial, el colaborador WMS
//! entrega un tile renderizado y su encuadre; aquí se muestrea píxel a píxel
//! contra el polígono de la parcela. Los overlays regulatorios se pintan con
//! colores no de fondo, así que una intensidad claramente por debajo del
//! blanco se cuenta como afección.
//!
//! Es una heurística explícita: el umbral de brillo aproxima "hay color de
//! overlay", no una clasificación semántica, y puede fallar con colores muy
//! pálidos. Existe para dar señal donde no hay vectorial autoritativa.

use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::overlay::UMBRAL_MATERIALIDAD_PCT;
use crate::types::{redondear2, RasterTile};

/// Umbral de intensidad por defecto: los píxeles con luminancia estrictamente
/// inferior cuentan como afectados; los valores cercanos a 255 son fondo
pub const UMBRAL_INTENSIDAD_DEFECTO: u8 = 250;

/// Estimación aproximada de afección de una capa sin vectorial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimacionRaster {
    /// Nombre de la capa regulatoria
    pub capa: String,

    /// Porcentaje afectado estimado, en [0, 100]
    pub porcentaje: f64,
}

/// Estima el porcentaje de parcela afectado muestreando un tile raster
///
/// `geometria` debe venir en el CRS del encuadre `bbox` (el del tile). La
/// rejilla de muestreo replica las dimensiones del tile: x crece con las
/// columnas y la y decrece con las filas, siguiendo el orden de imagen de
/// arriba a abajo. Devuelve 0.0 si ningún punto de muestra cae dentro de la
/// parcela.
pub fn estimar(
    geometria: &MultiPolygon<f64>,
    tile: &RasterTile,
    bbox: &Rect<f64>,
    umbral: u8,
) -> f64 {
    let bbox_parcela = match geometria.bounding_rect() {
        Some(r) => r,
        None => return 0.0,
    };

    let ancho = tile.ancho as usize;
    let alto = tile.alto as usize;
    if ancho == 0 || alto == 0 {
        return 0.0;
    }

    // Coordenadas x de columna, interpoladas una sola vez para todas las filas
    let xs: Vec<f64> = (0..ancho)
        .map(|col| interpolar(bbox.min().x, bbox.max().x, col, ancho))
        .collect();

    // El coste escala con ancho × alto: se paraleliza por filas
    let (afectados, dentro) = (0..alto)
        .into_par_iter()
        .map(|fila| {
            // Latitud descendente: la fila 0 es el borde superior de la imagen
            let y = interpolar(bbox.max().y, bbox.min().y, fila, alto);
            if y < bbox_parcela.min().y || y > bbox_parcela.max().y {
                return (0u64, 0u64);
            }

            let mut afectados = 0u64;
            let mut dentro = 0u64;
            for (col, &x) in xs.iter().enumerate() {
                // Descarte rápido por bounding box antes del test exacto
                if x < bbox_parcela.min().x || x > bbox_parcela.max().x {
                    continue;
                }
                if !geometria.contains(&Point::new(x, y)) {
                    continue;
                }
                dentro += 1;
                if tile.luminancia(col as u32, fila as u32) < umbral {
                    afectados += 1;
                }
            }
            (afectados, dentro)
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    if dentro == 0 {
        return 0.0;
    }

    let pct = afectados as f64 / dentro as f64 * 100.0;
    debug!(afectados, dentro, pct, "muestreo raster completado");

    let pct = redondear2(pct.clamp(0.0, 100.0));
    // Umbral de materialidad uniforme: señal residual se reporta como cero
    if pct <= UMBRAL_MATERIALIDAD_PCT {
        0.0
    } else {
        pct
    }
}

/// Estima una capa completa, con el umbral por defecto
pub fn estimar_capa(
    nombre: &str,
    geometria: &MultiPolygon<f64>,
    tile: &RasterTile,
    bbox: &Rect<f64>,
) -> EstimacionRaster {
    EstimacionRaster {
        capa: nombre.to_string(),
        porcentaje: estimar(geometria, tile, bbox, UMBRAL_INTENSIDAD_DEFECTO),
    }
}

/// Interpolación lineal del índice `i` de `n` muestras entre `desde` y `hasta`
fn interpolar(desde: f64, hasta: f64, i: usize, n: usize) -> f64 {
    if n <= 1 {
        return (desde + hasta) / 2.0;
    }
    desde + (hasta - desde) * i as f64 / (n - 1) as f64
}
