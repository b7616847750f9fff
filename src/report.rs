//! Agregación de resultados por capa en el informe final de afecciones
//!
//! El informe resume varios análisis independientes (vectoriales y raster)
//! sobre la misma parcela. El porcentaje total es el máximo entre capas, no
//! la suma: las capas se solapan entre sí con frecuencia y sumar duplicaría
//! superficie. Las capas que fallaron al cargar se relegan a su propia
//! sección con el motivo, sin contaminar el desglose.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::overlay::{ClaseAfectada, ResultadoCapa, UMBRAL_MATERIALIDAD_PCT};
use crate::raster::EstimacionRaster;
use crate::types::{redondear2, Parcela};

/// Resultado de analizar una capa, cualquiera que sea la vía
#[derive(Debug, Clone)]
pub enum ResultadoAnalisis {
    /// Solape vectorial exacto
    Vectorial(ResultadoCapa),
    /// Estimación por muestreo raster
    Raster(EstimacionRaster),
    /// La capa no pudo evaluarse
    NoDisponible { motivo: String },
}

/// Entrada del desglose por capa en el informe
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum DetalleCapa {
    /// Resultado vectorial exacto
    Vectorial {
        porcentaje: f64,
        area_m2: f64,
        por_clase: BTreeMap<String, ClaseAfectada>,
        elementos_afectantes: usize,
        detectada: bool,
    },
    /// Estimación raster, sin área ni desglose fiables
    Raster { porcentaje: f64 },
}

impl DetalleCapa {
    fn porcentaje(&self) -> f64 {
        match self {
            DetalleCapa::Vectorial { porcentaje, .. } => *porcentaje,
            DetalleCapa::Raster { porcentaje } => *porcentaje,
        }
    }
}

/// Informe agregado de afecciones de una parcela
///
/// La serialización es determinista: los desgloses van en mapas ordenados y
/// todas las cifras se redondean a dos decimales antes de emitirse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformeAfecciones {
    /// Porcentaje total afectado: el máximo entre capas, en [0, 100]
    pub total: f64,

    /// Desglose por capa evaluada (incluidas las de afección cero)
    pub detalle: BTreeMap<String, DetalleCapa>,

    /// Capas que no pudieron evaluarse, con el motivo
    pub no_disponibles: BTreeMap<String, String>,

    /// Área de la parcela en m²
    pub area_parcela_m2: f64,

    /// Área afectada en m² de la capa que marca el máximo
    pub area_afectada_m2: f64,

    /// Número de capas evaluadas con éxito
    pub capas_analizadas: usize,

    /// Número de capas con afección material
    pub capas_con_afeccion: usize,
}

/// Agrega los resultados por capa en el informe final
///
/// Acepta la salida de análisis heterogéneos sobre la misma parcela. El área
/// de la parcela sale siempre de la propia parcela, nunca de los resultados:
/// el informe la conserva aunque todas las capas fallen o sean raster. Si un
/// análisis vectorial la contradice se registra la discrepancia; no debería
/// ocurrir salvo error de integración aguas arriba.
pub fn agregar(
    parcela: &Parcela,
    resultados: Vec<(String, ResultadoAnalisis)>,
) -> InformeAfecciones {
    let area_parcela_m2 = redondear2(parcela.area_m2);

    let mut detalle = BTreeMap::new();
    let mut no_disponibles = BTreeMap::new();

    for (nombre, resultado) in resultados {
        match resultado {
            ResultadoAnalisis::Vectorial(r) => {
                if (r.area_parcela_m2 - area_parcela_m2).abs() > 0.01 {
                    warn!(
                        capa = %nombre,
                        area_parcela = area_parcela_m2,
                        area_capa = r.area_parcela_m2,
                        "área de parcela discrepante entre análisis"
                    );
                }
                detalle.insert(
                    nombre,
                    DetalleCapa::Vectorial {
                        porcentaje: r.total_pct,
                        area_m2: r.area_afectada_m2,
                        por_clase: r.por_clase,
                        elementos_afectantes: r.elementos_afectantes,
                        detectada: r.detectada,
                    },
                );
            }
            ResultadoAnalisis::Raster(e) => {
                detalle.insert(
                    nombre,
                    DetalleCapa::Raster {
                        porcentaje: e.porcentaje,
                    },
                );
            }
            ResultadoAnalisis::NoDisponible { motivo } => {
                warn!(capa = %nombre, motivo = %motivo, "capa no disponible");
                no_disponibles.insert(nombre, motivo);
            }
        }
    }

    // Máximo entre capas y la capa que lo marca
    let maximo = detalle
        .iter()
        .max_by(|a, b| {
            a.1.porcentaje()
                .partial_cmp(&b.1.porcentaje())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(nombre, d)| (nombre.clone(), d.clone()));

    let (total, area_afectada_m2) = match maximo {
        Some((_, detalle_max)) if detalle_max.porcentaje() > UMBRAL_MATERIALIDAD_PCT => {
            let area = match &detalle_max {
                DetalleCapa::Vectorial { area_m2, .. } => *area_m2,
                // Para raster solo se puede derivar del porcentaje
                DetalleCapa::Raster { porcentaje } => {
                    redondear2(porcentaje / 100.0 * area_parcela_m2)
                }
            };
            (detalle_max.porcentaje(), area)
        }
        // Ninguna afección material: total cero, el desglose conserva cifras
        _ => (0.0, 0.0),
    };

    let capas_analizadas = detalle.len();
    let capas_con_afeccion = detalle
        .values()
        .filter(|d| d.porcentaje() > UMBRAL_MATERIALIDAD_PCT)
        .count();

    info!(
        total,
        capas_analizadas,
        capas_con_afeccion,
        no_disponibles = no_disponibles.len(),
        "informe de afecciones agregado"
    );

    InformeAfecciones {
        total,
        detalle,
        no_disponibles,
        area_parcela_m2,
        area_afectada_m2,
        capas_analizadas,
        capas_con_afeccion,
    }
}
