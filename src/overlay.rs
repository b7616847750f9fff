//! Análisis de solape vectorial entre parcela y capa regulatoria
//!
//! Calcula la intersección geométrica parcela × capa, las áreas de solape y
//! los porcentajes de afección, desglosados por clase cuando la capa define
//! campo de clasificación.

use std::collections::BTreeMap;

use geo::{Area, BooleanOps, BoundingRect, Intersects};
use serde::Serialize;
use tracing::{debug, info};

use crate::estilo::{Estilo, CLASE_GENERAL};
use crate::reproject::Reprojector;
use crate::types::{redondear2, Capa, Parcela};
use crate::AfeccionError;

/// Umbral de materialidad en porcentaje: los grupos con afección igual o
/// inferior se descartan como ruido numérico de intersecciones residuales.
/// Se aplica de manera uniforme al desglose por clase, al estimador raster
/// y al total agregado.
pub const UMBRAL_MATERIALIDAD_PCT: f64 = 0.01;

/// Afección de una clase concreta dentro de una capa
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaseAfectada {
    /// Área de solape en m²
    pub area_m2: f64,
    /// Porcentaje sobre el área de la parcela
    pub porcentaje: f64,
}

/// Resultado del análisis vectorial de una capa sobre una parcela
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultadoCapa {
    /// Porcentaje total afectado, en [0, 100]
    pub total_pct: f64,

    /// Área afectada total en m²
    pub area_afectada_m2: f64,

    /// Área de la parcela en m²
    pub area_parcela_m2: f64,

    /// Desglose por clase (etiqueta -> área y porcentaje), ordenado
    pub por_clase: BTreeMap<String, ClaseAfectada>,

    /// Número de features de la capa que intersectan la parcela
    pub elementos_afectantes: usize,

    /// `false` cuando no hay afección material: resultado válido, no error
    pub detectada: bool,
}

impl ResultadoCapa {
    /// Resultado "sin afección" para una parcela dada
    fn sin_afeccion(area_parcela_m2: f64) -> Self {
        Self {
            total_pct: 0.0,
            area_afectada_m2: 0.0,
            area_parcela_m2: redondear2(area_parcela_m2),
            por_clase: BTreeMap::new(),
            elementos_afectantes: 0,
            detectada: false,
        }
    }
}

/// Analiza la afección de una capa regulatoria sobre una parcela
///
/// La capa se reproyecta al CRS de cálculo de la parcela si difieren. El
/// prefiltro por bounding box y por `intersects` es solo una optimización:
/// omitirlo no cambia el resultado.
///
/// # Errors
///
/// `InvalidArea` si el área de la parcela es nula o negativa (jamás se llega
/// a dividir); `UnsupportedCrs` si la capa viene en un CRS fuera de catálogo.
pub fn analizar(
    parcela: &Parcela,
    capa: &Capa,
    estilo: &Estilo,
) -> Result<ResultadoCapa, AfeccionError> {
    if parcela.area_m2 <= 0.0 {
        return Err(AfeccionError::InvalidArea {
            referencia: parcela.referencia.clone(),
            area_m2: parcela.area_m2,
        });
    }

    // 1. Reproyectar la capa al CRS de la parcela si hace falta
    let reproj = (capa.epsg != parcela.epsg)
        .then(|| Reprojector::new(capa.epsg, parcela.epsg))
        .transpose()?;

    let bbox_parcela = match parcela.geometria.bounding_rect() {
        Some(r) => r,
        None => return Ok(ResultadoCapa::sin_afeccion(parcela.area_m2)),
    };

    // 2-3. Prefiltro + intersección por feature
    let mut area_total = 0.0;
    let mut por_codigo: BTreeMap<String, f64> = BTreeMap::new();
    let mut elementos = 0usize;

    for feature in &capa.features {
        let geometria = match &reproj {
            Some(r) => r.transform_multipolygon(&feature.geometria),
            None => feature.geometria.clone(),
        };

        // Descarte barato por bounding box, luego test exacto
        match geometria.bounding_rect() {
            Some(bbox) if bbox.intersects(&bbox_parcela) => {}
            _ => continue,
        }
        if !geometria.intersects(&parcela.geometria) {
            continue;
        }

        let solape = parcela.geometria.intersection(&geometria);
        let area = solape.unsigned_area();
        if area <= 0.0 {
            continue;
        }

        elementos += 1;
        area_total += area;

        let codigo = match &estilo.campo {
            Some(campo) => feature
                .atributos
                .get(campo)
                .map(String::as_str)
                .unwrap_or(CLASE_GENERAL),
            None => CLASE_GENERAL,
        };
        *por_codigo.entry(codigo.to_string()).or_insert(0.0) += area;
    }

    if elementos == 0 {
        debug!(capa = %capa.nombre, parcela = %parcela.referencia, "sin intersecciones");
        return Ok(ResultadoCapa::sin_afeccion(parcela.area_m2));
    }

    // 4. Porcentaje total, acotado a [0, 100]
    let pct_bruto = (area_total / parcela.area_m2 * 100.0).clamp(0.0, 100.0);

    // 5-6. Desglose por clase con umbral de materialidad
    let mut por_clase = BTreeMap::new();
    for (codigo, area) in por_codigo {
        let pct = (area / parcela.area_m2 * 100.0).clamp(0.0, 100.0);
        // Margen relativo minúsculo: el límite exacto del umbral debe quedar
        // excluido aunque la intersección lo compute unos ulps por encima
        if pct <= UMBRAL_MATERIALIDAD_PCT * (1.0 + 1e-9) {
            continue;
        }
        let etiqueta = estilo.etiqueta(&codigo);
        por_clase.insert(
            etiqueta,
            ClaseAfectada {
                area_m2: redondear2(area),
                porcentaje: redondear2(pct),
            },
        );
    }

    let detectada = pct_bruto > UMBRAL_MATERIALIDAD_PCT;

    info!(
        capa = %capa.nombre,
        parcela = %parcela.referencia,
        total_pct = redondear2(pct_bruto),
        elementos,
        "análisis de solape completado"
    );

    Ok(ResultadoCapa {
        total_pct: redondear2(pct_bruto),
        area_afectada_m2: redondear2(area_total),
        area_parcela_m2: redondear2(parcela.area_m2),
        por_clase,
        elementos_afectantes: elementos,
        detectada,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estilo::Estilo;
    use crate::types::FeatureCapa;
    use geo::{polygon, MultiPolygon};
    use std::collections::HashMap;

    fn parcela_rectangular(ancho: f64, alto: f64) -> Parcela {
        let poly = polygon![
            (x: 660000.0, y: 4200000.0),
            (x: 660000.0 + ancho, y: 4200000.0),
            (x: 660000.0 + ancho, y: 4200000.0 + alto),
            (x: 660000.0, y: 4200000.0 + alto),
            (x: 660000.0, y: 4200000.0),
        ];
        Parcela {
            referencia: "30016A00100023".to_string(),
            geometria: MultiPolygon::new(vec![poly]),
            epsg: 25830,
            epsg_origen: 25830,
            area_m2: ancho * alto,
        }
    }

    fn feature_rect(x0: f64, y0: f64, x1: f64, y1: f64, atributos: &[(&str, &str)]) -> FeatureCapa {
        let poly = polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ];
        FeatureCapa {
            geometria: MultiPolygon::new(vec![poly]),
            atributos: atributos
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn capa(nombre: &str, features: Vec<FeatureCapa>) -> Capa {
        Capa {
            nombre: nombre.to_string(),
            epsg: 25830,
            features,
        }
    }

    #[test]
    fn test_parcela_contenida_al_cien_por_cien() {
        let parcela = parcela_rectangular(100.0, 100.0);
        // Feature mucho más grande que la parcela
        let capa = capa(
            "Monte Público",
            vec![feature_rect(659000.0, 4199000.0, 661000.0, 4201000.0, &[])],
        );

        let r = analizar(&parcela, &capa, &Estilo::general()).unwrap();
        assert!((r.total_pct - 100.0).abs() < 1e-6 * 100.0);
        assert!(r.detectada);
        assert_eq!(r.elementos_afectantes, 1);
        assert_eq!(r.por_clase.len(), 1);
        assert!(r.por_clase.contains_key("General"));
    }

    #[test]
    fn test_parcela_disjunta() {
        let parcela = parcela_rectangular(100.0, 100.0);
        let capa = capa(
            "Zona Inundable",
            vec![feature_rect(700000.0, 4300000.0, 700100.0, 4300100.0, &[])],
        );

        let r = analizar(&parcela, &capa, &Estilo::general()).unwrap();
        assert_eq!(r.total_pct, 0.0);
        assert!(!r.detectada);
        assert!(r.por_clase.is_empty());
    }

    #[test]
    fn test_desglose_por_clase_suma_el_total() {
        // Parcela de 100x100; dos features con clases distintas
        let parcela = parcela_rectangular(100.0, 100.0);
        let estilo = Estilo {
            campo: Some("tipo".to_string()),
            etiquetas: [("A".to_string(), "Clase A".to_string())].into(),
            colores: HashMap::new(),
        };
        let capa = capa(
            "Planeamiento",
            vec![
                // 30x100 = 3000 m²
                feature_rect(660000.0, 4200000.0, 660030.0, 4200100.0, &[("tipo", "A")]),
                // 20x100 = 2000 m²
                feature_rect(660050.0, 4200000.0, 660070.0, 4200100.0, &[("tipo", "B")]),
            ],
        );

        let r = analizar(&parcela, &capa, &estilo).unwrap();
        assert!((r.total_pct - 50.0).abs() < 1e-9);
        assert_eq!(r.elementos_afectantes, 2);

        let suma: f64 = r.por_clase.values().map(|c| c.area_m2).sum();
        assert!((suma - r.area_afectada_m2).abs() < 0.01);

        // Código mapeado y código crudo como respaldo
        assert!((r.por_clase["Clase A"].porcentaje - 30.0).abs() < 1e-9);
        assert!((r.por_clase["B"].porcentaje - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_feature_sin_atributo_cae_en_general() {
        let parcela = parcela_rectangular(100.0, 100.0);
        let estilo = Estilo {
            campo: Some("tipo".to_string()),
            etiquetas: HashMap::new(),
            colores: HashMap::new(),
        };
        let capa = capa(
            "Planeamiento",
            vec![feature_rect(660000.0, 4200000.0, 660050.0, 4200100.0, &[])],
        );

        let r = analizar(&parcela, &capa, &estilo).unwrap();
        assert!(r.por_clase.contains_key("General"));
        let suma: f64 = r.por_clase.values().map(|c| c.area_m2).sum();
        assert!((suma - r.area_afectada_m2).abs() < 0.01);
    }

    #[test]
    fn test_umbral_de_materialidad() {
        // Parcela de 1000x1000 = 1e6 m². Una clase a exactamente 0.01%
        // (100 m²) se excluye; otra a 0.011% (110 m²) se incluye.
        let parcela = parcela_rectangular(1000.0, 1000.0);
        let estilo = Estilo {
            campo: Some("tipo".to_string()),
            etiquetas: HashMap::new(),
            colores: HashMap::new(),
        };
        let capa = capa(
            "Planeamiento",
            vec![
                // 100 m²: 1x100
                feature_rect(660000.0, 4200000.0, 660001.0, 4200100.0, &[("tipo", "exacto")]),
                // 110 m²: 1.1x100
                feature_rect(660010.0, 4200000.0, 660011.1, 4200100.0, &[("tipo", "encima")]),
            ],
        );

        let r = analizar(&parcela, &capa, &estilo).unwrap();
        assert!(!r.por_clase.contains_key("exacto"));
        assert!(r.por_clase.contains_key("encima"));
        assert!((r.por_clase["encima"].porcentaje - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_area_invalida() {
        let mut parcela = parcela_rectangular(100.0, 100.0);
        parcela.area_m2 = 0.0;
        let capa = capa("Zona Inundable", vec![]);

        assert!(matches!(
            analizar(&parcela, &capa, &Estilo::general()),
            Err(AfeccionError::InvalidArea { .. })
        ));
    }

    #[test]
    fn test_capa_en_otro_crs() {
        // Parcela en UTM 30N; capa en geográficas cubriendo la misma zona
        let parcela = parcela_rectangular(100.0, 100.0);
        let poly = polygon![
            (x: -5.0, y: 37.0),
            (x: -1.0, y: 37.0),
            (x: -1.0, y: 39.0),
            (x: -5.0, y: 39.0),
            (x: -5.0, y: 37.0),
        ];
        let capa = Capa {
            nombre: "Espacio Natural".to_string(),
            epsg: 4326,
            features: vec![FeatureCapa {
                geometria: MultiPolygon::new(vec![poly]),
                atributos: HashMap::new(),
            }],
        };

        let r = analizar(&parcela, &capa, &Estilo::general()).unwrap();
        // La parcela (UTM 660000, 4200000 ≈ -1.2°, 37.9°) cae dentro
        assert!((r.total_pct - 100.0).abs() < 1e-3, "pct={}", r.total_pct);
    }

    #[test]
    fn test_idempotencia() {
        let parcela = parcela_rectangular(100.0, 10.0);
        let capa = capa(
            "Zona Inundable",
            vec![feature_rect(660000.0, 4200000.0, 660010.2, 4200010.0, &[])],
        );

        let a = analizar(&parcela, &capa, &Estilo::general()).unwrap();
        let b = analizar(&parcela, &capa, &Estilo::general()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
