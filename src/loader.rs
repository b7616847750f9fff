//! Carga y normalización de geometrías de parcela y de capas regulatorias
//!
//! Las fuentes llegan ya decodificadas ([`VectorSource`]); aquí se aplica la
//! política de CRS, la reproyección al CRS de cálculo y el cálculo de área.

use geo::{Area, Geometry, MultiPolygon, Polygon};
use tracing::{debug, warn};

use crate::reproject::{es_geografico, Reprojector};
use crate::types::{Capa, Feature, FeatureCapa, Parcela, VectorSource};
use crate::AfeccionError;

/// CRS de cálculo por defecto: ETRS89 / UTM 30N, la zona oficial peninsular
pub const EPSG_CALCULO_DEFECTO: u32 = 25830;

/// Cargador de geometrías con CRS de cálculo configurable
///
/// El CRS de cálculo debe ser proyectado: un área calculada en grados produce
/// magnitudes sin sentido en silencio, de ahí que el constructor lo rechace.
#[derive(Debug, Clone)]
pub struct Cargador {
    epsg_calculo: u32,
    /// CRS asumido cuando la fuente no trae metadatos
    epsg_defecto: u32,
}

impl Default for Cargador {
    fn default() -> Self {
        Self {
            epsg_calculo: EPSG_CALCULO_DEFECTO,
            epsg_defecto: EPSG_CALCULO_DEFECTO,
        }
    }
}

impl Cargador {
    /// Cargador con el CRS de cálculo por defecto (EPSG:25830)
    pub fn new() -> Self {
        Self::default()
    }

    /// Cargador con CRS de cálculo y CRS por defecto explícitos
    pub fn con_crs(epsg_calculo: u32, epsg_defecto: u32) -> Result<Self, AfeccionError> {
        if es_geografico(epsg_calculo) {
            return Err(AfeccionError::GeographicCalculationCrs(epsg_calculo));
        }
        if !Reprojector::is_supported(epsg_calculo) {
            return Err(AfeccionError::UnsupportedCrs(epsg_calculo));
        }
        if !Reprojector::is_supported(epsg_defecto) {
            return Err(AfeccionError::UnsupportedCrs(epsg_defecto));
        }
        Ok(Self {
            epsg_calculo,
            epsg_defecto,
        })
    }

    pub fn epsg_calculo(&self) -> u32 {
        self.epsg_calculo
    }

    /// Carga una parcela desde una fuente decodificada
    ///
    /// Rechaza fuentes vacías. Si la fuente no trae CRS se asume el CRS por
    /// defecto (política de lenidad: algunas fuentes oficiales lo omiten) y
    /// se registra como degradación de calidad, no como fallo.
    pub fn cargar_parcela(
        &self,
        fuente: &VectorSource,
        referencia: &str,
    ) -> Result<Parcela, AfeccionError> {
        let epsg_origen = self.resolver_epsg(fuente, referencia);
        let geometria = self.normalizar(&fuente.features, epsg_origen)?;

        if geometria.0.is_empty() {
            return Err(AfeccionError::EmptyGeometry(format!(
                "parcela {referencia}: sin geometría poligonal"
            )));
        }

        let area_m2 = geometria.unsigned_area();
        if area_m2 <= 0.0 {
            return Err(AfeccionError::InvalidArea {
                referencia: referencia.to_string(),
                area_m2,
            });
        }

        debug!(referencia, area_m2, epsg_origen, "parcela cargada");

        Ok(Parcela {
            referencia: referencia.to_string(),
            geometria,
            epsg: self.epsg_calculo,
            epsg_origen,
            area_m2,
        })
    }

    /// Carga una capa regulatoria desde una fuente decodificada
    ///
    /// Misma normalización que la parcela; conserva los atributos de cada
    /// feature para la clasificación posterior.
    pub fn cargar_capa(&self, fuente: &VectorSource, nombre: &str) -> Result<Capa, AfeccionError> {
        let epsg_origen = self.resolver_epsg(fuente, nombre);
        let reproj = Reprojector::new(epsg_origen, self.epsg_calculo)?;

        let mut features = Vec::with_capacity(fuente.features.len());
        for f in &fuente.features {
            let poligonos = extraer_poligonos(&f.geometry);
            if poligonos.is_empty() {
                continue;
            }
            let mp = reproj.transform_multipolygon(&MultiPolygon::new(poligonos));
            features.push(FeatureCapa {
                geometria: mp,
                atributos: f.properties.clone(),
            });
        }

        if features.is_empty() {
            return Err(AfeccionError::EmptyGeometry(format!(
                "capa {nombre}: sin features poligonales"
            )));
        }

        debug!(nombre, features = features.len(), "capa cargada");

        Ok(Capa {
            nombre: nombre.to_string(),
            epsg: self.epsg_calculo,
            features,
        })
    }

    fn resolver_epsg(&self, fuente: &VectorSource, contexto: &str) -> u32 {
        match fuente.epsg {
            Some(epsg) => epsg,
            None => {
                warn!(
                    contexto,
                    epsg_asumido = self.epsg_defecto,
                    "fuente sin CRS, asumiendo el CRS por defecto"
                );
                self.epsg_defecto
            }
        }
    }

    /// Reúne los polígonos de todas las features en un MultiPolygon en el
    /// CRS de cálculo
    fn normalizar(
        &self,
        features: &[Feature],
        epsg_origen: u32,
    ) -> Result<MultiPolygon<f64>, AfeccionError> {
        let reproj = Reprojector::new(epsg_origen, self.epsg_calculo)?;

        let poligonos: Vec<Polygon<f64>> = features
            .iter()
            .flat_map(|f| extraer_poligonos(&f.geometry))
            .collect();

        Ok(reproj.transform_multipolygon(&MultiPolygon::new(poligonos)))
    }
}

/// Extrae los polígonos de una geometría, recursivamente para colecciones
fn extraer_poligonos(geom: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geom {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(extraer_poligonos).collect(),
        // Puntos y líneas no aportan área
        _ => Vec::new(),
    }
}

/// Normaliza una referencia catastral: sin espacios, en mayúsculas
///
/// Las referencias de parcela tienen 14 caracteres y las de inmueble 20.
pub fn limpiar_referencia(referencia: &str) -> Result<String, AfeccionError> {
    let limpia: String = referencia
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if limpia.len() < 14 || !limpia.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AfeccionError::InvalidReference(referencia.to_string()));
    }
    Ok(limpia)
}
