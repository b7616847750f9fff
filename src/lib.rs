//! # afecciones
//!
//! Motor de cálculo de afecciones territoriales sobre parcelas catastrales
//! españolas: qué porcentaje de una parcela queda dentro de zonas inundables,
//! espacios naturales protegidos, montes públicos, vías pecuarias o clases de
//! planeamiento.
//!
//! ## Características
//!
//! - Solape vectorial exacto con desglose por clase de afección
//! - Estimación por muestreo raster para capas sin vectorial
//! - Reproyección en Rust puro entre los CRS catastrales españoles
//!   (ETRS89/UTM 28N-31N, geográficas, Web Mercator)
//! - Informe agregado determinista listo para serializar
//!
//! ## Uso
//!
//! ```rust,ignore
//! use afecciones::{generar_informe, Cargador, Leyenda, ResolutorEstilos};
//!
//! let cargador = Cargador::new();
//! let parcela = cargador.cargar_parcela(&fuente_parcela, "30016A00100023")?;
//! let capas = vec![
//!     cargador.cargar_capa(&fuente_inundable, "Zona Inundable")?,
//!     cargador.cargar_capa(&fuente_natural, "Espacio Natural")?,
//! ];
//!
//! let resolutor = ResolutorEstilos::new(Leyenda::desde_csv(leyenda_csv)?);
//! let informe = generar_informe(&parcela, &capas, &resolutor);
//! println!("afección total: {}%", informe.total);
//! ```

pub mod error;
pub mod estilo;
pub mod geojson;
pub mod loader;
pub mod overlay;
pub mod raster;
pub mod report;
pub mod reproject;
pub mod types;

pub use error::AfeccionError;
pub use estilo::{Estilo, FilaLeyenda, Leyenda, ResolutorEstilos, CLASE_GENERAL};
pub use loader::{limpiar_referencia, Cargador, EPSG_CALCULO_DEFECTO};
pub use overlay::{analizar, ClaseAfectada, ResultadoCapa, UMBRAL_MATERIALIDAD_PCT};
pub use raster::{estimar, estimar_capa, EstimacionRaster, UMBRAL_INTENSIDAD_DEFECTO};
pub use report::{agregar, DetalleCapa, InformeAfecciones, ResultadoAnalisis};
pub use reproject::Reprojector;
pub use types::{Capa, Feature, FeatureCapa, Parcela, RasterTile, VectorSource};

use report::ResultadoAnalisis as Resultado;

/// Analiza todas las capas sobre una parcela y agrega el informe final
///
/// Un fallo al analizar una capa concreta no aborta el informe: se clasifica
/// como capa no disponible, con el motivo, y el resto sigue adelante.
pub fn generar_informe(
    parcela: &Parcela,
    capas: &[Capa],
    resolutor: &ResolutorEstilos,
) -> InformeAfecciones {
    let resultados = capas
        .iter()
        .map(|capa| {
            let estilo = resolutor.resolver(&capa.nombre);
            let resultado = match overlay::analizar(parcela, capa, &estilo) {
                Ok(r) => Resultado::Vectorial(r),
                Err(e) => {
                    let error =
                        AfeccionError::layer_unavailable(capa.nombre.as_str(), e.to_string());
                    Resultado::NoDisponible {
                        motivo: error.to_string(),
                    }
                }
            };
            (capa.nombre.clone(), resultado)
        })
        .collect();

    report::agregar(parcela, resultados)
}
