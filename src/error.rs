//! Tipos de error del motor de afecciones
//!
//! "Sin afección detectada" nunca es un error: es un resultado geométrico
//! válido. Los errores cubren entradas inutilizables (geometría vacía, área
//! nula, CRS no soportado) y capas ausentes.

use thiserror::Error;

/// Errores que pueden surgir durante el análisis de afecciones
#[derive(Debug, Error)]
pub enum AfeccionError {
    /// Fuente de geometría vacía o sin polígonos utilizables
    #[error("Empty geometry source: {0}")]
    EmptyGeometry(String),

    /// Geometría inválida
    #[error("Invalid geometry for {id}: {reason}")]
    InvalidGeometry { id: String, reason: String },

    /// Área de parcela nula o negativa (distinto de "afección cero")
    #[error("Invalid parcel area for {referencia}: {area_m2} m²")]
    InvalidArea { referencia: String, area_m2: f64 },

    /// CRS no soportado por el reproyector
    #[error("Unsupported CRS: EPSG:{0}")]
    UnsupportedCrs(u32),

    /// CRS de cálculo geográfico: las áreas en grados no tienen sentido
    #[error("EPSG:{0} is geographic; areas must be computed in a projected CRS")]
    GeographicCalculationCrs(u32),

    /// Capa regulatoria ausente o ilegible
    #[error("Layer unavailable: {nombre}: {motivo}")]
    LayerUnavailable { nombre: String, motivo: String },

    /// Tabla de leyenda ilegible
    #[error("Invalid legend table: {0}")]
    InvalidLegend(String),

    /// Referencia catastral mal formada
    #[error("Invalid cadastral reference: {0}")]
    InvalidReference(String),

    /// Tile raster inconsistente con sus dimensiones
    #[error("Invalid raster tile: {0}")]
    InvalidRaster(String),
}

impl AfeccionError {
    /// Crea un error de geometría inválida con contexto
    pub fn invalid_geometry(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Crea un error de capa no disponible
    pub fn layer_unavailable(nombre: impl Into<String>, motivo: impl Into<String>) -> Self {
        Self::LayerUnavailable {
            nombre: nombre.into(),
            motivo: motivo.into(),
        }
    }
}
