//! Conversión de GeoJSON decodificado a fuentes vectoriales
//!
//! Las fuentes oficiales entregan FeatureCollection con un miembro `crs` en
//! la convención `urn:ogc:def:crs:EPSG::25830`; el estándar moderno lo omite
//! (implica WGS84). Aquí se acepta cualquiera de las dos formas y se deja la
//! política de CRS ausente al cargador.

use std::collections::HashMap;

use geo::Geometry;
use serde_json::Value;

use crate::types::{Feature, VectorSource};
use crate::AfeccionError;

/// Convierte una FeatureCollection en una fuente vectorial
///
/// Las features sin geometría se descartan; una geometría no convertible es
/// un error de la fuente, no un descarte silencioso. Los valores de las
/// propiedades se aplanan a texto para la clasificación.
pub fn desde_feature_collection(
    fc: &geojson::FeatureCollection,
) -> Result<VectorSource, AfeccionError> {
    let epsg = extraer_epsg(fc);

    let mut features = Vec::with_capacity(fc.features.len());
    for f in &fc.features {
        let geom = match &f.geometry {
            Some(g) => g,
            None => continue,
        };
        let geometry: Geometry<f64> = geom.try_into().map_err(|e: geojson::Error| {
            AfeccionError::invalid_geometry(
                f.id
                    .as_ref()
                    .map(|id| format!("{id:?}"))
                    .unwrap_or_else(|| "sin id".to_string()),
                e.to_string(),
            )
        })?;

        features.push(Feature {
            geometry,
            properties: aplanar_propiedades(f.properties.as_ref()),
        });
    }

    Ok(VectorSource::new(features, epsg))
}

/// Parsea texto GeoJSON y lo convierte en fuente vectorial
pub fn desde_texto(texto: &str) -> Result<VectorSource, AfeccionError> {
    let fc: geojson::FeatureCollection = texto
        .parse()
        .map_err(|e: geojson::Error| AfeccionError::invalid_geometry("colección", e.to_string()))?;
    desde_feature_collection(&fc)
}

/// Lee el EPSG del miembro `crs` heredado, si está presente
fn extraer_epsg(fc: &geojson::FeatureCollection) -> Option<u32> {
    let nombre = fc
        .foreign_members
        .as_ref()?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    parsear_crs(nombre)
}

/// Acepta `urn:ogc:def:crs:EPSG::25830`, `EPSG:25830` y el CRS84 del estándar
fn parsear_crs(nombre: &str) -> Option<u32> {
    if nombre.eq_ignore_ascii_case("urn:ogc:def:crs:OGC:1.3:CRS84") {
        return Some(4326);
    }
    let codigo = nombre.rsplit(':').next()?;
    codigo.parse().ok()
}

/// Aplana las propiedades JSON a pares de texto
///
/// Los códigos de clasificación llegan como cadena o como número según la
/// fuente; ambos deben comparar igual contra la leyenda.
fn aplanar_propiedades(props: Option<&serde_json::Map<String, Value>>) -> HashMap<String, String> {
    let mut mapa = HashMap::new();
    if let Some(props) = props {
        for (clave, valor) in props {
            let texto = match valor {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                otro => otro.to_string(),
            };
            mapa.insert(clave.clone(), texto);
        }
    }
    mapa
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLECCION: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::25830" } },
        "features": [
            {
                "type": "Feature",
                "properties": { "tipo": "T100", "nivel": 3, "nota": null },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [660000.0, 4200000.0],
                        [660100.0, 4200000.0],
                        [660100.0, 4200100.0],
                        [660000.0, 4200100.0],
                        [660000.0, 4200000.0]
                    ]]
                }
            }
        ]
    }"#;

    #[test]
    fn test_desde_texto_con_crs() {
        let fuente = desde_texto(COLECCION).unwrap();
        assert_eq!(fuente.epsg, Some(25830));
        assert_eq!(fuente.features.len(), 1);

        let props = &fuente.features[0].properties;
        assert_eq!(props.get("tipo").map(String::as_str), Some("T100"));
        // Los números se aplanan a texto
        assert_eq!(props.get("nivel").map(String::as_str), Some("3"));
        // Los nulos se omiten
        assert!(!props.contains_key("nota"));
    }

    #[test]
    fn test_sin_crs() {
        let texto = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "Point",
                        "coordinates": [0.0, 0.0]
                    }
                }
            ]
        }"#;
        let fuente = desde_texto(texto).unwrap();
        assert_eq!(fuente.epsg, None);
        assert_eq!(fuente.features.len(), 1);
    }

    #[test]
    fn test_feature_sin_geometria_se_descarta() {
        let texto = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        }"#;
        let fuente = desde_texto(texto).unwrap();
        assert!(fuente.features.is_empty());
    }

    #[test]
    fn test_parsear_crs() {
        assert_eq!(parsear_crs("urn:ogc:def:crs:EPSG::25830"), Some(25830));
        assert_eq!(parsear_crs("EPSG:4326"), Some(4326));
        assert_eq!(parsear_crs("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(4326));
        assert_eq!(parsear_crs("lo que sea"), None);
    }

    #[test]
    fn test_texto_invalido() {
        assert!(desde_texto("{").is_err());
    }
}
