//! Resolución de estilos de clasificación por capa
//!
//! La leyenda es una tabla (capa, campo, código, etiqueta, color) que entrega
//! el colaborador de configuración, habitualmente como CSV junto a las capas.
//! El estilo de cada capa se resuelve una sola vez y queda cacheado para toda
//! la vida del proceso; las entradas son inmutables tras su inserción.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::debug;

use crate::AfeccionError;

/// Etiqueta del grupo único cuando la capa no define campo de clasificación
pub const CLASE_GENERAL: &str = "General";

/// Estilo de clasificación de una capa
#[derive(Debug, Clone, Default)]
pub struct Estilo {
    /// Atributo de las features usado para clasificar; `None` = grupo único
    pub campo: Option<String>,

    /// Código -> etiqueta legible
    pub etiquetas: HashMap<String, String>,

    /// Código -> color (para el renderizado de mapas, aguas abajo)
    pub colores: HashMap<String, String>,
}

impl Estilo {
    /// Estilo por defecto: sin campo, todo cae en el grupo "General"
    pub fn general() -> Self {
        Self::default()
    }

    /// Etiqueta de un código, con el código crudo como respaldo
    ///
    /// Nunca falla por un código sin mapear: las capas oficiales estrenan
    /// códigos sin avisar.
    pub fn etiqueta(&self, codigo: &str) -> String {
        self.etiquetas
            .get(codigo)
            .cloned()
            .unwrap_or_else(|| codigo.to_string())
    }
}

/// Fila de la tabla de leyenda
#[derive(Debug, Clone, Deserialize)]
pub struct FilaLeyenda {
    /// Nombre de la capa a la que aplica
    pub capa: String,

    /// Campo de clasificación de la capa
    pub campo: Option<String>,

    /// Código tal y como aparece en las features
    pub codigo: String,

    /// Etiqueta legible
    pub etiqueta: String,

    /// Color asociado (opcional)
    pub color: Option<String>,
}

/// Tabla de leyenda indexada por nombre de capa normalizado
#[derive(Debug, Clone, Default)]
pub struct Leyenda {
    filas: HashMap<String, Vec<FilaLeyenda>>,
}

impl Leyenda {
    /// Construye la leyenda desde filas ya decodificadas
    pub fn new(filas: Vec<FilaLeyenda>) -> Self {
        let mut indice: HashMap<String, Vec<FilaLeyenda>> = HashMap::new();
        for fila in filas {
            indice
                .entry(normalizar(&fila.capa))
                .or_default()
                .push(fila);
        }
        Self { filas: indice }
    }

    /// Lee la leyenda desde un CSV con cabecera `capa,campo,codigo,etiqueta,color`
    pub fn desde_csv<R: Read>(reader: R) -> Result<Self, AfeccionError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut filas = Vec::new();
        for resultado in rdr.deserialize::<FilaLeyenda>() {
            let fila = resultado.map_err(|e| AfeccionError::InvalidLegend(e.to_string()))?;
            filas.push(fila);
        }
        Ok(Self::new(filas))
    }

    fn estilo_para(&self, clave: &str) -> Option<Estilo> {
        let filas = self.filas.get(clave)?;

        // El campo de clasificación es único por capa: manda la primera fila
        let campo = filas.iter().find_map(|f| f.campo.clone());
        let mut etiquetas = HashMap::new();
        let mut colores = HashMap::new();
        for fila in filas {
            etiquetas.insert(fila.codigo.clone(), fila.etiqueta.clone());
            if let Some(color) = &fila.color {
                colores.insert(fila.codigo.clone(), color.clone());
            }
        }

        Some(Estilo {
            campo,
            etiquetas,
            colores,
        })
    }
}

/// Resuelve y cachea el estilo de cada capa
///
/// Seguro para lecturas concurrentes; cada clave se puebla como mucho una
/// vez gracias a la doble comprobación bajo el lock de escritura.
pub struct ResolutorEstilos {
    leyenda: Leyenda,
    cache: RwLock<HashMap<String, Arc<Estilo>>>,
}

impl ResolutorEstilos {
    pub fn new(leyenda: Leyenda) -> Self {
        Self {
            leyenda,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resuelve el estilo de una capa por nombre (insensible a mayúsculas)
    ///
    /// Sin entrada en la leyenda devuelve el estilo por defecto: ausencia de
    /// configuración no es un error.
    pub fn resolver(&self, nombre_capa: &str) -> Arc<Estilo> {
        let clave = normalizar(nombre_capa);

        if let Some(estilo) = self.cache.read().expect("cache envenenada").get(&clave) {
            return Arc::clone(estilo);
        }

        let mut cache = self.cache.write().expect("cache envenenada");
        // Otro hilo puede haber poblado la clave entre la lectura y aquí
        if let Some(estilo) = cache.get(&clave) {
            return Arc::clone(estilo);
        }

        let estilo = Arc::new(self.leyenda.estilo_para(&clave).unwrap_or_else(|| {
            debug!(capa = nombre_capa, "capa sin leyenda, estilo por defecto");
            Estilo::general()
        }));
        cache.insert(clave, Arc::clone(&estilo));
        estilo
    }
}

/// Clave de búsqueda: sin espacios sobrantes y en minúsculas
fn normalizar(nombre: &str) -> String {
    nombre.trim().to_lowercase()
}
