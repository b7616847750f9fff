//! Definiciones de elipsoides

/// Elipsoide WGS84
pub struct WGS84;

impl WGS84 {
    /// Semieje mayor (radio ecuatorial) en metros
    pub const A: f64 = 6378137.0;
}

/// Elipsoide GRS80 (usado por ETRS89, el datum oficial español)
/// Nota: casi idéntico a WGS84, diferencia < 0.1mm
pub struct GRS80;

impl GRS80 {
    pub const A: f64 = 6378137.0;
    pub const F: f64 = 1.0 / 298.257222101;
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;
    pub const E: f64 = 0.0818191910428158; // sqrt(E2)
    pub const EP2: f64 = Self::E2 / (1.0 - Self::E2);
}
