//! Reference data every store starts with.
//!
//! The Postgres migration inserts the same rows; keep both in step.

/// `(category_name, icon, subcategories)` in sort order.
pub const DEFAULT_CATEGORIES: &[(&str, &str, &[&str])] = &[
    ("Producción", "🎛️", &["Sonido", "Iluminación", "Escenario"]),
    ("Locación", "🏟️", &["Alquiler", "Limpieza", "Permisos"]),
    ("Marketing", "📣", &["Publicidad digital", "Impresos"]),
    ("Personal", "👥", &["Seguridad", "Staff", "Artistas"]),
    ("Logística", "🚚", &["Transporte", "Catering"]),
    ("Otros", "📦", &["Varios"]),
];
