use grocery_storefront_api::slug::normalize;

#[test]
fn strips_accents_and_joins_words() {
    assert_eq!(normalize("Lácteos y Huevos"), "lacteos-y-huevos");
    assert_eq!(normalize("Panadería"), "panaderia");
    assert_eq!(normalize("Piñas & Pingüinos"), "pinas-pinguinos");
}

#[test]
fn case_and_spacing_do_not_matter() {
    let canonical = normalize("Lácteos y Huevos");
    assert_eq!(normalize("LACTEOS y huevos"), canonical);
    assert_eq!(normalize("  lacteos   y   HUEVOS  "), canonical);
    assert_eq!(normalize("lacteos-y-huevos"), canonical);
}

#[test]
fn keeps_digits() {
    assert_eq!(normalize("Aceite 1L"), "aceite-1l");
}

#[test]
fn nothing_usable_yields_empty() {
    assert_eq!(normalize("¡¿ ~ ?!"), "");
}
