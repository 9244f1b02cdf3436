//! Reference lists offered by the registration and request forms

/// The 26 provinces of the DRC.
pub const PROVINCES: &[&str] = &[
    "Kinshasa",
    "Kongo Central",
    "Kwango",
    "Kwilu",
    "Mai-Ndombe",
    "Kasaï",
    "Kasaï Central",
    "Kasaï Oriental",
    "Lomami",
    "Sankuru",
    "Maniema",
    "Sud-Kivu",
    "Nord-Kivu",
    "Tanganyika",
    "Haut-Lomami",
    "Lualaba",
    "Haut-Katanga",
    "Ituri",
    "Tshopo",
    "Bas-Uele",
    "Haut-Uele",
    "Mongala",
    "Nord-Ubangi",
    "Sud-Ubangi",
    "Équateur",
    "Tshuapa",
];

/// Main cities per province, keyed by province name.
pub const CITIES: &[(&str, &[&str])] = &[
    ("Kinshasa", &["Kinshasa"]),
    ("Kongo Central", &["Matadi", "Boma", "Mbanza-Ngungu"]),
    ("Kwango", &["Kenge"]),
    ("Kwilu", &["Bandundu", "Kikwit"]),
    ("Mai-Ndombe", &["Inongo"]),
    ("Kasaï", &["Tshikapa"]),
    ("Kasaï Central", &["Kananga"]),
    ("Kasaï Oriental", &["Mbuji-Mayi"]),
    ("Lomami", &["Kabinda", "Mwene-Ditu"]),
    ("Sankuru", &["Lusambo"]),
    ("Maniema", &["Kindu"]),
    ("Sud-Kivu", &["Bukavu", "Uvira"]),
    ("Nord-Kivu", &["Goma", "Butembo", "Beni"]),
    ("Tanganyika", &["Kalemie"]),
    ("Haut-Lomami", &["Kamina"]),
    ("Lualaba", &["Kolwezi"]),
    ("Haut-Katanga", &["Lubumbashi", "Likasi"]),
    ("Ituri", &["Bunia"]),
    ("Tshopo", &["Kisangani"]),
    ("Bas-Uele", &["Buta"]),
    ("Haut-Uele", &["Isiro"]),
    ("Mongala", &["Lisala"]),
    ("Nord-Ubangi", &["Gbadolite"]),
    ("Sud-Ubangi", &["Gemena"]),
    ("Équateur", &["Mbandaka"]),
    ("Tshuapa", &["Boende"]),
];

/// Ministry directorates that issue certificates.
pub const ISSUING_AUTHORITIES: &[&str] = &[
    "Direction des Services Généraux et du Personnel",
    "Direction des Titres Immobiliers",
    "Direction du Cadastre Foncier",
    "Direction du Contentieux Foncier et Immobilier",
    "Direction de l'École Nationale du Cadastre et des Titres Immobiliers",
    "Direction des Études et Planifications",
    "Direction de l'Inspection",
    "Direction du Cadastre Fiscal",
    "Direction des Fonds de Promotion",
    "Direction des Biens sans Maître",
];

/// Documents a citizen may request.
pub const REQUEST_DOCUMENT_TYPES: &[&str] = &[
    "Copie du titre foncier",
    "Certificat d’enregistrement",
    "Attestation de propriété",
    "Extrait du registre foncier",
    "Copie du plan cadastral",
    "Certificat de situation juridique",
    "Attestation de non-litige",
    "Historique des litiges sur une parcelle",
    "Copie de décision administrative foncière",
    "Certificat de mutation",
    "Attestation de bornage",
    "PV de bornage",
    "Autre",
];

/// Kinds of files attached to a parcel.
pub const DOCUMENT_KINDS: &[&str] = &[
    "Titre foncier",
    "Certificat d'enregistrement",
    "PV de bornage",
    "Plan cadastral",
    "Acte de vente",
    "Pièce d'identité",
    "Autre",
];

/// Cities listed for a province, empty for unknown names.
pub fn cities_of(province: &str) -> &'static [&'static str] {
    CITIES
        .iter()
        .find(|(name, _)| *name == province)
        .map(|(_, cities)| *cities)
        .unwrap_or(&[])
}

pub fn is_known_province(name: &str) -> bool {
    PROVINCES.contains(&name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_province_has_cities() {
        assert_eq!(PROVINCES.len(), 26);
        assert_eq!(CITIES.len(), PROVINCES.len());
        for province in PROVINCES {
            assert!(!cities_of(province).is_empty(), "{province} has no city");
        }
    }

    #[test]
    fn test_unknown_province_has_no_cities() {
        assert!(cities_of("Atlantide").is_empty());
        assert!(!is_known_province("Atlantide"));
        assert!(is_known_province(" Lualaba "));
    }
}
