//! Deterministic speech voice selection.
//!
//! Engines expose inconsistent catalogs, so selection walks a fixed ladder
//! of rules and returns the first match. The name lists are plain data in
//! [`VoiceTables`].

use crate::domain::Voice;

/// Static allow/deny tables consumed by [`VoiceSelector`]
#[derive(Debug, Clone)]
pub struct VoiceTables {
    /// Preferred locale (exact tag)
    pub locale: &'static str,

    /// Broader language subtag
    pub language: &'static str,

    /// Substrings marking a voice as female (matched case-insensitively
    /// against name and local name)
    pub female_names: &'static [&'static str],

    /// Words marking a voice as male (matched against whole words of the name)
    pub male_names: &'static [&'static str],

    /// Vendor-specific voices known to sound good: (vendor, voice names)
    pub vendor_voices: &'static [(&'static str, &'static [&'static str])],

    /// Vendor neural/enhanced voice families: (vendor, markers)
    pub neural_voices: &'static [(&'static str, &'static [&'static str])],
}

const FEMALE_NAMES: &[&str] = &[
    // Common Mexican names
    "Paulina", "Mónica", "Monica", "Esperanza", "Angelica", "Maria", "Carmen",
    "Pilar", "Conchita", "Lupe", "Ximena", "Helena", "Sabina", "Paloma",
    "Marisol", "Fernanda", "Alejandra", "Guadalupe", "Dulce", "Rocio",
    "Catarina", "Lucia", "Sofia", "Valentina", "Isabella", "Camila",
    "Valeria", "Natalia", "Mariana", "Paola", "Daniela", "Gabriela",
    "Victoria", "Jimena", "Andrea", "Raquel", "Beatriz", "Cristina",
    "Soledad", "Amparo", "Remedios", "Concepcion", "Encarnacion",
    // Vendor voice names
    "Elvira", "Ines", "Maite", "Kendra", "Aria", "Jenny",
    // Gender markers
    "Female", "Woman", "Mujer", "Femenina", "Lady", "Girl", "Chica",
    // International names common in TTS catalogs
    "Alice", "Emma", "Olivia", "Sophia", "Mia", "Charlotte", "Amelia",
    "Harper", "Evelyn", "Abigail", "Emily", "Ella", "Elizabeth", "Luna",
    "Avery", "Mila", "Scarlett",
];

const MALE_NAMES: &[&str] = &[
    "diego", "jorge", "carlos", "miguel", "antonio", "juan", "pablo",
    "ricardo", "fernando", "alejandro", "roberto", "eduardo", "manuel",
    "male", "masculino", "hombre", "man", "masculine", "boy", "guy",
];

/// Tables for Mexican Spanish announcements
pub const SPANISH_MX: VoiceTables = VoiceTables {
    locale: "es-MX",
    language: "es",
    female_names: FEMALE_NAMES,
    male_names: MALE_NAMES,
    vendor_voices: &[("Microsoft", &["Sabina", "Helena"])],
    neural_voices: &[("Google", &["Neural", "WaveNet"])],
};

/// Picks one voice from a platform catalog
#[derive(Debug, Clone)]
pub struct VoiceSelector {
    tables: VoiceTables,
}

impl Default for VoiceSelector {
    fn default() -> Self {
        Self::new(SPANISH_MX)
    }
}

impl VoiceSelector {
    pub fn new(tables: VoiceTables) -> Self {
        Self { tables }
    }

    /// Locale this selector prefers
    pub fn locale(&self) -> &'static str {
        self.tables.locale
    }

    /// Select the best voice, or `None` when the catalog is empty.
    ///
    /// Rules, first match wins:
    /// 1. locale match, female, not male
    /// 2. vendor-named voice in the locale
    /// 3. vendor neural/enhanced voice in the locale
    /// 4. locale match, not male
    /// 5. language match, not male
    /// 6. first voice
    pub fn select(&self, voices: &[Voice]) -> Option<Voice> {
        let t = &self.tables;
        let in_locale = |v: &Voice| v.matches_locale(t.locale);

        let rules: [&dyn Fn(&Voice) -> bool; 5] = [
            &|v: &Voice| in_locale(v) && self.is_female(v) && !self.is_male(v),
            &|v: &Voice| in_locale(v) && Self::vendor_match(v, t.vendor_voices),
            &|v: &Voice| in_locale(v) && Self::vendor_match(v, t.neural_voices),
            &|v: &Voice| in_locale(v) && !self.is_male(v),
            &|v: &Voice| v.matches_language(t.language) && !self.is_male(v),
        ];

        rules
            .iter()
            .find_map(|rule| voices.iter().find(|&v| rule(v)))
            .or_else(|| voices.first())
            .cloned()
    }

    fn is_female(&self, voice: &Voice) -> bool {
        let name = voice.name.to_lowercase();
        let local = voice.local_name.as_deref().unwrap_or_default().to_lowercase();
        self.tables.female_names.iter().any(|n| {
            let n = n.to_lowercase();
            name.contains(&n) || local.contains(&n)
        })
    }

    fn is_male(&self, voice: &Voice) -> bool {
        voice
            .name
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| self.tables.male_names.contains(&word))
    }

    fn vendor_match(voice: &Voice, table: &[(&str, &[&str])]) -> bool {
        table.iter().any(|(vendor, names)| {
            voice.name.contains(vendor) && names.iter().any(|n| voice.name.contains(n))
        })
    }
}
