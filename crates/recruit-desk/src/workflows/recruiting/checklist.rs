//! Maps recognized document text onto checklist labels.

/// Substring rules, checked in order. Needles are lowercase.
const LABEL_RULES: &[(&str, &[&str])] = &[
    ("Birth Certificate", &["birth certificate", "certificate of live birth"]),
    ("Social Security Card", &["social security", "ssn"]),
    ("Driver's License", &["driver license", "driver's license", "drivers license"]),
    ("Passport", &["passport"]),
    (
        "Diploma / Transcript",
        &["diploma", "transcript", "general educational development"],
    ),
    ("DD-214", &["dd-214", "dd214", "certificate of release or discharge"]),
    ("Medical Records", &["medical record", "prescription", "immunization"]),
    ("Court Documents", &["court", "citation", "disposition"]),
    ("Marriage Certificate", &["marriage"]),
];

/// Returns deduplicated checklist labels whose needles appear in `text`, in rule order.
pub fn suggest_labels(text: &str) -> Vec<&'static str> {
    let haystack = text.to_lowercase();
    LABEL_RULES
        .iter()
        .filter(|(_, needles)| needles.iter().any(|needle| haystack.contains(needle)))
        .map(|(label, _)| *label)
        .collect()
}
