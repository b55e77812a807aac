//! Embedded fallback rule engine.
//!
//! The in-process counterpart of a locally-reachable diagnosis service:
//! normalizes symptom labels to canonical English keys, applies simple
//! primary-care rules for the primary diagnosis, differentials, and
//! treatment, screens vitals for red flags, and attaches guideline
//! snippets ranked by keyword overlap.

use serde::Deserialize;

use crate::models::enums::Language;
use crate::models::{
    DifferentialDiagnosis, KnowledgeSnippet, TreatmentMedication, TreatmentProtocol, VitalSigns,
};

use super::{AnalysisRequest, BackendDiagnosis, BackendError, DiagnosisBackend};

/// Red-flag thresholds over vitals.
const RED_FLAG_TEMPERATURE_F: f64 = 103.0;
const RED_FLAG_MIN_SPO2: f64 = 90.0;
const RED_FLAG_MIN_SYSTOLIC: u32 = 90;
const RED_FLAG_MIN_DIASTOLIC: u32 = 60;

/// Snippet ranking: top 3 with at least one keyword hit.
const SNIPPET_TOP_K: usize = 3;
const SNIPPET_MIN_SCORE: f64 = 1.0;

/// English labels and synonyms, mapped to canonical keys.
const SYMPTOMS_EN: &[(&str, &str)] = &[
    ("fever", "fever"),
    ("cough", "cough"),
    ("headache", "headache"),
    ("body ache", "body ache"),
    ("bodyache", "body ache"),
    ("body pain", "body ache"),
    ("nausea", "nausea"),
    ("vomiting", "vomiting"),
    ("diarrhea", "diarrhea"),
    ("loose stools", "diarrhea"),
    ("stomach pain", "abdominal pain"),
    ("abdominal pain", "abdominal pain"),
    ("chest pain", "chest pain"),
    ("shortness of breath", "shortness of breath"),
    ("breathlessness", "shortness of breath"),
    ("fatigue", "fatigue"),
    ("tiredness", "fatigue"),
    ("dizziness", "dizziness"),
    ("giddiness", "dizziness"),
    ("rash", "rash"),
    ("skin rash", "rash"),
    ("sore throat", "sore throat"),
    ("throat pain", "sore throat"),
    ("runny nose", "runny nose"),
    ("cold", "runny nose"),
];

const SYMPTOMS_HI: &[(&str, &str)] = &[
    ("बुखार", "fever"),
    ("खांसी", "cough"),
    ("सिरदर्द", "headache"),
    ("शरीर दर्द", "body ache"),
    ("मतली", "nausea"),
    ("उल्टी", "vomiting"),
    ("दस्त", "diarrhea"),
    ("पेट दर्द", "abdominal pain"),
    ("सीने में दर्द", "chest pain"),
    ("सांस की तकलीफ", "shortness of breath"),
    ("थकान", "fatigue"),
    ("चक्कर आना", "dizziness"),
    ("चकत्ते", "rash"),
    ("गले में खराश", "sore throat"),
    ("बहती नाक", "runny nose"),
];

const SYMPTOMS_TA: &[(&str, &str)] = &[
    ("காய்ச்சல்", "fever"),
    ("இருமல்", "cough"),
    ("தலைவலி", "headache"),
    ("உடல் வலி", "body ache"),
    ("குமட்டல்", "nausea"),
    ("வாந்தி", "vomiting"),
    ("வயிற்றுப்போக்கு", "diarrhea"),
    ("வயிற்று வலி", "abdominal pain"),
    ("மார்பு வலி", "chest pain"),
    ("மூச்சுத் திணறல்", "shortness of breath"),
    ("சோர்வு", "fatigue"),
    ("தலைச்சுற்றல்", "dizziness"),
    ("தடிப்பு", "rash"),
    ("தொண்டை வலி", "sore throat"),
    ("மூக்கு ஒழுகுதல்", "runny nose"),
];

const SYMPTOMS_TE: &[(&str, &str)] = &[
    ("జ్వరం", "fever"),
    ("దగ్గు", "cough"),
    ("తలనొప్పి", "headache"),
    ("శరీర నొప్పి", "body ache"),
    ("వికారం", "nausea"),
    ("వాంతులు", "vomiting"),
    ("విరేచనాలు", "diarrhea"),
    ("పొట్ట నొప్పి", "abdominal pain"),
    ("ఛాతీ నొప్పి", "chest pain"),
    ("ఊపిరి పీల్చుకోవడంలో ఇబ్బంది", "shortness of breath"),
    ("అలసట", "fatigue"),
    ("తలతిరగడం", "dizziness"),
    ("దద్దుర్లు", "rash"),
    ("గొంతు నొప్పి", "sore throat"),
    ("ముక్కు కారడం", "runny nose"),
];

const SYMPTOMS_BN: &[(&str, &str)] = &[
    ("জ্বর", "fever"),
    ("কাশি", "cough"),
    ("মাথাব্যথা", "headache"),
    ("শরীর ব্যথা", "body ache"),
    ("বমি বমি ভাব", "nausea"),
    ("বমি", "vomiting"),
    ("ডায়রিয়া", "diarrhea"),
    ("পেট ব্যথা", "abdominal pain"),
    ("বুকে ব্যথা", "chest pain"),
    ("শ্বাসকষ্ট", "shortness of breath"),
    ("ক্লান্তি", "fatigue"),
    ("মাথা ঘোরা", "dizziness"),
    ("ফুসকুড়ি", "rash"),
    ("গলা ব্যথা", "sore throat"),
    ("নাক দিয়ে পানি পড়া", "runny nose"),
];

/// Canonical symptom to primary-diagnosis text; first match wins.
const PRIMARY_RULES: &[(&str, &str)] = &[
    ("fever", "Acute febrile illness (likely viral)"),
    ("cough", "Acute respiratory infection"),
    ("shortness of breath", "Possible lower respiratory involvement"),
    (
        "chest pain",
        "Non-specific chest pain, evaluate cardiac and respiratory causes",
    ),
    ("diarrhea", "Acute gastro-intestinal infection"),
    ("abdominal pain", "Non-specific abdominal pain"),
    ("headache", "Acute headache, likely tension or viral"),
    ("rash", "Non-specific skin eruption"),
    ("fatigue", "Non-specific fatigue"),
    ("dizziness", "Non-specific dizziness or presyncope"),
];

const GUIDELINES_JSON: &str = include_str!("../../resources/guidelines.json");

#[derive(Debug, Clone, Deserialize)]
struct Guideline {
    id: String,
    title: String,
    content: String,
    source: Option<String>,
}

pub struct RuleEngine {
    guidelines: Vec<Guideline>,
}

impl RuleEngine {
    pub fn new() -> Self {
        let guidelines: Vec<Guideline> =
            serde_json::from_str(GUIDELINES_JSON).expect("embedded guidelines are valid JSON");
        Self { guidelines }
    }

    /// Map a visible symptom label into a canonical English key.
    ///
    /// Unknown labels pass through lowercased so the caller still has
    /// something to show; non-English lookups fall back to the English
    /// synonym table (forms sometimes mix languages).
    pub fn normalize_symptom(symptom: &str, language: Language) -> String {
        let label = symptom.trim().to_lowercase();

        let table = match language {
            Language::En => SYMPTOMS_EN,
            Language::Hi => SYMPTOMS_HI,
            Language::Ta => SYMPTOMS_TA,
            Language::Te => SYMPTOMS_TE,
            Language::Bn => SYMPTOMS_BN,
        };
        if let Some((_, canonical)) = table.iter().find(|(l, _)| *l == label) {
            return canonical.to_string();
        }
        if language != Language::En {
            if let Some((_, canonical)) = SYMPTOMS_EN.iter().find(|(l, _)| *l == label) {
                return canonical.to_string();
            }
        }
        label
    }

    pub fn normalize_symptoms(symptoms: &[String], language: Language) -> Vec<String> {
        symptoms
            .iter()
            .map(|s| Self::normalize_symptom(s, language))
            .collect()
    }

    fn infer_primary(canonical: &[String]) -> String {
        for symptom in canonical {
            if let Some((_, primary)) = PRIMARY_RULES.iter().find(|(key, _)| key == symptom) {
                return primary.to_string();
            }
        }
        match canonical.first() {
            Some(first) => format!("Non-specific illness ({first})"),
            None => "Non-specific illness".to_string(),
        }
    }

    /// Screen vitals for findings that force a referral.
    fn check_red_flags(vitals: Option<&VitalSigns>) -> Option<String> {
        let vitals = vitals?;

        if vitals
            .temperature
            .is_some_and(|t| t >= RED_FLAG_TEMPERATURE_F)
        {
            return Some("High fever; urgent evaluation needed.".to_string());
        }
        if vitals
            .oxygen_saturation
            .is_some_and(|s| s < RED_FLAG_MIN_SPO2)
        {
            return Some("Low oxygen saturation; risk of respiratory distress.".to_string());
        }
        if let Some((sys, dia)) = vitals.parsed_blood_pressure() {
            if sys < RED_FLAG_MIN_SYSTOLIC || dia < RED_FLAG_MIN_DIASTOLIC {
                return Some("Very low blood pressure; risk of shock.".to_string());
            }
        }

        None
    }

    fn build_differentials(primary: &str, canonical: &[String]) -> Vec<DifferentialDiagnosis> {
        if canonical.iter().any(|s| s == "fever") {
            return vec![
                DifferentialDiagnosis {
                    condition: "Viral infection".into(),
                    confidence: 70,
                    reasoning: Some("Common with simple fever in primary care.".into()),
                },
                DifferentialDiagnosis {
                    condition: "Bacterial infection".into(),
                    confidence: 30,
                    reasoning: Some(
                        "Consider if fever is persistent, very high, or focal.".into(),
                    ),
                },
            ];
        }

        vec![
            DifferentialDiagnosis {
                condition: primary.to_string(),
                confidence: 60,
                reasoning: Some("Most likely explanation based on available symptoms.".into()),
            },
            DifferentialDiagnosis {
                condition: "Other non-specific causes".into(),
                confidence: 40,
                reasoning: Some("Symptoms are non-specific; monitor and review.".into()),
            },
        ]
    }

    fn build_treatment(canonical: &[String], red_flag: bool) -> TreatmentProtocol {
        let mut protocol = TreatmentProtocol::default();
        let has = |key: &str| canonical.iter().any(|s| s == key);

        if has("fever") {
            protocol.medications.push(TreatmentMedication {
                name: "Paracetamol (generic)".into(),
                dosage: "Dose as per local protocol".into(),
                frequency: "As needed for fever (respect max daily dose)".into(),
                duration: "Usually 2-3 days, reassess if persistent".into(),
            });
            protocol
                .lifestyle
                .push("Encourage oral fluids and light clothing.".into());
            protocol.lifestyle.push("Advise rest and light diet.".into());
        }

        if has("cough") {
            protocol
                .lifestyle
                .push("Avoid smoke and irritants; warm fluids can help.".into());
        }

        if has("diarrhea") {
            protocol
                .lifestyle
                .push("Use oral rehydration solution as per local protocol.".into());
            protocol
                .lifestyle
                .push("Watch for signs of dehydration.".into());
        }

        if red_flag {
            protocol
                .procedures
                .push("Arrange urgent referral for higher-level evaluation.".into());
        }

        protocol.lifestyle.push(
            "Return if symptoms worsen, new red-flag signs appear, or recovery is delayed.".into(),
        );

        protocol
    }

    /// Keyword-overlap ranking of the embedded guideline set against the
    /// canonical symptoms and primary diagnosis.
    fn relevant_snippets(&self, canonical: &[String], primary: &str) -> Vec<KnowledgeSnippet> {
        let mut tokens: Vec<String> = canonical.iter().map(|s| s.to_lowercase()).collect();
        tokens.push(primary.to_lowercase());

        let mut scored: Vec<(f64, &Guideline)> = self
            .guidelines
            .iter()
            .map(|g| {
                let text = format!("{}. {}", g.title, g.content).to_lowercase();
                let hits = tokens
                    .iter()
                    .filter(|t| !t.is_empty() && text.contains(t.as_str()))
                    .count();
                (hits as f64, g)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(SNIPPET_TOP_K)
            .filter(|(score, _)| *score >= SNIPPET_MIN_SCORE)
            .map(|(score, g)| KnowledgeSnippet {
                id: g.id.clone(),
                title: g.title.clone(),
                content: g.content.clone(),
                source: g.source.clone(),
                score: Some(score),
            })
            .collect()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisBackend for RuleEngine {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<BackendDiagnosis, BackendError> {
        let canonical = Self::normalize_symptoms(&request.symptoms, request.language);

        let primary = Self::infer_primary(&canonical);
        let referral_reason = Self::check_red_flags(request.vital_signs.as_ref());
        let red_flag = referral_reason.is_some();

        let differentials = Self::build_differentials(&primary, &canonical);
        let treatment = Self::build_treatment(&canonical, red_flag);
        let snippets = self.relevant_snippets(&canonical, &primary);

        Ok(BackendDiagnosis {
            primary_diagnosis: primary,
            differential_diagnoses: differentials,
            treatment_protocol: Some(treatment),
            requires_referral: red_flag,
            referral_reason,
            knowledge_snippets: snippets,
        })
    }
}
