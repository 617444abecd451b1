//! Static keyword lexicon for the three categorization dimensions.
//!
//! Phrases are lowercase Spanish fragments matched as plain substrings.
//! Declaration order matters: it decides which keywords a verdict reports
//! first.

use sentinsight_core::Dimension;

/// Which side of a dimension a phrase supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

/// Positive and negative phrase lists for one dimension.
#[derive(Debug, Clone, Copy)]
pub struct PhraseSet {
    pub positive: &'static [&'static str],
    pub negative: &'static [&'static str],
}

impl PhraseSet {
    pub fn phrases(&self, polarity: Polarity) -> &'static [&'static str] {
        match polarity {
            Polarity::Positive => self.positive,
            Polarity::Negative => self.negative,
        }
    }
}

/// Mapping `(dimension, polarity) → ordered phrases`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordLexicon {
    pub teaching_quality: PhraseSet,
    pub evaluation_method: PhraseSet,
    pub empathy: PhraseSet,
}

impl KeywordLexicon {
    pub fn phrase_set(&self, dimension: Dimension) -> &PhraseSet {
        match dimension {
            Dimension::TeachingQuality => &self.teaching_quality,
            Dimension::EvaluationMethod => &self.evaluation_method,
            Dimension::Empathy => &self.empathy,
        }
    }

    pub fn phrases(&self, dimension: Dimension, polarity: Polarity) -> &'static [&'static str] {
        self.phrase_set(dimension).phrases(polarity)
    }
}

/// Lexicon tuned for Spanish-language course reviews.
pub static SPANISH: KeywordLexicon = KeywordLexicon {
    teaching_quality: PhraseSet {
        positive: &[
            "explica bien",
            "domina",
            "claro",
            "enseña bien",
            "didáctico",
            "buen profesor",
            "excelente",
            "aprend",
            "entend",
            "conocimiento",
            "profesional",
            "preparado",
            "sabe",
            "materia",
            "ejemplos",
        ],
        negative: &[
            "no explica",
            "confuso",
            "desorganizado",
            "mal profesor",
            "no enseña",
            "aburrido",
            "monótono",
            "no se entiende",
            "perdido",
            "no domina",
            "improvisado",
        ],
    },
    evaluation_method: PhraseSet {
        positive: &[
            "justo",
            "fair",
            "razonable",
            "equilibrado",
            "bien evaluado",
            "examenes justos",
            "calificación justa",
            "objetivo",
            "clara evaluación",
            "criterios claros",
        ],
        negative: &[
            "difícil",
            "exigente",
            "reprobar",
            "injusto",
            "arbitrario",
            "exámenes imposibles",
            "mucha tarea",
            "carga excesiva",
            "evalúa mal",
            "subjetivo",
            "estricto",
            "duro",
        ],
    },
    empathy: PhraseSet {
        positive: &[
            "comprensivo",
            "accesible",
            "ayuda",
            "amable",
            "paciente",
            "disponible",
            "empático",
            "buena persona",
            "resuelve dudas",
            "atento",
            "flexible",
            "humano",
            "considerado",
        ],
        negative: &[
            "grosero",
            "déspo ta",
            "inaccesible",
            "no ayuda",
            "antipático",
            "prepotente",
            "soberbio",
            "no resuelve dudas",
            "inflexible",
            "no le importa",
            "arrogante",
            "mal trato",
        ],
    },
};
