use drill_core::model::{BandFact, BandTopic, Fact, FactDetail, FactId};

/// A rendered question, detached from the session so the prompt can block
/// without holding the session lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub fact_id: FactId,
    pub text: String,
}

impl Question {
    #[must_use]
    pub fn for_fact(fact: &Fact) -> Self {
        Self {
            fact_id: fact.id().clone(),
            text: render(fact),
        }
    }
}

fn render(fact: &Fact) -> String {
    match fact.detail() {
        FactDetail::Prefix { .. } => format!("Which country has the prefix {}? ", fact.id()),
        FactDetail::CountryPrefixes { country, .. } => {
            format!("Which prefixes belong to {country}? ")
        }
        FactDetail::Band(band) => render_band(band),
    }
}

/// Score report section a fact is counted in; band facts only count in the
/// total.
#[must_use]
pub fn score_section(fact: &Fact) -> Option<&'static str> {
    match fact.detail() {
        FactDetail::Prefix { .. } => Some("Prefixes -> countries"),
        FactDetail::CountryPrefixes { .. } => Some("Countries -> prefixes"),
        FactDetail::Band(_) => None,
    }
}

fn render_band(band: &BandFact) -> String {
    let class = band.class.as_deref().unwrap_or("any");
    match band.topic {
        BandTopic::Range => format!("frequency range of {} band? ", band.band),
        BandTopic::Power => format!(
            "maximum power for class {class} on {} ({})? ",
            band.band, band.range
        ),
        BandTopic::Bandwidth => format!(
            "maximum bandwidth for class {class} on {} ({})? ",
            band.band, band.range
        ),
    }
}

/// Feedback printed after an answer is scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub expected: String,
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.correct {
            writeln!(f, "correct!")
        } else {
            writeln!(f, "incorrect. the correct answer was:\n  {}", self.expected)
        }
    }
}
