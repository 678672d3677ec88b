use serde::{Deserialize, Serialize};

/// Lowest accepted band. The rubric scores 1–9, but band 0 is let through
/// for empty or non-attempted answers.
pub const MIN_MARK: f32 = 0.0;
/// Highest band the external rubric hands out.
pub const MAX_MARK: f32 = 9.0;

/// One alternative wording returned by the revision service.
///
/// `markup` is the raw HTML fragment with deletion/insertion spans; see
/// `parsing::diff_markup` for turning it into displayable segments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RevisedSentence {
    pub markup: String,
    pub mark: f32,
}

/// A fully well-formed critique of one translation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Revision {
    /// Score of the user's own translation.
    pub mark: f32,
    pub revised: Vec<RevisedSentence>,
}

impl Revision {
    /// Score of the first revised sentence (`mark_1` on the wire).
    pub fn mark_1(&self) -> Option<f32> {
        self.revised.first().map(|r| r.mark)
    }
}

/// Result slot of a submission: either a revision or the "unavailable" sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum RevisionOutcome {
    Revised(Revision),
    /// The service could not produce a usable answer. Carries no scores.
    Unavailable { reason: String },
}

impl RevisionOutcome {
    pub fn revision(&self) -> Option<&Revision> {
        match self {
            RevisionOutcome::Revised(revision) => Some(revision),
            RevisionOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, RevisionOutcome::Unavailable { .. })
    }
}

/// Display band for a mark, matching the thresholds of the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub fn for_mark(mark: f32) -> Self {
        if mark >= 7.0 {
            ScoreBand::Strong
        } else if mark >= 5.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }
}

/// One row of the result table, each banded by its own mark.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub label: &'static str,
    pub markup: String,
    pub mark: f32,
    pub band: ScoreBand,
}

const REVISED_LABELS: [&str; 3] = ["Revised", "Revised 2", "Revised 3"];

/// Builds the table rows: the user's translation first, then each revision.
pub fn result_rows(translation: &str, revision: &Revision) -> Vec<ResultRow> {
    let mut rows = Vec::with_capacity(1 + revision.revised.len());
    rows.push(ResultRow {
        label: "Original",
        markup: translation.to_string(),
        mark: revision.mark,
        band: ScoreBand::for_mark(revision.mark),
    });
    for (label, revised) in REVISED_LABELS.into_iter().zip(&revision.revised) {
        rows.push(ResultRow {
            label,
            markup: revised.markup.clone(),
            mark: revised.mark,
            band: ScoreBand::for_mark(revised.mark),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Revision {
        Revision {
            mark: 5.0,
            revised: vec![
                RevisedSentence { markup: "a".into(), mark: 8.0 },
                RevisedSentence { markup: "b".into(), mark: 6.0 },
                RevisedSentence { markup: "c".into(), mark: 4.5 },
            ],
        }
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ScoreBand::for_mark(9.0), ScoreBand::Strong);
        assert_eq!(ScoreBand::for_mark(7.0), ScoreBand::Strong);
        assert_eq!(ScoreBand::for_mark(6.5), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_mark(5.0), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_mark(4.9), ScoreBand::Weak);
        assert_eq!(ScoreBand::for_mark(0.0), ScoreBand::Weak);
    }

    #[test]
    fn each_row_is_banded_by_its_own_mark() {
        let rows = result_rows("my try", &sample());
        let bands: Vec<_> = rows.iter().map(|r| r.band).collect();
        assert_eq!(
            bands,
            vec![ScoreBand::Fair, ScoreBand::Strong, ScoreBand::Fair, ScoreBand::Weak]
        );
        assert_eq!(rows[0].label, "Original");
        assert_eq!(rows[0].markup, "my try");
        assert_eq!(rows[3].label, "Revised 3");
    }

    #[test]
    fn mark_1_is_first_revision_mark() {
        assert_eq!(sample().mark_1(), Some(8.0));
        let bare = Revision { mark: 3.0, revised: Vec::new() };
        assert_eq!(bare.mark_1(), None);
    }

    #[test]
    fn unavailable_outcome_has_no_revision() {
        let outcome = RevisionOutcome::Unavailable { reason: "timeout".into() };
        assert!(outcome.is_unavailable());
        assert!(outcome.revision().is_none());
    }
}
