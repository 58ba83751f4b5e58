//! Weighted-points grade aggregation and ranking.
//!
//! Mauritanian primary schools grade each subject out of a per-class weight
//! (e.g. CM2 Mathématiques out of 50, Arabe out of 30). A student's general
//! average is obtained points over possible points expressed as a percentage,
//! not a mean of per-subject percentages. Ranks are dense: students sorted by
//! descending average receive consecutive 1-based positions, and tied students
//! keep their stable input order rather than sharing a rank number.
//!
//! Everything here is a pure function of its inputs; callers fetch the roster
//! and the term's grade rows and pass them in.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::db::types::Term;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum GradingError {
    #[error("max_score must be positive, got {0}")]
    NonPositiveMaxScore(f64),
}

/// Appreciation bands of the Mauritanian grading convention. The thresholds
/// are fixed constants reproduced verbatim on bulletins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Appreciation {
    Excellent,
    Good,
    Passing,
    Insufficient,
}

impl Appreciation {
    pub(crate) fn for_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Self::Excellent
        } else if percentage >= 60.0 {
            Self::Good
        } else if percentage >= 50.0 {
            Self::Passing
        } else {
            Self::Insufficient
        }
    }

    /// French label as printed on bulletins.
    pub(crate) fn label_fr(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Bien",
            Self::Passing => "Passable",
            Self::Insufficient => "Insuffisant",
        }
    }
}

/// Round to two decimals, half away from zero (half-up for the non-negative
/// values that occur here).
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage for a single (score, max_score) pair.
///
/// A non-positive max_score is a data-integrity violation that must be caught
/// at ingestion; this refuses to turn it into Infinity or NaN.
pub(crate) fn score_percentage(score: f64, max_score: f64) -> Result<f64, GradingError> {
    if max_score <= 0.0 {
        return Err(GradingError::NonPositiveMaxScore(max_score));
    }
    Ok(round2(score / max_score * 100.0))
}

/// Roster entry: identity of an enrolled student, independent of whether any
/// grades exist for the term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RosterStudent {
    pub(crate) id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) student_number: String,
}

/// One raw grade row as stored: score out of the max_score snapshot taken at
/// submission time.
#[derive(Debug, Clone)]
pub(crate) struct ScoreEntry {
    pub(crate) student_id: String,
    pub(crate) subject_name: String,
    pub(crate) score: f64,
    pub(crate) max_score: f64,
    pub(crate) term: Term,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SubjectScore {
    pub(crate) score: f64,
    pub(crate) max_score: f64,
    pub(crate) percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StudentAggregate {
    pub(crate) student: RosterStudent,
    pub(crate) subject_scores: BTreeMap<String, SubjectScore>,
    pub(crate) total_obtained: f64,
    pub(crate) total_possible: f64,
    pub(crate) general_average: f64,
    pub(crate) rank: usize,
    pub(crate) total_students: usize,
}

/// Rank a class roster for one term.
///
/// Every roster student appears in the output, ordered by descending general
/// average with dense 1-based ranks. Entries referencing students outside the
/// roster, or carrying a different term than requested, are ignored. A student
/// with two entries for the same subject keeps the later one in the breakdown,
/// matching the store's last-write-wins upsert.
pub(crate) fn compute_ranking(
    roster: &[RosterStudent],
    entries: &[ScoreEntry],
    term: Term,
) -> Vec<StudentAggregate> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(roster.len());
    for (index, student) in roster.iter().enumerate() {
        positions.insert(student.id.as_str(), index);
    }

    let mut totals = vec![(0.0_f64, 0.0_f64); roster.len()];
    let mut breakdowns: Vec<BTreeMap<String, SubjectScore>> =
        vec![BTreeMap::new(); roster.len()];

    for entry in entries {
        if entry.term != term {
            continue;
        }
        let Some(&index) = positions.get(entry.student_id.as_str()) else {
            continue;
        };

        totals[index].0 += entry.score;
        totals[index].1 += entry.max_score;
        breakdowns[index].insert(
            entry.subject_name.clone(),
            SubjectScore {
                score: entry.score,
                max_score: entry.max_score,
                percentage: round2(entry.score / entry.max_score * 100.0),
            },
        );
    }

    let total_students = roster.len();
    let mut aggregates: Vec<StudentAggregate> = roster
        .iter()
        .zip(totals)
        .zip(breakdowns)
        .map(|((student, (total_obtained, total_possible)), subject_scores)| {
            let general_average = if total_possible > 0.0 {
                round2(total_obtained / total_possible * 100.0)
            } else {
                0.0
            };

            StudentAggregate {
                student: student.clone(),
                subject_scores,
                total_obtained,
                total_possible,
                general_average,
                rank: 0,
                total_students,
            }
        })
        .collect();

    // Stable sort keeps roster order among equal averages, which is what
    // makes the dense rank assignment deterministic.
    aggregates.sort_by(|a, b| {
        b.general_average.partial_cmp(&a.general_average).unwrap_or(std::cmp::Ordering::Equal)
    });

    for (index, aggregate) in aggregates.iter_mut().enumerate() {
        aggregate.rank = index + 1;
    }

    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, last_name: &str) -> RosterStudent {
        RosterStudent {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: last_name.to_string(),
            student_number: format!("2024-{id}"),
        }
    }

    fn entry(student_id: &str, subject: &str, score: f64, max_score: f64) -> ScoreEntry {
        ScoreEntry {
            student_id: student_id.to_string(),
            subject_name: subject.to_string(),
            score,
            max_score,
            term: Term::T1,
        }
    }

    #[test]
    fn round2_half_up_on_exact_boundaries() {
        // .125 and .375 are exactly representable in binary, so these pin the
        // half-away-from-zero convention without float noise.
        assert_eq!(round2(83.125), 83.13);
        assert_eq!(round2(62.375), 62.38);
        assert_eq!(round2(1.0 / 3.0 * 100.0), 33.33);
        assert_eq!(round2(2.0 / 3.0 * 100.0), 66.67);
        assert_eq!(round2(87.5), 87.5);
    }

    #[test]
    fn score_percentage_rejects_non_positive_max() {
        assert_eq!(score_percentage(10.0, 0.0), Err(GradingError::NonPositiveMaxScore(0.0)));
        assert_eq!(score_percentage(10.0, -5.0), Err(GradingError::NonPositiveMaxScore(-5.0)));
        assert_eq!(score_percentage(45.0, 50.0), Ok(90.0));
    }

    #[test]
    fn appreciation_thresholds() {
        assert_eq!(Appreciation::for_percentage(80.0), Appreciation::Excellent);
        assert_eq!(Appreciation::for_percentage(79.99), Appreciation::Good);
        assert_eq!(Appreciation::for_percentage(60.0), Appreciation::Good);
        assert_eq!(Appreciation::for_percentage(59.99), Appreciation::Passing);
        assert_eq!(Appreciation::for_percentage(50.0), Appreciation::Passing);
        assert_eq!(Appreciation::for_percentage(49.99), Appreciation::Insufficient);
        assert_eq!(Appreciation::Passing.label_fr(), "Passable");
    }

    #[test]
    fn ranks_class_by_weighted_average() {
        let roster = vec![student("a", "Salem"), student("b", "Bint"), student("c", "Ould")];
        let entries = vec![
            entry("a", "Mathématiques", 45.0, 50.0),
            entry("a", "Arabe", 25.0, 30.0),
            entry("b", "Mathématiques", 40.0, 50.0),
        ];

        let ranking = compute_ranking(&roster, &entries, Term::T1);

        assert_eq!(ranking.len(), 3);

        assert_eq!(ranking[0].student.id, "a");
        assert_eq!(ranking[0].total_obtained, 70.0);
        assert_eq!(ranking[0].total_possible, 80.0);
        assert_eq!(ranking[0].general_average, 87.5);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[0].subject_scores.len(), 2);
        assert_eq!(
            ranking[0].subject_scores["Mathématiques"],
            SubjectScore { score: 45.0, max_score: 50.0, percentage: 90.0 }
        );

        assert_eq!(ranking[1].student.id, "b");
        assert_eq!(ranking[1].general_average, 80.0);
        assert_eq!(ranking[1].rank, 2);

        assert_eq!(ranking[2].student.id, "c");
        assert_eq!(ranking[2].general_average, 0.0);
        assert_eq!(ranking[2].total_possible, 0.0);
        assert_eq!(ranking[2].rank, 3);
        assert!(ranking[2].subject_scores.is_empty());

        for aggregate in &ranking {
            assert_eq!(aggregate.total_students, 3);
        }
    }

    #[test]
    fn ties_get_dense_ranks_in_roster_order() {
        let roster = vec![student("a", "Salem"), student("b", "Bint")];
        let entries = vec![
            entry("a", "Arabe", 22.5, 30.0),
            entry("b", "Mathématiques", 37.5, 50.0),
        ];

        let ranking = compute_ranking(&roster, &entries, Term::T1);

        assert_eq!(ranking[0].general_average, 75.0);
        assert_eq!(ranking[1].general_average, 75.0);
        assert_eq!(ranking[0].student.id, "a");
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[1].student.id, "b");
        assert_eq!(ranking[1].rank, 2);
    }

    #[test]
    fn output_is_non_increasing_with_strictly_increasing_ranks() {
        let roster =
            vec![student("a", "A"), student("b", "B"), student("c", "C"), student("d", "D")];
        let entries = vec![
            entry("a", "Arabe", 12.0, 30.0),
            entry("b", "Arabe", 30.0, 30.0),
            entry("c", "Arabe", 21.0, 30.0),
            entry("d", "Arabe", 21.0, 30.0),
        ];

        let ranking = compute_ranking(&roster, &entries, Term::T1);

        for pair in ranking.windows(2) {
            assert!(pair[0].general_average >= pair[1].general_average);
            assert_eq!(pair[1].rank, pair[0].rank + 1);
        }
        assert_eq!(ranking[0].rank, 1);
    }

    #[test]
    fn ignores_entries_outside_the_roster_or_term() {
        let roster = vec![student("a", "Salem")];
        let mut entries = vec![entry("a", "Arabe", 15.0, 30.0)];
        entries.push(entry("transferred-away", "Arabe", 30.0, 30.0));
        entries.push(ScoreEntry { term: Term::T2, ..entry("a", "Mathématiques", 50.0, 50.0) });

        let ranking = compute_ranking(&roster, &entries, Term::T1);

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].total_obtained, 15.0);
        assert_eq!(ranking[0].total_possible, 30.0);
        assert_eq!(ranking[0].subject_scores.len(), 1);
    }

    #[test]
    fn duplicate_subject_entry_keeps_the_later_write() {
        let roster = vec![student("a", "Salem")];
        let entries = vec![
            entry("a", "Mathématiques", 40.0, 50.0),
            entry("a", "Mathématiques", 45.0, 50.0),
        ];

        let ranking = compute_ranking(&roster, &entries, Term::T1);

        assert_eq!(
            ranking[0].subject_scores["Mathématiques"],
            SubjectScore { score: 45.0, max_score: 50.0, percentage: 90.0 }
        );
    }

    #[test]
    fn empty_roster_yields_empty_ranking() {
        let ranking = compute_ranking(&[], &[entry("a", "Arabe", 10.0, 30.0)], Term::T1);
        assert!(ranking.is_empty());
    }

    #[test]
    fn identical_inputs_produce_identical_output() {
        let roster = vec![student("a", "Salem"), student("b", "Bint"), student("c", "Ould")];
        let entries = vec![
            entry("a", "Arabe", 21.0, 30.0),
            entry("b", "Arabe", 21.0, 30.0),
            entry("c", "Mathématiques", 35.0, 50.0),
        ];

        let first = compute_ranking(&roster, &entries, Term::T1);
        let second = compute_ranking(&roster, &entries, Term::T1);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
