use std::collections::BTreeMap;

use kernel::{Question, TestResult};
use rand::seq::SliceRandom;

use crate::error::Result;

pub const DEFAULT_QUESTION_COUNT: usize = 15;

const ACID_BASE_QUESTIONS: &str = include_str!("../data/questions.json");

/// Fixed multiple-choice question pool.
#[derive(Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// The built-in acids and bases pool.
    pub fn acid_base() -> Result<Self> {
        Self::from_json(ACID_BASE_QUESTIONS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            questions: serde_json::from_str(json)?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Up to `count` distinct questions in random order.
    #[must_use]
    pub fn select(&self, count: usize) -> Vec<Question> {
        let mut pool = self.questions.clone();
        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(count);
        pool
    }

    /// Looks the ids up in the pool, returning the first unknown id on failure.
    pub fn resolve(&self, ids: &[u32]) -> std::result::Result<Vec<Question>, u32> {
        ids.iter()
            .map(|id| {
                self.questions
                    .iter()
                    .find(|q| q.id == *id)
                    .cloned()
                    .ok_or(*id)
            })
            .collect()
    }
}

/// Counts answers equal to the recorded correct option.
#[must_use]
pub fn score(questions: &[Question], answers: &BTreeMap<u32, usize>, time_taken: u64) -> TestResult {
    let correct = questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_answer))
        .count();
    let percent = if questions.is_empty() {
        0
    } else {
        (correct as f64 / questions.len() as f64 * 100.0).round() as u32
    };
    TestResult {
        total_questions: questions.len(),
        correct_answers: correct,
        score: percent,
        answers: answers.clone(),
        time_taken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::collections::HashSet;

    #[fixture]
    fn bank() -> QuestionBank {
        QuestionBank::acid_base().unwrap()
    }

    #[rstest]
    fn built_in_bank_is_well_formed(bank: QuestionBank) {
        let ids: HashSet<u32> = bank.questions.iter().map(|q| q.id).collect();
        assert_eq!(bank.len(), 50);
        assert_eq!(ids.len(), 50);
        assert!(bank
            .questions
            .iter()
            .all(|q| q.correct_answer < q.options.len()));
    }

    #[rstest]
    #[case(15, 15)]
    #[case(0, 0)]
    #[case(50, 50)]
    #[case(80, 50)]
    fn select_returns_distinct_questions(
        bank: QuestionBank,
        #[case] count: usize,
        #[case] expected: usize,
    ) {
        // Act
        let selected = bank.select(count);

        // Assert
        let ids: HashSet<u32> = selected.iter().map(|q| q.id).collect();
        assert_eq!(selected.len(), expected);
        assert_eq!(ids.len(), expected);
    }

    #[rstest]
    fn score_fifteen_questions(bank: QuestionBank) {
        // Arrange
        let questions = bank.select(DEFAULT_QUESTION_COUNT);
        let answers: BTreeMap<u32, usize> = questions
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 3 != 2)
            .map(|(i, q)| {
                let chosen = if i % 2 == 0 {
                    q.correct_answer
                } else {
                    (q.correct_answer + 1) % q.options.len()
                };
                (q.id, chosen)
            })
            .collect();
        let expected = questions
            .iter()
            .filter(|q| answers.get(&q.id) == Some(&q.correct_answer))
            .count();

        // Act
        let result = score(&questions, &answers, 42);

        // Assert
        assert_eq!(result.total_questions, 15);
        assert_eq!(result.correct_answers, expected);
        assert_eq!(
            result.score,
            (expected as f64 / 15.0 * 100.0).round() as u32
        );
        assert_eq!(result.time_taken, 42);
    }

    #[rstest]
    #[case(&[(1, 1), (2, 1), (3, 2)], 100)]
    #[case(&[(1, 1), (2, 1)], 67)]
    #[case(&[(1, 1)], 33)]
    #[case(&[(1, 0), (2, 0), (3, 0)], 0)]
    #[trace]
    fn score_rounds_percentage(
        bank: QuestionBank,
        #[case] answers: &[(u32, usize)],
        #[case] expected: u32,
    ) {
        // Arrange
        let questions = bank.resolve(&[1, 2, 3]).unwrap();
        let answers: BTreeMap<u32, usize> = answers.iter().copied().collect();

        // Act
        let result = score(&questions, &answers, 0);

        // Assert
        assert_eq!(result.score, expected);
    }

    #[test]
    fn score_without_questions_is_zero() {
        let result = score(&[], &BTreeMap::new(), 0);
        assert_eq!(result.score, 0);
        assert_eq!(result.total_questions, 0);
    }

    #[rstest]
    fn resolve_reports_unknown_id(bank: QuestionBank) {
        assert_eq!(bank.resolve(&[1, 999, 2]), Err(999));
    }
}
