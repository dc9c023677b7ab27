//! Aggregations over already-loaded survey and feedback rows.
//!
//! Everything here is pure: callers fetch rows, these functions average them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{RATING_MAX, RATING_MIN};
use crate::engagement::Feedback;
use crate::roster::Member;
use crate::survey::{QuestionKind, SurveyDetail, SurveyKind, SurveyResponse};

/// A survey with every response submitted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResults {
    pub detail: SurveyDetail,
    pub responses: Vec<SurveyResponse>,
}

/// All result rows of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassResults {
    pub class_id: Uuid,
    pub surveys: Vec<SurveyResults>,
    pub students: Vec<Member>,
}

/// Arithmetic mean; `None` when there is nothing to average.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = i32>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0i64, 0u32), |(sum, count), v| (sum + i64::from(v), count + 1));
    if count == 0 {
        None
    } else {
        Some(sum as f64 / f64::from(count))
    }
}

// =============================================================================
// Survey summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuestionSummary {
    pub question_id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: QuestionKind,
    pub competency: Option<String>,
    /// Number of answers received
    pub answered: usize,
    pub average: Option<f64>,
    /// Count per rating, index 0 is the lowest rating
    pub distribution: Vec<u32>,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SurveySummary {
    pub survey_id: Uuid,
    pub title: String,
    pub kind: SurveyKind,
    pub response_count: usize,
    pub questions: Vec<QuestionSummary>,
}

/// Per-question averages, rating distribution and text answers.
pub fn survey_summary(detail: &SurveyDetail, responses: &[SurveyResponse]) -> SurveySummary {
    let buckets = (RATING_MAX - RATING_MIN + 1) as usize;

    let questions = detail
        .questions
        .iter()
        .map(|question| {
            let answers: Vec<_> = responses
                .iter()
                .flat_map(|r| r.answers.iter())
                .filter(|a| a.question_id == question.id)
                .collect();

            let ratings: Vec<i32> = answers.iter().filter_map(|a| a.rating).collect();
            let mut distribution = vec![0u32; buckets];
            for rating in &ratings {
                if (RATING_MIN..=RATING_MAX).contains(rating) {
                    distribution[(rating - RATING_MIN) as usize] += 1;
                }
            }

            QuestionSummary {
                question_id: question.id,
                position: question.position,
                prompt: question.prompt.clone(),
                kind: question.kind,
                competency: question.competency.clone(),
                answered: answers.len(),
                average: mean(ratings.iter().copied()),
                distribution,
                texts: answers.iter().filter_map(|a| a.text.clone()).collect(),
            }
        })
        .collect();

    SurveySummary {
        survey_id: detail.survey.id,
        title: detail.survey.title.clone(),
        kind: detail.survey.kind,
        response_count: responses.len(),
        questions,
    }
}

// =============================================================================
// Self-vs-peer gap analysis
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompetencyGap {
    pub competency: String,
    pub self_average: Option<f64>,
    pub peer_average: Option<f64>,
    /// Number of peer ratings behind `peer_average`
    pub peer_ratings: usize,
    /// `self_average - peer_average`; positive means the student rates themself higher
    pub gap: Option<f64>,
}

impl CompetencyGap {
    fn from_ratings(competency: String, own: &[i32], peers: &[i32]) -> Self {
        let self_average = mean(own.iter().copied());
        let peer_average = mean(peers.iter().copied());
        let gap = match (self_average, peer_average) {
            (Some(s), Some(p)) => Some(s - p),
            _ => None,
        };
        Self {
            competency,
            self_average,
            peer_average,
            peer_ratings: peers.len(),
            gap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StudentGap {
    pub student_id: Uuid,
    pub name: String,
    pub email: String,
    pub competencies: Vec<CompetencyGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GapAnalysis {
    pub class_id: Uuid,
    pub students: Vec<StudentGap>,
    pub class_averages: Vec<CompetencyGap>,
}

#[derive(Default)]
struct Ratings {
    own: Vec<i32>,
    peers: Vec<i32>,
}

/// Compare each student's self ratings with the ratings peers gave them.
///
/// Ratings are paired by question competency (falling back to the prompt), so
/// a self-assessment and a peer assessment line up when their questions
/// measure the same thing. Course feedback surveys and text answers are ignored.
pub fn gap_analysis(results: &ClassResults) -> GapAnalysis {
    let mut per_student: HashMap<Uuid, BTreeMap<String, Ratings>> = HashMap::new();
    let mut per_class: BTreeMap<String, Ratings> = BTreeMap::new();

    for survey in &results.surveys {
        let kind = survey.detail.survey.kind;
        if kind == SurveyKind::CourseFeedback {
            continue;
        }

        let competencies: HashMap<Uuid, String> = survey
            .detail
            .questions
            .iter()
            .filter(|q| q.kind == QuestionKind::Rating)
            .map(|q| (q.id, q.competency_key()))
            .collect();

        for response in &survey.responses {
            let Some(subject) = response.subject_id else {
                continue;
            };
            let is_self = subject == response.respondent_id;
            // Only count responses that match the survey's intent.
            match (kind, is_self) {
                (SurveyKind::SelfAssessment, true) | (SurveyKind::PeerAssessment, false) => {}
                _ => continue,
            }

            for answer in &response.answers {
                let (Some(rating), Some(competency)) =
                    (answer.rating, competencies.get(&answer.question_id))
                else {
                    continue;
                };

                let student = per_student
                    .entry(subject)
                    .or_default()
                    .entry(competency.clone())
                    .or_default();
                let class = per_class.entry(competency.clone()).or_default();
                if is_self {
                    student.own.push(rating);
                    class.own.push(rating);
                } else {
                    student.peers.push(rating);
                    class.peers.push(rating);
                }
            }
        }
    }

    let mut students: Vec<StudentGap> = results
        .students
        .iter()
        .map(|student| {
            let competencies = per_student
                .remove(&student.id)
                .unwrap_or_default()
                .into_iter()
                .map(|(competency, r)| CompetencyGap::from_ratings(competency, &r.own, &r.peers))
                .collect();
            StudentGap {
                student_id: student.id,
                name: student.name.clone(),
                email: student.email.clone(),
                competencies,
            }
        })
        .collect();
    students.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let class_averages = per_class
        .into_iter()
        .map(|(competency, r)| CompetencyGap::from_ratings(competency, &r.own, &r.peers))
        .collect();

    GapAnalysis {
        class_id: results.class_id,
        students,
        class_averages,
    }
}

// =============================================================================
// Feedback summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeekFeedback {
    pub week: i32,
    pub responses: usize,
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeedbackSummary {
    pub responses: usize,
    pub average: Option<f64>,
    pub weeks: Vec<WeekFeedback>,
}

/// Overall and per-week average of feedback ratings.
pub fn feedback_summary(feedback: &[Feedback]) -> FeedbackSummary {
    let mut by_week: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for item in feedback {
        by_week.entry(item.week).or_default().push(item.rating);
    }

    FeedbackSummary {
        responses: feedback.len(),
        average: mean(feedback.iter().map(|f| f.rating)),
        weeks: by_week
            .into_iter()
            .map(|(week, ratings)| WeekFeedback {
                week,
                responses: ratings.len(),
                average: mean(ratings),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::MemberKind;
    use crate::survey::{Answer, Question, Survey};
    use chrono::Utc;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map_or(false, |a| (a - b).abs() < 1e-9)
    }

    fn student(name: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            class_id: Uuid::nil(),
            kind: MemberKind::Student,
            user_id: None,
            email: format!("{}@example.com", name.to_lowercase()),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn survey(kind: SurveyKind, competencies: &[&str]) -> SurveyDetail {
        let survey = Survey {
            id: Uuid::new_v4(),
            class_id: Uuid::nil(),
            title: kind.to_string(),
            kind,
            week: Some(1),
            is_open: true,
            due_at: None,
            created_at: Utc::now(),
        };
        let mut questions: Vec<Question> = competencies
            .iter()
            .enumerate()
            .map(|(i, c)| Question {
                id: Uuid::new_v4(),
                survey_id: survey.id,
                position: i as i32 + 1,
                prompt: format!("Rate {}", c),
                kind: QuestionKind::Rating,
                competency: Some(c.to_string()),
            })
            .collect();
        questions.push(Question {
            id: Uuid::new_v4(),
            survey_id: survey.id,
            position: competencies.len() as i32 + 1,
            prompt: "Comments".to_string(),
            kind: QuestionKind::Text,
            competency: None,
        });
        SurveyDetail { survey, questions }
    }

    fn response(
        detail: &SurveyDetail,
        respondent: Uuid,
        subject: Option<Uuid>,
        ratings: &[i32],
    ) -> SurveyResponse {
        let id = Uuid::new_v4();
        let mut answers: Vec<Answer> = ratings
            .iter()
            .zip(detail.questions.iter())
            .map(|(r, q)| Answer {
                id: Uuid::new_v4(),
                response_id: id,
                question_id: q.id,
                rating: Some(*r),
                text: None,
            })
            .collect();
        if let Some(text_q) = detail.questions.last() {
            answers.push(Answer {
                id: Uuid::new_v4(),
                response_id: id,
                question_id: text_q.id,
                rating: None,
                text: Some("keep going".to_string()),
            });
        }
        SurveyResponse {
            id,
            survey_id: detail.survey.id,
            respondent_id: respondent,
            subject_id: subject,
            submitted_at: Utc::now(),
            answers,
        }
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<i32>::new()), None);
        assert!(close(mean(vec![1, 2, 3, 4]), 2.5));
        assert!(close(mean(vec![5]), 5.0));
    }

    #[test]
    fn test_survey_summary() {
        let detail = survey(SurveyKind::SelfAssessment, &["Communication"]);
        let responses = vec![
            response(&detail, Uuid::new_v4(), None, &[4]),
            response(&detail, Uuid::new_v4(), None, &[5]),
            response(&detail, Uuid::new_v4(), None, &[4]),
        ];

        let summary = survey_summary(&detail, &responses);
        assert_eq!(summary.response_count, 3);

        let rating = &summary.questions[0];
        assert_eq!(rating.answered, 3);
        assert!(close(rating.average, 13.0 / 3.0));
        assert_eq!(rating.distribution, vec![0, 0, 0, 2, 1]);
        assert!(rating.texts.is_empty());

        let text = &summary.questions[1];
        assert_eq!(text.average, None);
        assert_eq!(text.texts.len(), 3);
    }

    #[test]
    fn test_survey_summary_without_responses() {
        let detail = survey(SurveyKind::CourseFeedback, &["Pace"]);
        let summary = survey_summary(&detail, &[]);
        assert_eq!(summary.response_count, 0);
        assert_eq!(summary.questions[0].average, None);
        assert_eq!(summary.questions[0].distribution, vec![0; 5]);
    }

    #[test]
    fn test_gap_analysis_pairs_self_and_peer() {
        let ada = student("Ada");
        let bob = student("Bob");
        let cy = student("Cy");

        let own = survey(SurveyKind::SelfAssessment, &["Communication", "Teamwork"]);
        let peer = survey(SurveyKind::PeerAssessment, &["Communication", "Teamwork"]);

        let results = ClassResults {
            class_id: Uuid::new_v4(),
            students: vec![cy.clone(), bob.clone(), ada.clone()],
            surveys: vec![
                SurveyResults {
                    responses: vec![
                        response(&own, ada.id, Some(ada.id), &[5, 4]),
                        response(&own, bob.id, Some(bob.id), &[2, 3]),
                    ],
                    detail: own.clone(),
                },
                SurveyResults {
                    responses: vec![
                        response(&peer, bob.id, Some(ada.id), &[3, 4]),
                        response(&peer, cy.id, Some(ada.id), &[4, 4]),
                        response(&peer, ada.id, Some(bob.id), &[4, 5]),
                    ],
                    detail: peer.clone(),
                },
            ],
        };

        let analysis = gap_analysis(&results);
        let names: Vec<&str> = analysis.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bob", "Cy"]);

        let ada_gap = &analysis.students[0];
        let communication = &ada_gap.competencies[0];
        assert_eq!(communication.competency, "Communication");
        assert!(close(communication.self_average, 5.0));
        assert!(close(communication.peer_average, 3.5));
        assert_eq!(communication.peer_ratings, 2);
        assert!(close(communication.gap, 1.5));

        let bob_teamwork = &analysis.students[1].competencies[1];
        assert_eq!(bob_teamwork.competency, "Teamwork");
        assert!(close(bob_teamwork.gap, -2.0));

        // Cy never rated themself and was never rated.
        assert!(analysis.students[2].competencies.is_empty());

        let class_comm = &analysis.class_averages[0];
        assert!(close(class_comm.self_average, 3.5));
        assert!(close(class_comm.peer_average, 11.0 / 3.0));
    }

    #[test]
    fn test_gap_analysis_ignores_mismatched_responses() {
        let ada = student("Ada");
        let bob = student("Bob");
        let own = survey(SurveyKind::SelfAssessment, &["Focus"]);
        let peer = survey(SurveyKind::PeerAssessment, &["Focus"]);
        let feedback = survey(SurveyKind::CourseFeedback, &["Focus"]);

        let results = ClassResults {
            class_id: Uuid::new_v4(),
            students: vec![ada.clone()],
            surveys: vec![
                SurveyResults {
                    // A self-assessment row pointing at someone else is ignored.
                    responses: vec![response(&own, bob.id, Some(ada.id), &[1])],
                    detail: own,
                },
                SurveyResults {
                    // A peer row rating oneself is ignored.
                    responses: vec![response(&peer, ada.id, Some(ada.id), &[1])],
                    detail: peer,
                },
                SurveyResults {
                    responses: vec![response(&feedback, ada.id, None, &[1])],
                    detail: feedback,
                },
            ],
        };

        let analysis = gap_analysis(&results);
        assert!(analysis.students[0].competencies.is_empty());
        assert!(analysis.class_averages.is_empty());
    }

    #[test]
    fn test_gap_only_with_both_sides() {
        let ada = student("Ada");
        let own = survey(SurveyKind::SelfAssessment, &["Focus"]);
        let results = ClassResults {
            class_id: Uuid::new_v4(),
            students: vec![ada.clone()],
            surveys: vec![SurveyResults {
                responses: vec![response(&own, ada.id, Some(ada.id), &[4])],
                detail: own,
            }],
        };

        let analysis = gap_analysis(&results);
        let focus = &analysis.students[0].competencies[0];
        assert!(close(focus.self_average, 4.0));
        assert_eq!(focus.peer_average, None);
        assert_eq!(focus.gap, None);
    }

    #[test]
    fn test_feedback_summary_by_week() {
        let class_id = Uuid::new_v4();
        let item = |week: i32, rating: i32| Feedback {
            id: Uuid::new_v4(),
            class_id,
            student_id: None,
            week,
            rating,
            body: String::new(),
            created_at: Utc::now(),
        };
        let rows = vec![item(2, 4), item(1, 3), item(2, 5), item(1, 5)];

        let summary = feedback_summary(&rows);
        assert_eq!(summary.responses, 4);
        assert!(close(summary.average, 4.25));
        assert_eq!(summary.weeks.len(), 2);
        assert_eq!(summary.weeks[0].week, 1);
        assert!(close(summary.weeks[0].average, 4.0));
        assert_eq!(summary.weeks[1].responses, 2);
        assert!(close(summary.weeks[1].average, 4.5));
    }

    #[test]
    fn test_feedback_summary_empty() {
        let summary = feedback_summary(&[]);
        assert_eq!(summary.responses, 0);
        assert_eq!(summary.average, None);
        assert!(summary.weeks.is_empty());
    }
}
