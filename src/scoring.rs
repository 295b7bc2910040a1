//! Survey scoring engine: score -> risk tier -> recommendations.
//!
//! Everything here is pure and total. Numeric answers count as given, anything
//! else contributes zero. Unknown tier labels fall back to the medium advice
//! and an empty catalog scores 0 (low). Range checks on answers happen where
//! they are collected, not here.

use tracing::debug;

use crate::domain::{AnswerValue, Answers, Question, QuestionKind, RiskLevel};

/// Points available per scored question.
pub const MAX_POINTS_PER_QUESTION: u32 = 5;

const LOW_MAX: u32 = 15;
const MEDIUM_MAX: u32 = 30;
const HIGH_MAX: u32 = 45;

/// Sum of per-question contributions over the catalog, in catalog order.
pub fn score(catalog: &[Question], answers: &Answers) -> u32 {
  let total = catalog
    .iter()
    .map(|q| contribution(q, answers.get(&q.id)))
    .fold(0u32, u32::saturating_add);
  debug!(target: "survey", questions = catalog.len(), answered = answers.len(), total, "Survey scored");
  total
}

/// Contribution of one question. Zero for non-numeric payloads and open-ended questions.
pub fn contribution(question: &Question, answer: Option<&AnswerValue>) -> u32 {
  let Some(n) = answer.and_then(AnswerValue::as_number) else { return 0 };
  match question.kind {
    QuestionKind::Likert => clamp_points(n),
    QuestionKind::MultipleChoice => choice_points(n),
    QuestionKind::OpenEnded => 0,
  }
}

/// Earlier options score higher: index 0 is worth 5, index 4 is worth 1.
/// Indexes past 5 floor at zero.
pub fn choice_points(index: i64) -> u32 {
  clamp_points(i64::from(MAX_POINTS_PER_QUESTION).saturating_sub(index))
}

fn clamp_points(value: i64) -> u32 {
  u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Highest score the catalog can produce.
pub fn max_score(catalog: &[Question]) -> u32 {
  scored_question_count(catalog) as u32 * MAX_POINTS_PER_QUESTION
}

pub fn scored_question_count(catalog: &[Question]) -> usize {
  catalog.iter().filter(|q| q.kind.is_scored()).count()
}

/// Inclusive upper bounds: 15 low, 30 medium, 45 high, above that critical.
pub fn classify(score: u32) -> RiskLevel {
  match score {
    s if s <= LOW_MAX => RiskLevel::Low,
    s if s <= MEDIUM_MAX => RiskLevel::Medium,
    s if s <= HIGH_MAX => RiskLevel::High,
    _ => RiskLevel::Critical,
  }
}

const LOW_ADVICE: &[&str] = &[
  "Bạn có khả năng tư duy độc lập tốt! Hãy tiếp tục phát huy.",
  "Chia sẻ kinh nghiệm của bạn với bạn bè để giúp họ tự tin hơn.",
];

const MEDIUM_ADVICE: &[&str] = &[
  "Bạn cần chú ý đến việc đưa ra quyết định độc lập nhiều hơn.",
  "Thử thách bản thân bằng cách nói \"không\" khi không đồng ý với nhóm.",
  "Tìm hiểu thêm về giá trị cá nhân của bạn.",
];

const HIGH_ADVICE: &[&str] = &[
  "Bạn đang bị ảnh hưởng nhiều bởi áp lực nhóm.",
  "Hãy dành thời gian suy nghĩ về những gì thực sự quan trọng với bạn.",
  "Tìm kiếm sự hỗ trợ từ gia đình hoặc thầy cô.",
  "Luyện tập kỹ năng tự khẳng định bản thân.",
];

const CRITICAL_ADVICE: &[&str] = &[
  "Bạn đang ở mức độ rủi ro cao về hành vi bầy đàn.",
  "Cần trao đổi với người lớn đáng tin cậy ngay lập tức.",
  "Tham gia các hoạt động phát triển kỹ năng sống.",
  "Xem xét tham khảo ý kiến chuyên gia tâm lý.",
];

/// Static advice for a tier. Not derived from the actual answers.
pub fn recommend(level: RiskLevel) -> Vec<String> {
  let table = match level {
    RiskLevel::Low => LOW_ADVICE,
    RiskLevel::Medium => MEDIUM_ADVICE,
    RiskLevel::High => HIGH_ADVICE,
    RiskLevel::Critical => CRITICAL_ADVICE,
  };
  table.iter().map(|s| s.to_string()).collect()
}

/// Advice for a tier label; unknown labels get the medium list.
pub fn recommend_for_label(label: &str) -> Vec<String> {
  recommend(RiskLevel::from_label(label).unwrap_or(RiskLevel::Medium))
}

/// Output of one pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assessment {
  pub score: u32,
  pub level: RiskLevel,
  pub recommendations: Vec<String>,
}

/// Score, classify, recommend. Exactly that order.
pub fn assess(catalog: &[Question], answers: &Answers) -> Assessment {
  let score = score(catalog, answers);
  let level = classify(score);
  let recommendations = recommend(level);
  Assessment { score, level, recommendations }
}

/// Display copy for the results view.
#[derive(Clone, Debug, serde::Serialize, PartialEq, Eq)]
pub struct TierDisplay {
  pub title: &'static str,
  pub description: &'static str,
  pub analysis: &'static str,
}

pub fn tier_display(level: RiskLevel) -> TierDisplay {
  match level {
    RiskLevel::Low => TierDisplay {
      title: "Mức Độ Thấp",
      description: "Bạn có khả năng tư duy độc lập tốt!",
      analysis: "Bạn thể hiện khả năng tư duy độc lập tốt và ít bị ảnh hưởng bởi áp lực từ bạn bè. \
                 Bạn có xu hướng đưa ra quyết định dựa trên suy nghĩ của riêng mình và không sợ bày tỏ ý kiến khác biệt.",
    },
    RiskLevel::Medium => TierDisplay {
      title: "Mức Độ Trung Bình",
      description: "Bạn cần chú ý hơn đến quyết định của bản thân.",
      analysis: "Bạn đôi khi bị ảnh hưởng bởi ý kiến của nhóm, đặc biệt trong các tình huống xã hội. \
                 Bạn cần rèn luyện thêm kỹ năng tự tin và khẳng định bản thân để không bị cuốn theo dòng chảy một cách thụ động.",
    },
    RiskLevel::High => TierDisplay {
      title: "Mức Độ Cao",
      description: "Bạn đang bị ảnh hưởng nhiều bởi áp lực nhóm.",
      analysis: "Bạn đang chịu ảnh hưởng đáng kể từ hành vi bầy đàn. Áp lực từ bạn bè và mong muốn được chấp nhận \
                 đang khiến bạn dễ dàng thay đổi quan điểm và hành vi.",
    },
    RiskLevel::Critical => TierDisplay {
      title: "Mức Độ Rất Cao",
      description: "Bạn cần sự hỗ trợ ngay lập tức!",
      analysis: "Bạn đang ở mức độ rủi ro cao về hành vi bầy đàn. Hãy trao đổi với người lớn đáng tin cậy \
                 hoặc chuyên gia tâm lý để được hỗ trợ kịp thời.",
    },
  }
}

pub fn tier_display_for_label(label: &str) -> TierDisplay {
  tier_display(RiskLevel::from_label(label).unwrap_or(RiskLevel::Medium))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::default_catalog;

  fn q(id: &str, kind: QuestionKind, options: usize) -> Question {
    Question {
      id: id.into(),
      kind,
      text: String::new(),
      options: (kind == QuestionKind::MultipleChoice).then(|| (0..options).map(|i| format!("o{i}")).collect()),
      category: String::new(),
    }
  }

  fn answers(pairs: &[(&str, AnswerValue)]) -> Answers {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  #[test]
  fn classify_boundaries() {
    assert_eq!(classify(0), RiskLevel::Low);
    assert_eq!(classify(15), RiskLevel::Low);
    assert_eq!(classify(16), RiskLevel::Medium);
    assert_eq!(classify(30), RiskLevel::Medium);
    assert_eq!(classify(31), RiskLevel::High);
    assert_eq!(classify(45), RiskLevel::High);
    assert_eq!(classify(46), RiskLevel::Critical);
    assert_eq!(classify(u32::MAX), RiskLevel::Critical);
  }

  #[test]
  fn classify_is_monotonic() {
    let mut prev = classify(0);
    for s in 1..=100 {
      let cur = classify(s);
      assert!(cur >= prev, "tier dropped at score {s}");
      prev = cur;
    }
  }

  #[test]
  fn likert_plus_first_choice_scores_ten() {
    let catalog = vec![q("a", QuestionKind::Likert, 0), q("b", QuestionKind::MultipleChoice, 3)];
    let a = answers(&[("a", AnswerValue::Number(5)), ("b", AnswerValue::Number(0))]);
    let result = assess(&catalog, &a);
    assert_eq!(result.score, 10);
    assert_eq!(result.level, RiskLevel::Low);
  }

  #[test]
  fn choice_weight_inverts_index() {
    let catalog = vec![q("b", QuestionKind::MultipleChoice, 5)];
    for (idx, expected) in [(0, 5), (1, 4), (2, 3), (3, 2), (4, 1)] {
      let a = answers(&[("b", AnswerValue::Number(idx))]);
      assert_eq!(score(&catalog, &a), expected);
    }
  }

  #[test]
  fn shipped_catalog_maxes_out_at_fifty() {
    let catalog = default_catalog();
    let a: Answers = catalog
      .iter()
      .map(|q| {
        let v = match q.kind {
          QuestionKind::Likert => AnswerValue::Number(5),
          QuestionKind::MultipleChoice => AnswerValue::Number(0),
          QuestionKind::OpenEnded => AnswerValue::Text("dài dòng".into()),
        };
        (q.id.clone(), v)
      })
      .collect();
    assert_eq!(max_score(&catalog), 50);
    assert_eq!(score(&catalog, &a), 50);
    assert_eq!(classify(50), RiskLevel::Critical);
  }

  #[test]
  fn open_ended_answers_never_move_the_score() {
    let catalog = default_catalog();
    let mut a = answers(&[("q1", AnswerValue::Number(3)), ("q6", AnswerValue::Number(2))]);
    let before = score(&catalog, &a);
    a.insert("q11".into(), AnswerValue::Text("một câu chuyện".into()));
    a.insert("q12".into(), AnswerValue::Number(5));
    assert_eq!(score(&catalog, &a), before);
    a.remove("q11");
    assert_eq!(score(&catalog, &a), before);
  }

  #[test]
  fn non_numeric_and_missing_answers_contribute_zero() {
    let catalog = vec![
      q("l", QuestionKind::Likert, 0),
      q("m", QuestionKind::MultipleChoice, 4),
      q("l2", QuestionKind::Likert, 0),
    ];
    let a = answers(&[
      ("l", AnswerValue::Text("5".into())),
      ("m", AnswerValue::Number(7)),
      ("l2", AnswerValue::Number(-2)),
    ]);
    assert_eq!(score(&catalog, &a), 0);
    assert_eq!(score(&catalog, &Answers::new()), 0);
  }

  #[test]
  fn out_of_domain_numbers_count_as_given() {
    let catalog = vec![q("a", QuestionKind::Likert, 0), q("b", QuestionKind::MultipleChoice, 4)];
    let a = answers(&[("a", AnswerValue::Number(9)), ("b", AnswerValue::Number(4))]);
    assert_eq!(score(&catalog, &a), 10);

    let a = answers(&[("a", AnswerValue::Number(2)), ("b", AnswerValue::Number(-1))]);
    assert_eq!(score(&catalog, &a), 8);

    let a = answers(&[("a", AnswerValue::Number(i64::MAX)), ("b", AnswerValue::Number(i64::MIN))]);
    assert_eq!(score(&catalog, &a), u32::MAX);
    assert_eq!(classify(score(&catalog, &a)), RiskLevel::Critical);
  }

  #[test]
  fn empty_catalog_is_low() {
    let result = assess(&[], &answers(&[("q1", AnswerValue::Number(5))]));
    assert_eq!(result.score, 0);
    assert_eq!(result.level, RiskLevel::Low);
  }

  #[test]
  fn valid_answers_stay_within_bounds() {
    let catalog = default_catalog();
    for likert in 1..=5 {
      for idx in 0..4 {
        let a: Answers = catalog
          .iter()
          .filter(|q| q.kind.is_scored())
          .map(|q| {
            let v = if q.kind == QuestionKind::Likert { likert } else { idx };
            (q.id.clone(), AnswerValue::Number(v))
          })
          .collect();
        assert!(score(&catalog, &a) <= max_score(&catalog));
      }
    }
  }

  #[test]
  fn recommendation_lists_have_fixed_lengths() {
    assert_eq!(recommend(RiskLevel::Low).len(), 2);
    assert_eq!(recommend(RiskLevel::Medium).len(), 3);
    assert_eq!(recommend(RiskLevel::High).len(), 4);
    assert_eq!(recommend(RiskLevel::Critical).len(), 4);
    assert_eq!(recommend(RiskLevel::High), recommend(RiskLevel::High));
  }

  #[test]
  fn unknown_label_falls_back_to_medium_advice() {
    assert_eq!(recommend_for_label("extreme"), recommend(RiskLevel::Medium));
    assert_eq!(recommend_for_label("critical"), recommend(RiskLevel::Critical));
    assert_eq!(tier_display_for_label(""), tier_display(RiskLevel::Medium));
  }
}
